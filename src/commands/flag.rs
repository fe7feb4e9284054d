use serde_json::json;

use crate::cli::TargetArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::mailbox::View;

pub async fn star(ctx: &AppContext, args: TargetArgs, starred: bool) -> AppResult<()> {
    let mailbox = ctx
        .mailbox_listing(View::parse(&args.view)?, std::slice::from_ref(&args.id))
        .await?;
    mailbox.toggle_star(&args.id, starred).await?;

    let text = if starred {
        format!("starred {}", args.id)
    } else {
        format!("unstarred {}", args.id)
    };
    ctx.output
        .emit(&text, &json!({ "id": args.id, "starred": starred }))
}

pub async fn read(ctx: &AppContext, args: TargetArgs, read: bool) -> AppResult<()> {
    let mailbox = ctx
        .mailbox_listing(View::parse(&args.view)?, std::slice::from_ref(&args.id))
        .await?;
    if read {
        mailbox.mark_read(&args.id).await?;
    } else {
        mailbox.mark_unread(&args.id).await?;
    }

    let text = if read {
        format!("marked {} as read", args.id)
    } else {
        format!("marked {} as unread", args.id)
    };
    ctx.output.emit(&text, &json!({ "id": args.id, "unread": !read }))
}
