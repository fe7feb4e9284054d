use serde_json::json;

use crate::cli::{BulkArgs, ConfirmArgs, IdArgs, PurgeArgs};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::mailbox::{BulkOutcome, Mailbox, View};

pub async fn trash(ctx: &AppContext, args: BulkArgs) -> AppResult<()> {
    let view = View::parse(&args.view)?;
    if view.is_trash() {
        return Err(AppError::InvalidInput(
            "messages in trash are removed with `purge`".to_string(),
        ));
    }

    let mailbox = ctx.mailbox_listing(view, &args.ids).await?;
    if let [id] = args.ids.as_slice() {
        mailbox.move_to_trash(id).await?;
        let text = format!("moved {id} to trash");
        return ctx.output.emit(&text, &json!({ "trashed": [id] }));
    }

    let outcome = delete_selected(&mailbox, &args.ids).await?;
    let text = format!("moved {} messages to trash", outcome.removed.len());
    ctx.output.emit(&text, &json!({ "trashed": outcome.removed }))
}

pub async fn restore(ctx: &AppContext, args: IdArgs) -> AppResult<()> {
    let mailbox = ctx
        .mailbox_listing(View::Trash, std::slice::from_ref(&args.id))
        .await?;
    mailbox.restore_from_trash(&args.id).await?;

    let text = format!("restored {}", args.id);
    ctx.output.emit(&text, &json!({ "restored": args.id }))
}

pub async fn purge(ctx: &AppContext, args: PurgeArgs) -> AppResult<()> {
    require_confirmation(args.yes)?;
    let mailbox = ctx.mailbox_listing(View::Trash, &args.ids).await?;

    if let [id] = args.ids.as_slice() {
        let pending = mailbox.request_permanent_delete(id)?;
        tracing::debug!(id = %pending.id, subject = %pending.subject, "confirmed permanent delete");
        let deleted = mailbox.confirm_permanent_delete().await?;
        let text = format!("permanently deleted {}", deleted.id);
        return ctx.output.emit(&text, &json!({ "deleted": [deleted.id] }));
    }

    let outcome = delete_selected(&mailbox, &args.ids).await?;
    let text = format!("permanently deleted {} messages", outcome.removed.len());
    ctx.output.emit(&text, &json!({ "deleted": outcome.removed }))
}

pub async fn empty_trash(ctx: &AppContext, args: ConfirmArgs) -> AppResult<()> {
    require_confirmation(args.yes)?;
    let mailbox = ctx.mailbox_in(View::Trash).await?;
    mailbox.load_remaining().await?;
    let outcome = mailbox.empty_trash().await?;

    let text = if outcome.removed.is_empty() {
        View::Trash.empty_notice().to_string()
    } else {
        format!("permanently deleted {} messages", outcome.removed.len())
    };
    ctx.output.emit(&text, &json!({ "deleted": outcome.removed }))
}

async fn delete_selected(mailbox: &Mailbox, ids: &[String]) -> AppResult<BulkOutcome> {
    for id in ids {
        mailbox.select(id)?;
    }
    mailbox.delete_selected().await
}

fn require_confirmation(yes: bool) -> AppResult<()> {
    if yes {
        return Ok(());
    }

    Err(AppError::InvalidInput(
        "permanent delete cannot be undone; pass --yes to confirm".to_string(),
    ))
}
