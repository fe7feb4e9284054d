use std::fs;

use serde_json::json;

use crate::cli::{AttachmentArgs, ForwardArgs, IdArgs, ReplyArgs};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::mail::markup;

pub async fn summarize(ctx: &AppContext, args: IdArgs) -> AppResult<()> {
    let summary = ctx.mailbox()?.summarize(&args.id).await?;
    ctx.output
        .emit(&summary, &json!({ "id": args.id, "summary": summary }))
}

pub async fn attachment(ctx: &AppContext, args: AttachmentArgs) -> AppResult<()> {
    let data = ctx
        .mailbox()?
        .download_attachment(&args.message_id, &args.attachment_id)
        .await?;
    fs::write(&args.output, &data)?;

    let path = args.output.display().to_string();
    let text = format!("saved {} bytes to {path}", data.len());
    ctx.output
        .emit(&text, &json!({ "path": path, "bytes": data.len() }))
}

pub async fn reply(ctx: &AppContext, args: ReplyArgs) -> AppResult<()> {
    let body = markup::markdown_to_html(&args.body);
    ctx.mailbox()?.reply(&args.id, &body).await?;

    let text = format!("replied to {}", args.id);
    ctx.output.emit(&text, &json!({ "repliedTo": args.id }))
}

pub async fn forward(ctx: &AppContext, args: ForwardArgs) -> AppResult<()> {
    let body = markup::markdown_to_html(&args.body);
    ctx.mailbox()?.forward(&args.id, &args.to, &body).await?;

    let text = format!("forwarded {} to {}", args.id, args.to);
    ctx.output
        .emit(&text, &json!({ "forwarded": args.id, "to": args.to }))
}
