use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use crate::api::models::{LocalFile, Tone};
use crate::cli::{ComposeArgs, GenerateArgs};
use crate::compose::{ComposeSession, Microphone, NoCaptureDevice};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::mail::markup;

pub async fn send(ctx: &AppContext, args: ComposeArgs) -> AppResult<()> {
    let mut session = compose(ctx, args, true).await?;
    let attachments = session.attachments().attachments().len();
    let to = session.to.clone();
    session.send().await?;

    let text = format!("sent message to {to}");
    ctx.output.emit(
        &text,
        &json!({ "sent": true, "to": to, "attachments": attachments }),
    )
}

pub async fn draft(ctx: &AppContext, args: ComposeArgs) -> AppResult<()> {
    let session = compose(ctx, args, false).await?;
    session.save_draft().await?;

    ctx.output.emit("draft saved", &json!({ "draft": true }))
}

pub async fn generate(ctx: &AppContext, args: GenerateArgs) -> AppResult<()> {
    let tone = Tone::parse(&args.tone)?;
    let mut session = new_session(ctx)?;
    let fragment = session.generate(&args.instruction, tone).await?;

    ctx.output
        .emit(&fragment, &json!({ "tone": tone, "email": fragment }))
}

fn new_session(ctx: &AppContext) -> AppResult<ComposeSession> {
    let microphone = Microphone::new(Arc::new(NoCaptureDevice));
    Ok(ComposeSession::new(ctx.gateway()?, microphone))
}

async fn compose(
    ctx: &AppContext,
    args: ComposeArgs,
    body_required: bool,
) -> AppResult<ComposeSession> {
    let mut session = new_session(ctx)?;
    session.to = args.to.join(", ");
    session.cc = args.cc.join(", ");
    session.bcc = args.bcc.join(", ");
    session.subject = args.subject.clone().unwrap_or_default();

    let body = read_body(&args, body_required)?;
    session.set_body(markup::markdown_to_html(&body));

    for path in &args.inline {
        session.insert_inline_image(&LocalFile::from_path(path)?)?;
    }

    upload_attachments(&session, &args.attach).await?;
    Ok(session)
}

async fn upload_attachments(session: &ComposeSession, paths: &[PathBuf]) -> AppResult<()> {
    if paths.is_empty() {
        return Ok(());
    }

    let files = paths
        .iter()
        .map(|path| LocalFile::from_path(path))
        .collect::<AppResult<Vec<_>>>()?;
    let report = session.attachments().add_files(files).await?;

    if report.failed.is_empty() {
        return Ok(());
    }

    let failures = report
        .failed
        .iter()
        .map(|failure| format!("{}: {}", failure.file, failure.reason))
        .collect::<Vec<_>>()
        .join("; ");
    Err(AppError::Api(format!("attachment upload failed ({failures})")))
}

fn read_body(args: &ComposeArgs, required: bool) -> AppResult<String> {
    let selected = [args.body.is_some(), args.body_file.is_some(), args.stdin]
        .into_iter()
        .filter(|selected| *selected)
        .count();

    if selected > 1 {
        return Err(AppError::InvalidInput(
            "pass only one body source: --body, --body-file, or --stdin".to_string(),
        ));
    }

    if let Some(body) = &args.body {
        return Ok(body.clone());
    }

    if let Some(path) = &args.body_file {
        return Ok(fs::read_to_string(path)?);
    }

    if args.stdin {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }

    if required {
        return Err(AppError::InvalidInput(
            "missing body source; pass one of --body, --body-file, or --stdin".to_string(),
        ));
    }

    Ok(String::new())
}
