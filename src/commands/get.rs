use crate::api::models::Message;
use crate::cli::GetArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::mailbox::View;
use crate::output::{OutputMode, text};

pub async fn run(ctx: &AppContext, args: GetArgs) -> AppResult<()> {
    let mailbox = ctx
        .mailbox_listing(View::parse(&args.view)?, std::slice::from_ref(&args.id))
        .await?;
    let message = mailbox.open(&args.id).await?;

    if ctx.output.mode() == OutputMode::Text {
        print_message(&message);
        return Ok(());
    }

    ctx.output.emit(&message.id, &message)
}

fn print_message(message: &Message) {
    text::print_field(0, "id", &message.id);
    text::print_field(
        0,
        "from",
        message.from.as_deref().unwrap_or("(unknown sender)"),
    );
    if let Some(to) = message.to.as_deref() {
        text::print_field(0, "to", to);
    }
    if let Some(cc) = message.cc.as_deref() {
        text::print_field(0, "cc", cc);
    }
    text::print_field(0, "subject", message.subject_or_placeholder());
    text::print_field(0, "date", message.date.as_deref().unwrap_or("(no date)"));

    for attachment in &message.attachments {
        let id = attachment
            .attachment_id
            .as_deref()
            .map(|id| format!(" id={id}"))
            .unwrap_or_default();
        text::print_field(
            0,
            "attachment",
            &format!("{} ({} bytes){id}", attachment.filename, attachment.size),
        );
    }

    println!();
    let body = message
        .body_text
        .as_deref()
        .or(message.body_html.as_deref())
        .or(message.snippet.as_deref())
        .unwrap_or_default();
    println!("{body}");
}
