use serde::Serialize;

use crate::api::models::Message;
use crate::cli::ListArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::mailbox::{Mailbox, View};
use crate::output::{OutputMode, text};

#[derive(Debug, Serialize)]
struct Listing<'a> {
    view: String,
    unread: usize,
    next_page_token: Option<String>,
    messages: &'a [Message],
}

pub async fn run(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    if args.limit == Some(0) {
        return Err(AppError::InvalidInput(
            "--limit must be greater than 0".to_string(),
        ));
    }
    if args.pages == 0 {
        return Err(AppError::InvalidInput(
            "--pages must be greater than 0".to_string(),
        ));
    }

    let page_size = match args.limit {
        Some(limit) => limit,
        None => ctx.settings.page_size()?,
    };
    let mailbox = Mailbox::new(ctx.gateway()?, page_size);

    match args.q.as_deref() {
        Some(query) if !query.trim().is_empty() => mailbox.search(query).await?,
        _ => mailbox.load(View::parse(&args.view)?).await?,
    }
    for _ in 1..args.pages {
        if mailbox.more().await? == 0 {
            break;
        }
    }

    let messages = mailbox.messages();
    let (unread, summary, next_page_token) = mailbox.inspect(|state| {
        (
            state.unread_count(),
            state.summary_line(),
            state.next_page_token().map(ToOwned::to_owned),
        )
    });

    if ctx.output.mode() == OutputMode::Text {
        println!("{} ({summary}, {unread} unread)", mailbox.view());
        for (index, message) in messages.iter().enumerate() {
            print_row(index, message);
        }
        return Ok(());
    }

    let listing = Listing {
        view: mailbox.view().to_string(),
        unread,
        next_page_token,
        messages: &messages,
    };
    ctx.output.emit(&summary, &listing)
}

fn print_row(index: usize, message: &Message) {
    let marker = match (message.is_unread, message.is_starred) {
        (true, true) => "*+",
        (true, false) => " +",
        (false, true) => "* ",
        (false, false) => "  ",
    };
    let from = message.from.as_deref().unwrap_or("(unknown sender)");
    let date = message.date.as_deref().unwrap_or("(no date)");

    println!();
    println!("{}. {marker} {}", index + 1, message.id);
    text::print_field(3, "from", from);
    text::print_field(3, "subject", message.subject_or_placeholder());
    text::print_field(3, "date", date);
    println!("   {}", format_preview(message.snippet.as_deref()));
}

fn format_preview(snippet: Option<&str>) -> String {
    let snippet = snippet.unwrap_or("(no preview)");
    let decoded = html_escape::decode_html_entities(snippet).to_string();
    let compact = decoded.split_whitespace().collect::<Vec<_>>().join(" ");

    if compact.len() <= 120 {
        return compact;
    }

    let mut end = 120;
    while !compact.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &compact[..end])
}
