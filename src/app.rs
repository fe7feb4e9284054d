use crate::cli::{Cli, Command};
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    let Cli {
        profile,
        json,
        command,
        ..
    } = cli;

    let ctx = AppContext::bootstrap(profile, json)?;

    let result = dispatch(&ctx, command).await;
    if let Err(err) = &result {
        if err.is_auth() {
            ctx.expire_session()?;
        }
        ctx.output.report_error(err)?;
    }
    result
}

async fn dispatch(ctx: &AppContext, command: Command) -> AppResult<()> {
    match command {
        Command::Auth(args) => commands::auth::run(ctx, args.command).await,
        Command::List(args) => commands::list::run(ctx, args).await,
        Command::Get(args) => commands::get::run(ctx, args).await,
        Command::Star(args) => commands::flag::star(ctx, args, true).await,
        Command::Unstar(args) => commands::flag::star(ctx, args, false).await,
        Command::Read(args) => commands::flag::read(ctx, args, true).await,
        Command::Unread(args) => commands::flag::read(ctx, args, false).await,
        Command::Trash(args) => commands::delete::trash(ctx, args).await,
        Command::Restore(args) => commands::delete::restore(ctx, args).await,
        Command::Purge(args) => commands::delete::purge(ctx, args).await,
        Command::EmptyTrash(args) => commands::delete::empty_trash(ctx, args).await,
        Command::Summarize(args) => commands::message::summarize(ctx, args).await,
        Command::Attachment(args) => commands::message::attachment(ctx, args).await,
        Command::Reply(args) => commands::message::reply(ctx, args).await,
        Command::Forward(args) => commands::message::forward(ctx, args).await,
        Command::Send(args) => commands::send::send(ctx, args).await,
        Command::Draft(args) => commands::send::draft(ctx, args).await,
        Command::Generate(args) => commands::send::generate(ctx, args).await,
    }
}
