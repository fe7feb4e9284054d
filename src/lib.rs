pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod compose;
pub mod config;
pub mod context;
pub mod error;
pub mod mail;
pub mod mailbox;
pub mod output;
pub mod session;

use cli::Cli;
use error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    app::run(cli).await
}
