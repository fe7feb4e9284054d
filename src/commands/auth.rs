use serde::Serialize;

use crate::cli::{AuthCommand, LoginArgs};
use crate::config;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::session::{Session, SessionStore};

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub profile: String,
    pub logged_in: bool,
    pub email: Option<String>,
    pub token: Option<String>,
    pub api_base_url: String,
    pub settings_file: String,
}

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Login(args) => login(ctx, args),
        AuthCommand::Status => {
            let status = status(ctx)?;
            let text = if status.logged_in {
                format!(
                    "{}: logged in{} against {}",
                    status.profile,
                    status
                        .email
                        .as_ref()
                        .map(|email| format!(" as {email}"))
                        .unwrap_or_default(),
                    status.api_base_url,
                )
            } else {
                format!("{}: logged out", status.profile)
            };

            ctx.output.emit(&text, &status)
        }
        AuthCommand::Logout => {
            ctx.session_store.clear(&ctx.profile)?;
            let status = status(ctx)?;
            let text = format!("{}: logged out", status.profile);
            ctx.output.emit(&text, &status)
        }
    }
}

fn login(ctx: &AppContext, args: LoginArgs) -> AppResult<()> {
    let token = args.token.trim();
    if token.is_empty() {
        return Err(AppError::InvalidInput("--token must not be empty".to_string()));
    }

    if let Some(api_url) = args.api_url.as_deref().map(str::trim) {
        url::Url::parse(api_url)?;
        config::update_settings(&ctx.paths, &ctx.profile, |settings| {
            settings.api_base_url = Some(api_url.to_string());
        })?;
    }

    let session = Session {
        access_token: token.to_string(),
        email: args.email.filter(|email| !email.trim().is_empty()),
    };
    ctx.session_store.save(&ctx.profile, &session)?;

    let status = status(ctx)?;
    let text = format!("{}: session stored", status.profile);
    ctx.output.emit(&text, &status)
}

fn status(ctx: &AppContext) -> AppResult<AuthStatus> {
    let settings = config::load_settings(&ctx.paths, &ctx.profile)?;
    let session = ctx.session_store.load(&ctx.profile)?;

    Ok(AuthStatus {
        profile: ctx.profile.clone(),
        logged_in: session.is_some(),
        email: session.as_ref().and_then(|session| session.email.clone()),
        token: session.as_ref().map(Session::masked_token),
        api_base_url: settings.api_base_url().to_string(),
        settings_file: ctx.paths.settings_file(&ctx.profile).display().to_string(),
    })
}
