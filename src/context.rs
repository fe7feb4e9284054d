use std::sync::Arc;

use crate::api::client::HttpGateway;
use crate::api::gateway::MailboxGateway;
use crate::config::{self, AppPaths, Settings};
use crate::error::{AppError, AppResult};
use crate::mailbox::{Mailbox, View};
use crate::output::Output;
use crate::session::{FileSessionStore, SessionStore};

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub paths: AppPaths,
    pub settings: Settings,
    pub session_store: FileSessionStore,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let session_store = FileSessionStore::new(paths.clone());
        let output = Output::new(json);

        Ok(Self {
            profile,
            paths,
            settings,
            session_store,
            output,
        })
    }

    pub fn gateway(&self) -> AppResult<Arc<dyn MailboxGateway>> {
        let session = self.session_store.load(&self.profile)?.ok_or_else(|| {
            AppError::InvalidInput(
                "not logged in. run `mailbox auth login --token <token>`".to_string(),
            )
        })?;

        Ok(Arc::new(HttpGateway::new(
            self.settings.api_base_url(),
            Some(session.access_token),
        )))
    }

    pub fn mailbox(&self) -> AppResult<Mailbox> {
        Ok(Mailbox::new(self.gateway()?, self.settings.page_size()?))
    }

    /// A mailbox with `view` already loaded, for commands that act on a
    /// listed message.
    pub async fn mailbox_in(&self, view: View) -> AppResult<Mailbox> {
        let mailbox = self.mailbox()?;
        mailbox.load(view).await?;
        Ok(mailbox)
    }

    /// Like `mailbox_in`, paging further until every id in `ids` is listed.
    /// Ids that never show up are left to the operation to reject.
    pub async fn mailbox_listing(&self, view: View, ids: &[String]) -> AppResult<Mailbox> {
        let mailbox = self.mailbox_in(view).await?;
        if !mailbox.page_until_listed(ids).await? {
            tracing::debug!(?ids, "not every id is listed in the view");
        }
        Ok(mailbox)
    }

    /// Drops the stored session after the backend rejected it.
    pub fn expire_session(&self) -> AppResult<()> {
        tracing::info!(profile = %self.profile, "session rejected by backend; clearing it");
        self.session_store.clear(&self.profile)
    }
}
