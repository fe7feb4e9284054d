use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;

use crate::api::gateway::MailboxGateway;
use crate::api::models::{Message, Mutation, PageRequest};
use crate::error::{AppError, AppResult};

use super::state::{MailboxState, Optimistic, PendingDelete, Reconciliation};
use super::view::View;

pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub removed: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub resynced: bool,
}

/// Drives the active view's collection. State is applied optimistically
/// under a short lock, the gateway call runs unlocked, and reconciliation
/// takes the lock again. Clones share the same state.
#[derive(Clone)]
pub struct Mailbox {
    gateway: Arc<dyn MailboxGateway>,
    state: Arc<Mutex<MailboxState>>,
    page_size: u32,
}

impl Mailbox {
    pub fn new(gateway: Arc<dyn MailboxGateway>, page_size: u32) -> Self {
        Self {
            gateway,
            state: Arc::new(Mutex::new(MailboxState::new(View::Inbox))),
            page_size,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn MailboxGateway> {
        &self.gateway
    }

    /// Runs `read` against the current state.
    pub fn inspect<R>(&self, read: impl FnOnce(&MailboxState) -> R) -> R {
        read(&*self.state())
    }

    pub fn view(&self) -> View {
        self.state().view().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages().to_vec()
    }

    pub fn message(&self, id: &str) -> Option<Message> {
        self.state().message(id).cloned()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.state().selected_ids()
    }

    pub fn open_message(&self) -> Option<Message> {
        self.state().open_message().cloned()
    }

    pub fn error(&self) -> Option<String> {
        self.state().error().map(ToOwned::to_owned)
    }

    pub fn pending_delete(&self) -> Option<PendingDelete> {
        self.state().pending_delete().cloned()
    }

    /// Switches to `view` and fetches its collection. Selection, open message
    /// and any pending confirmation are dropped first.
    pub async fn load(&self, view: View) -> AppResult<()> {
        let generation = self.state().switch_view(view.clone());
        tracing::debug!(%view, generation, "loading view");
        self.fetch_into(generation, view).await
    }

    /// Discards every optimistic leftover and resyncs the active view.
    pub async fn refresh(&self) -> AppResult<()> {
        let (generation, view) = {
            let mut state = self.state();
            let generation = state.begin_reload();
            (generation, state.view().clone())
        };
        self.fetch_into(generation, view).await
    }

    /// A blank query falls back to reloading the last regular view.
    pub async fn search(&self, query: &str) -> AppResult<()> {
        let query = query.trim();
        if query.is_empty() {
            return match self.view() {
                View::Search(_) => self.load(View::Inbox).await,
                _ => self.refresh().await,
            };
        }

        self.load(View::Search(query.to_string())).await
    }

    pub async fn more(&self) -> AppResult<usize> {
        let (generation, view, token) = {
            let state = self.state();
            (
                state.generation(),
                state.view().clone(),
                state.next_page_token().map(ToOwned::to_owned),
            )
        };
        let Some(token) = token else {
            return Ok(0);
        };

        let page = PageRequest {
            max_results: self.page_size,
            page_token: Some(token),
        };
        let page = self.gateway.fetch_view(&view, &page).await?;
        Ok(self.state().append_page(generation, page))
    }

    /// Pages further into the view until every id in `ids` is listed or the
    /// server has no more pages. Returns whether all of them are listed.
    pub async fn page_until_listed(&self, ids: &[String]) -> AppResult<bool> {
        loop {
            let missing = {
                let state = self.state();
                ids.iter().any(|id| state.message(id).is_none())
            };
            if !missing {
                return Ok(true);
            }
            if self.more().await? == 0 {
                return Ok(false);
            }
        }
    }

    /// Pages to the end of the view. Returns how many messages were added.
    pub async fn load_remaining(&self) -> AppResult<usize> {
        let mut added = 0;
        loop {
            match self.more().await? {
                0 => return Ok(added),
                count => added += count,
            }
        }
    }

    pub fn select(&self, id: &str) -> AppResult<()> {
        self.state().select(id)
    }

    pub fn deselect(&self, id: &str) -> bool {
        self.state().deselect(id)
    }

    pub fn toggle_selection(&self, id: &str) -> AppResult<bool> {
        self.state().toggle_selection(id)
    }

    pub fn toggle_all(&self) {
        self.state().toggle_all();
    }

    /// Fetches the full message, shows it, and marks it read when needed.
    pub async fn open(&self, id: &str) -> AppResult<Message> {
        let generation = self.state().generation();
        let message = self
            .gateway
            .fetch_message(id)
            .await
            .map_err(|err| fetch_error(err, id))?;

        let was_unread = self
            .message(id)
            .map(|summary| summary.is_unread)
            .unwrap_or(message.is_unread);
        let shown = self.state().open(generation, message.clone());
        if !shown {
            return Ok(message);
        }

        if was_unread && self.message(id).is_some() {
            self.mark_read(id).await?;
        }

        Ok(self.open_message().unwrap_or(message))
    }

    pub fn close(&self) {
        self.state().close();
    }

    pub async fn toggle_star(&self, id: &str, starred: bool) -> AppResult<()> {
        let optimistic = self.state().apply_star(id, starred)?;
        let mutation = if starred {
            Mutation::Star
        } else {
            Mutation::Unstar
        };
        self.dispatch(optimistic, mutation).await
    }

    pub async fn mark_read(&self, id: &str) -> AppResult<()> {
        let optimistic = self.state().apply_unread(id, false)?;
        self.dispatch(optimistic, Mutation::MarkRead).await
    }

    pub async fn mark_unread(&self, id: &str) -> AppResult<()> {
        let optimistic = self.state().apply_unread(id, true)?;
        self.dispatch(optimistic, Mutation::MarkUnread).await
    }

    pub async fn move_to_trash(&self, id: &str) -> AppResult<()> {
        let optimistic = self.state().apply_removal(id)?;
        self.dispatch(optimistic, Mutation::Trash).await
    }

    pub async fn restore_from_trash(&self, id: &str) -> AppResult<()> {
        let optimistic = {
            let mut state = self.state();
            if !state.view().is_trash() {
                return Err(AppError::Validation(
                    "only messages in trash can be restored".to_string(),
                ));
            }
            state.apply_removal(id)?
        };
        self.dispatch(optimistic, Mutation::Restore).await
    }

    pub fn request_permanent_delete(&self, id: &str) -> AppResult<PendingDelete> {
        self.state().request_permanent_delete(id)
    }

    pub fn cancel_permanent_delete(&self) -> Option<PendingDelete> {
        self.state().cancel_permanent_delete()
    }

    pub async fn confirm_permanent_delete(&self) -> AppResult<PendingDelete> {
        let (pending, optimistic) = {
            let mut state = self.state();
            let pending = state.take_pending_delete().ok_or_else(|| {
                AppError::Validation("no permanent delete is awaiting confirmation".to_string())
            })?;
            let optimistic = state.apply_removal(&pending.id).ok();
            (pending, optimistic)
        };

        let result = self
            .gateway
            .mutate(&pending.id, Mutation::PermanentDelete)
            .await;
        match (result, optimistic) {
            (Ok(()), _) => Ok(pending),
            (Err(err), Some(optimistic)) => {
                Err(self.reconcile(optimistic, Mutation::PermanentDelete, err))
            }
            (Err(err), None) => Err(mutation_error(
                err,
                Mutation::PermanentDelete,
                &pending.id,
            )),
        }
    }

    pub async fn delete_selected(&self) -> AppResult<BulkOutcome> {
        let ids = self.selected_ids();
        self.bulk_delete(ids).await
    }

    /// Permanently deletes everything shown in the trash view.
    pub async fn empty_trash(&self) -> AppResult<BulkOutcome> {
        let ids = {
            let state = self.state();
            if !state.view().is_trash() {
                return Err(AppError::Validation(
                    "empty trash is only available in the trash view".to_string(),
                ));
            }
            state
                .messages()
                .iter()
                .map(|message| message.id.clone())
                .collect::<Vec<_>>()
        };
        self.bulk_delete(ids).await
    }

    /// Removes every id at once, then issues one call per id concurrently.
    /// Any failure triggers a full resync of the view instead of per-item
    /// repair.
    pub async fn bulk_delete(&self, ids: Vec<String>) -> AppResult<BulkOutcome> {
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let (generation, mutation) = {
            let mut state = self.state();
            let mutation = if state.view().is_trash() {
                Mutation::PermanentDelete
            } else {
                Mutation::Trash
            };
            (state.apply_bulk_removal(&ids), mutation)
        };

        tracing::debug!(count = ids.len(), %mutation, "dispatching bulk delete");
        let results = join_all(ids.iter().map(|id| self.gateway.mutate(id, mutation))).await;

        let mut outcome = BulkOutcome::default();
        let mut auth_error = None;
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(()) => outcome.removed.push(id),
                Err(err) => {
                    outcome.failed.push((id, err.reason()));
                    if err.is_auth() {
                        auth_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = auth_error {
            return Err(err);
        }

        if outcome.failed.is_empty() {
            return Ok(outcome);
        }

        tracing::info!(
            failed = outcome.failed.len(),
            "bulk delete partially failed; resyncing view"
        );
        let current = self.state().generation();
        if current == generation {
            self.refresh().await?;
            outcome.resynced = true;
        }

        Err(AppError::Mutation(format!(
            "failed to {} {} of {} messages",
            mutation,
            outcome.failed.len(),
            outcome.failed.len() + outcome.removed.len()
        )))
    }

    pub async fn summarize(&self, id: &str) -> AppResult<String> {
        self.gateway.summarize(id).await
    }

    pub async fn reply(&self, id: &str, body: &str) -> AppResult<()> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("reply body is empty".to_string()));
        }
        self.gateway.reply(id, body).await
    }

    pub async fn forward(&self, id: &str, to: &str, body: &str) -> AppResult<()> {
        if to.trim().is_empty() || body.trim().is_empty() {
            return Err(AppError::Validation(
                "forward needs a recipient and a body".to_string(),
            ));
        }
        self.gateway.forward(id, to, body).await
    }

    pub async fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> AppResult<Vec<u8>> {
        self.gateway
            .download_attachment(message_id, attachment_id)
            .await
    }

    async fn fetch_into(&self, generation: u64, view: View) -> AppResult<()> {
        let result = self
            .gateway
            .fetch_view(&view, &PageRequest::first(self.page_size))
            .await;
        self.state().finish_load(generation, result)
    }

    async fn dispatch(&self, optimistic: Optimistic, mutation: Mutation) -> AppResult<()> {
        match self.gateway.mutate(optimistic.id(), mutation).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.reconcile(optimistic, mutation, err)),
        }
    }

    fn reconcile(&self, optimistic: Optimistic, mutation: Mutation, err: AppError) -> AppError {
        let id = optimistic.id().to_string();
        let outcome = self.state().reconcile_failure(optimistic);
        tracing::warn!(%id, %mutation, ?outcome, error = %err, "mutation failed");
        if outcome == Reconciliation::Stale {
            tracing::debug!(%id, "mutation outcome ignored for previous view");
        }
        mutation_error(err, mutation, &id)
    }

    fn state(&self) -> MutexGuard<'_, MailboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mutation_error(err: AppError, mutation: Mutation, id: &str) -> AppError {
    if err.is_auth() {
        return err;
    }
    AppError::Mutation(format!("failed to {mutation} message {id}: {}", err.reason()))
}

fn fetch_error(err: AppError, id: &str) -> AppError {
    if err.is_auth() {
        return err;
    }
    AppError::Fetch(format!("message {id}: {}", err.reason()))
}
