use crate::api::models::{Message, MessagePage};
use crate::error::{AppError, AppResult};

use super::selection::Selection;
use super::view::View;

/// Bumped whenever the displayed collection is invalidated (view switch,
/// refresh, resync). Reconciliation recorded under an older generation is
/// discarded.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq)]
enum PreImage {
    Starred(bool),
    Unread(bool),
    Removed { index: usize, message: Box<Message> },
}

/// Record of one optimistic change, enough to undo it while the generation
/// it was applied under is still current.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimistic {
    generation: Generation,
    id: String,
    pre_image: PreImage,
}

impl Optimistic {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Reverted,
    Stale,
    Gone,
}

#[derive(Debug, Clone)]
pub struct MailboxState {
    view: View,
    generation: Generation,
    messages: Vec<Message>,
    selection: Selection,
    open: Option<Message>,
    error: Option<String>,
    loading: bool,
    pending_delete: Option<PendingDelete>,
    next_page_token: Option<String>,
}

impl MailboxState {
    pub fn new(view: View) -> Self {
        Self {
            view,
            generation: 0,
            messages: Vec::new(),
            selection: Selection::default(),
            open: None,
            error: None,
            loading: false,
            pending_delete: None,
            next_page_token: None,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn open_message(&self) -> Option<&Message> {
        self.open.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    pub fn unread_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|message| message.is_unread)
            .count()
    }

    pub fn summary_line(&self) -> String {
        if !self.selection.is_empty() {
            return format!("{} selected", self.selection.len());
        }

        let total = self.messages.len();
        if total == 0 {
            return self.view.empty_notice().to_string();
        }

        format!("1-{total} of {total}")
    }

    /// Makes `view` active and drops everything scoped to the old one.
    pub fn switch_view(&mut self, view: View) -> Generation {
        self.view = view;
        self.messages.clear();
        self.next_page_token = None;
        self.pending_delete = None;
        self.begin_reload()
    }

    /// Starts a refetch of the active view. Open message and selection are
    /// cleared; the collection stays until the fetch resolves.
    pub fn begin_reload(&mut self) -> Generation {
        self.generation += 1;
        self.open = None;
        self.selection.clear();
        self.loading = true;
        self.error = None;
        self.generation
    }

    pub fn finish_load(
        &mut self,
        generation: Generation,
        result: AppResult<MessagePage>,
    ) -> AppResult<()> {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale view load"
            );
            return Ok(());
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.messages = page.messages;
                self.next_page_token = page.next_page_token;
                self.error = None;
                self.selection.retain_displayed(&self.messages);
                Ok(())
            }
            Err(err) => {
                self.messages.clear();
                self.next_page_token = None;
                self.selection.clear();
                self.error = Some(err.reason());
                if err.is_auth() {
                    return Err(err);
                }
                Err(AppError::Fetch(err.reason()))
            }
        }
    }

    /// Appends a further page, skipping ids already displayed. Returns how
    /// many messages were added.
    pub fn append_page(&mut self, generation: Generation, page: MessagePage) -> usize {
        if generation != self.generation {
            return 0;
        }

        let before = self.messages.len();
        for message in page.messages {
            if self.message(&message.id).is_none() {
                self.messages.push(message);
            }
        }
        self.next_page_token = page.next_page_token;
        self.messages.len() - before
    }

    pub fn select(&mut self, id: &str) -> AppResult<()> {
        self.require_displayed(id)?;
        self.selection.select(id);
        Ok(())
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        self.selection.deselect(id)
    }

    pub fn toggle_selection(&mut self, id: &str) -> AppResult<bool> {
        self.require_displayed(id)?;
        Ok(self.selection.toggle(id))
    }

    pub fn toggle_all(&mut self) {
        self.selection.toggle_all(&self.messages);
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids().map(ToOwned::to_owned).collect()
    }

    pub fn open(&mut self, generation: Generation, message: Message) -> bool {
        if generation != self.generation {
            return false;
        }

        self.open = Some(message);
        true
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn apply_star(&mut self, id: &str, starred: bool) -> AppResult<Optimistic> {
        let message = self.displayed_mut(id)?;
        let previous = message.is_starred;
        message.is_starred = starred;
        if let Some(open) = self.open.as_mut().filter(|open| open.id == id) {
            open.is_starred = starred;
        }

        // Unstarring inside the starred view drops the row right away. A
        // failed call restores the flag only, not the row.
        if self.view.is_starred() && !starred {
            self.remove_displayed(id);
        }

        Ok(self.record(id, PreImage::Starred(previous)))
    }

    pub fn apply_unread(&mut self, id: &str, unread: bool) -> AppResult<Optimistic> {
        let message = self.displayed_mut(id)?;
        let previous = message.is_unread;
        message.is_unread = unread;
        if let Some(open) = self.open.as_mut().filter(|open| open.id == id) {
            open.is_unread = unread;
        }

        Ok(self.record(id, PreImage::Unread(previous)))
    }

    pub fn apply_removal(&mut self, id: &str) -> AppResult<Optimistic> {
        let Some((index, message)) = self.remove_displayed(id) else {
            return Err(AppError::Validation(format!(
                "message {id} is not in the current {} view",
                self.view.name()
            )));
        };

        Ok(self.record(
            id,
            PreImage::Removed {
                index,
                message: Box::new(message),
            },
        ))
    }

    /// Removes every id in one step. Selection is emptied regardless of
    /// which ids were actually displayed.
    pub fn apply_bulk_removal(&mut self, ids: &[String]) -> Generation {
        for id in ids {
            self.remove_displayed(id);
        }
        self.selection.clear();
        self.generation
    }

    pub fn reconcile_failure(&mut self, optimistic: Optimistic) -> Reconciliation {
        if optimistic.generation != self.generation {
            tracing::debug!(id = %optimistic.id, "view changed; dropping rollback");
            return Reconciliation::Stale;
        }

        let id = optimistic.id;
        match optimistic.pre_image {
            PreImage::Starred(previous) => {
                let Some(message) = self.messages.iter_mut().find(|message| message.id == id)
                else {
                    return Reconciliation::Gone;
                };
                message.is_starred = previous;
                if let Some(open) = self.open.as_mut().filter(|open| open.id == id) {
                    open.is_starred = previous;
                }
            }
            PreImage::Unread(previous) => {
                let Some(message) = self.messages.iter_mut().find(|message| message.id == id)
                else {
                    return Reconciliation::Gone;
                };
                message.is_unread = previous;
                if let Some(open) = self.open.as_mut().filter(|open| open.id == id) {
                    open.is_unread = previous;
                }
            }
            PreImage::Removed { index, message } => {
                if self.message(&id).is_some() {
                    return Reconciliation::Gone;
                }
                let index = index.min(self.messages.len());
                self.messages.insert(index, *message);
            }
        }

        tracing::warn!(%id, "rolled back optimistic change");
        Reconciliation::Reverted
    }

    /// Records a permanent-delete request awaiting confirmation. A newer
    /// request replaces an older one.
    pub fn request_permanent_delete(&mut self, id: &str) -> AppResult<PendingDelete> {
        let subject = self
            .message(id)
            .or(self.open.as_ref().filter(|open| open.id == id))
            .map(|message| message.subject_or_placeholder().to_string())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "message {id} is not in the current {} view",
                    self.view.name()
                ))
            })?;

        let pending = PendingDelete {
            id: id.to_string(),
            subject,
        };
        self.pending_delete = Some(pending.clone());
        Ok(pending)
    }

    pub fn take_pending_delete(&mut self) -> Option<PendingDelete> {
        self.pending_delete.take()
    }

    pub fn cancel_permanent_delete(&mut self) -> Option<PendingDelete> {
        self.pending_delete.take()
    }

    fn record(&self, id: &str, pre_image: PreImage) -> Optimistic {
        Optimistic {
            generation: self.generation,
            id: id.to_string(),
            pre_image,
        }
    }

    fn require_displayed(&self, id: &str) -> AppResult<()> {
        if self.message(id).is_none() {
            return Err(AppError::Validation(format!(
                "message {id} is not in the current {} view",
                self.view.name()
            )));
        }
        Ok(())
    }

    fn displayed_mut(&mut self, id: &str) -> AppResult<&mut Message> {
        let view = self.view.name();
        self.messages
            .iter_mut()
            .find(|message| message.id == id)
            .ok_or_else(|| {
                AppError::Validation(format!("message {id} is not in the current {view} view"))
            })
    }

    fn remove_displayed(&mut self, id: &str) -> Option<(usize, Message)> {
        if self.open.as_ref().is_some_and(|open| open.id == id) {
            self.open = None;
        }
        self.selection.deselect(id);

        let index = self.messages.iter().position(|message| message.id == id)?;
        Some((index, self.messages.remove(index)))
    }
}
