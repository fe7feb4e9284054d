use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::mailbox::View;

use super::models::{
    LocalFile, Message, MessagePage, Mutation, OutgoingMessage, PageRequest, Tone,
    UploadedAttachment,
};

/// Upload progress in whole percent, 0 through 100.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Stateless request/response access to the mail backend. Every call is
/// independent; callers decide whether to retry.
#[async_trait]
pub trait MailboxGateway: Send + Sync {
    async fn fetch_view(&self, view: &View, page: &PageRequest) -> AppResult<MessagePage>;

    async fn fetch_message(&self, id: &str) -> AppResult<Message>;

    async fn mutate(&self, id: &str, mutation: Mutation) -> AppResult<()>;

    async fn send(&self, message: &OutgoingMessage) -> AppResult<()>;

    async fn save_draft(&self, message: &OutgoingMessage) -> AppResult<()>;

    async fn upload_attachment(
        &self,
        file: &LocalFile,
        progress: ProgressFn,
    ) -> AppResult<UploadedAttachment>;

    async fn reply(&self, id: &str, body: &str) -> AppResult<()>;

    async fn forward(&self, id: &str, to: &str, body: &str) -> AppResult<()>;

    async fn summarize(&self, id: &str) -> AppResult<String>;

    async fn download_attachment(&self, message_id: &str, attachment_id: &str)
    -> AppResult<Vec<u8>>;

    async fn generate(&self, instruction: &str, tone: Tone) -> AppResult<String>;
}

/// Whole-percent progress for `loaded` of `total` bytes.
pub fn percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }

    let loaded = loaded.min(total);
    ((loaded * 100 + total / 2) / total) as u8
}
