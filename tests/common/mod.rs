#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Notify, Semaphore, mpsc, oneshot, watch};

use mailbox::api::gateway::{MailboxGateway, ProgressFn};
use mailbox::api::models::{
    LocalFile, Message, MessagePage, Mutation, OutgoingMessage, PageRequest, Tone,
    UploadedAttachment,
};
use mailbox::compose::{CaptureDevice, CaptureStream};
use mailbox::error::{AppError, AppResult};
use mailbox::mailbox::View;

pub fn message(id: &str) -> Message {
    Message {
        id: id.to_string(),
        subject: Some(format!("subject {id}")),
        from: Some("sender@example.com".to_string()),
        ..Message::default()
    }
}

pub fn unread(id: &str) -> Message {
    Message {
        is_unread: true,
        ..message(id)
    }
}

pub fn ids(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|message| message.id.clone()).collect()
}

#[derive(Default)]
struct Backend {
    folders: BTreeMap<&'static str, Vec<Message>>,
    failing: BTreeSet<String>,
    failing_uploads: BTreeSet<String>,
    expired: bool,
    calls: Vec<String>,
    sent: Vec<OutgoingMessage>,
    drafts: Vec<OutgoingMessage>,
}

/// In-memory backend with per-folder contents. Successful mutations move
/// messages between folders the way the real server does.
#[derive(Default)]
pub struct FakeGateway {
    backend: Mutex<Backend>,
    mutation_gate: Mutex<Option<Arc<Semaphore>>>,
    upload_gate: Mutex<Option<Arc<Semaphore>>>,
    call_seen: Notify,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_folder(self: Arc<Self>, view: &View, messages: Vec<Message>) -> Arc<Self> {
        self.backend().folders.insert(view.name(), messages);
        self
    }

    pub fn fail_mutations_for(&self, id: &str) {
        self.backend().failing.insert(id.to_string());
    }

    pub fn fail_upload_of(&self, name: &str) {
        self.backend().failing_uploads.insert(name.to_string());
    }

    pub fn expire_session(&self) {
        self.backend().expired = true;
    }

    /// Mutations block until `release_mutations` hands out permits.
    pub fn hold_mutations(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.mutation_gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn hold_uploads(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.upload_gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn folder(&self, view: &View) -> Vec<Message> {
        self.backend()
            .folders
            .get(view.name())
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.backend().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.backend()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.backend().sent.clone()
    }

    pub fn drafts(&self) -> Vec<OutgoingMessage> {
        self.backend().drafts.clone()
    }

    /// Resolves once at least `count` calls starting with `prefix` were made.
    pub async fn wait_for_calls(&self, prefix: &str, count: usize) {
        loop {
            let notified = self.call_seen.notified();
            if self.calls_starting_with(prefix) >= count {
                return;
            }
            notified.await;
        }
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        lock(&self.backend)
    }

    fn record(&self, call: String) -> AppResult<()> {
        let expired = {
            let mut backend = self.backend();
            backend.calls.push(call);
            backend.expired
        };
        self.call_seen.notify_waiters();
        if expired {
            return Err(AppError::Auth("session expired".to_string()));
        }
        Ok(())
    }

    fn apply(&self, id: &str, mutation: Mutation) -> AppResult<()> {
        let mut backend = self.backend();
        if backend.failing.contains(id) {
            return Err(AppError::Api(format!("server rejected {id}")));
        }

        let found = backend
            .folders
            .values()
            .flatten()
            .find(|message| message.id == id)
            .cloned();
        let Some(mut found) = found else {
            return Err(AppError::Api(format!("message {id} not found")));
        };

        let folders = &mut backend.folders;
        match mutation {
            Mutation::Star | Mutation::Unstar => {
                let starred = mutation == Mutation::Star;
                for message in folders.values_mut().flatten().filter(|m| m.id == id) {
                    message.is_starred = starred;
                }
                let starred_folder = folders.entry("starred").or_default();
                starred_folder.retain(|message| message.id != id);
                if starred {
                    found.is_starred = true;
                    starred_folder.push(found);
                }
            }
            Mutation::MarkRead | Mutation::MarkUnread => {
                let unread = mutation == Mutation::MarkUnread;
                for message in folders.values_mut().flatten().filter(|m| m.id == id) {
                    message.is_unread = unread;
                }
            }
            Mutation::Trash => {
                for folder in folders.values_mut() {
                    folder.retain(|message| message.id != id);
                }
                folders.entry("trash").or_default().push(found);
            }
            Mutation::Restore => {
                folders.entry("trash").or_default().retain(|m| m.id != id);
                folders.entry("inbox").or_default().push(found);
            }
            Mutation::PermanentDelete => {
                folders.entry("trash").or_default().retain(|m| m.id != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MailboxGateway for FakeGateway {
    async fn fetch_view(&self, view: &View, page: &PageRequest) -> AppResult<MessagePage> {
        self.record(format!("fetch:{view}"))?;

        let all = match view {
            View::Search(query) => self
                .folder(&View::Inbox)
                .into_iter()
                .filter(|message| message.subject_or_placeholder().contains(query.as_str()))
                .collect(),
            other => self.folder(other),
        };

        // Drafts come back in one unpaged response, as from the real server.
        if *view == View::Drafts {
            return Ok(MessagePage {
                messages: all,
                next_page_token: None,
            });
        }

        let offset = page
            .page_token
            .as_deref()
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0);
        let end = (offset + page.max_results as usize).min(all.len());
        let next_page_token = (end < all.len()).then(|| end.to_string());

        Ok(MessagePage {
            messages: all.get(offset..end).map(<[Message]>::to_vec).unwrap_or_default(),
            next_page_token,
        })
    }

    async fn fetch_message(&self, id: &str) -> AppResult<Message> {
        self.record(format!("get:{id}"))?;
        let found = self
            .backend()
            .folders
            .values()
            .flatten()
            .find(|message| message.id == id)
            .cloned();
        let mut message = found.ok_or_else(|| AppError::Api(format!("message {id} not found")))?;
        message.body_text = Some(format!("body of {id}"));
        Ok(message)
    }

    async fn mutate(&self, id: &str, mutation: Mutation) -> AppResult<()> {
        self.record(format!("mutate:{id}:{mutation}"))?;
        let gate = lock(&self.mutation_gate).clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.apply(id, mutation)
    }

    async fn send(&self, message: &OutgoingMessage) -> AppResult<()> {
        self.record("send".to_string())?;
        self.backend().sent.push(message.clone());
        Ok(())
    }

    async fn save_draft(&self, message: &OutgoingMessage) -> AppResult<()> {
        self.record("draft".to_string())?;
        self.backend().drafts.push(message.clone());
        Ok(())
    }

    async fn upload_attachment(
        &self,
        file: &LocalFile,
        progress: ProgressFn,
    ) -> AppResult<UploadedAttachment> {
        self.record(format!("upload:{}", file.name))?;
        progress(40);
        let gate = lock(&self.upload_gate).clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.backend().failing_uploads.contains(&file.name) {
            return Err(AppError::Api(format!("upload of {} failed", file.name)));
        }

        progress(100);
        Ok(UploadedAttachment {
            filename: file.name.clone(),
            size: file.size(),
            mime_type: file.mime_type.clone(),
            id: format!("uploads/{}", file.name),
        })
    }

    async fn reply(&self, id: &str, body: &str) -> AppResult<()> {
        self.record(format!("reply:{id}:{body}"))
    }

    async fn forward(&self, id: &str, to: &str, body: &str) -> AppResult<()> {
        self.record(format!("forward:{id}:{to}:{body}"))
    }

    async fn summarize(&self, id: &str) -> AppResult<String> {
        self.record(format!("summarize:{id}"))?;
        Ok(format!("summary of {id}"))
    }

    async fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> AppResult<Vec<u8>> {
        self.record(format!("attachment:{message_id}:{attachment_id}"))?;
        Ok(b"attachment bytes".to_vec())
    }

    async fn generate(&self, instruction: &str, tone: Tone) -> AppResult<String> {
        self.record(format!("generate:{tone:?}"))?;
        Ok(format!("<p>{instruction}</p>"))
    }
}

/// One opened capture. The feed is dropped once the stop signal arrives,
/// which closes the stream for the recorder.
struct Capture {
    feed: Arc<Mutex<Option<mpsc::UnboundedSender<Bytes>>>>,
    stopped: watch::Receiver<bool>,
}

/// Capture device backed by channels the test drives directly.
#[derive(Default)]
pub struct FakeCaptureDevice {
    denied: Mutex<bool>,
    flush_on_stop: Mutex<Option<&'static [u8]>>,
    never_closes: Mutex<bool>,
    open_gate: Mutex<Option<Arc<Semaphore>>>,
    captures: Mutex<Vec<Capture>>,
    opened: Mutex<usize>,
    open_seen: Notify,
}

impl FakeCaptureDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deny(&self) {
        *lock(&self.denied) = true;
    }

    /// Sends `chunk` after the stop signal, before closing the stream.
    pub fn flush_on_stop(&self, chunk: &'static [u8]) {
        *lock(&self.flush_on_stop) = Some(chunk);
    }

    /// Keeps the stream open after stop, like a device that hangs.
    pub fn never_close(&self) {
        *lock(&self.never_closes) = true;
    }

    /// `open` blocks until the returned gate hands out a permit.
    pub fn hold_open(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.open_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Number of `open` calls, including ones still pending.
    pub fn opened(&self) -> usize {
        *lock(&self.opened)
    }

    pub async fn wait_for_open(&self) {
        loop {
            let notified = self.open_seen.notified();
            if self.opened() > 0 {
                return;
            }
            notified.await;
        }
    }

    /// Pushes a chunk into the most recently opened capture.
    pub fn feed(&self, chunk: &'static [u8]) {
        if let Some(capture) = lock(&self.captures).last() {
            if let Some(feed) = lock(&capture.feed).as_ref() {
                let _ = feed.send(Bytes::from_static(chunk));
            }
        }
    }

    /// Whether the most recent capture was told to stop (or its guard was
    /// dropped). Waits briefly for the device task to observe it.
    pub async fn stopped(&self) -> bool {
        let mut stopped = match lock(&self.captures).last() {
            Some(capture) => capture.stopped.clone(),
            None => return false,
        };
        let seen = tokio::time::timeout(
            Duration::from_secs(1),
            stopped.wait_for(|stopped| *stopped),
        )
        .await;
        matches!(seen, Ok(Ok(_)))
    }
}

#[async_trait]
impl CaptureDevice for FakeCaptureDevice {
    async fn open(&self) -> AppResult<CaptureStream> {
        *lock(&self.opened) += 1;
        self.open_seen.notify_waiters();

        let gate = lock(&self.open_gate).clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|err| AppError::Device(err.to_string()))?
                .forget();
        }

        if *lock(&self.denied) {
            return Err(AppError::Device("permission denied".to_string()));
        }

        let (feed, chunks) = mpsc::unbounded_channel();
        let (stop, stop_seen) = oneshot::channel::<()>();
        let (stopped_tx, stopped) = watch::channel(false);
        let feed = Arc::new(Mutex::new(Some(feed)));

        let flush = *lock(&self.flush_on_stop);
        let never_closes = *lock(&self.never_closes);
        let device_feed = Arc::clone(&feed);
        tokio::spawn(async move {
            let _ = stop_seen.await;
            let sender = lock(&device_feed).take();
            if let (Some(sender), Some(chunk)) = (&sender, flush) {
                let _ = sender.send(Bytes::from_static(chunk));
            }
            let _ = stopped_tx.send(true);
            if never_closes {
                std::future::pending::<()>().await;
            }
            drop(sender);
        });

        lock(&self.captures).push(Capture { feed, stopped });

        Ok(CaptureStream {
            mime_type: "audio/webm;codecs=opus".to_string(),
            chunks,
            stop,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
