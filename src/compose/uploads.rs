use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;

use crate::api::gateway::{MailboxGateway, ProgressFn};
use crate::api::models::{LocalFile, UploadedAttachment};
use crate::error::{AppError, AppResult};

pub const MAX_ATTACHMENT_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_ATTACHMENTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub uploaded: Vec<UploadedAttachment>,
    pub failed: Vec<UploadFailure>,
}

#[derive(Debug, Default)]
struct Uploads {
    // Bumped by `clear`; completions from an older epoch are dropped.
    epoch: u64,
    in_flight: BTreeMap<String, u8>,
    attached: Vec<UploadedAttachment>,
}

/// Per-file upload progress and the confirmed attachment list of one compose
/// session.
#[derive(Clone)]
pub struct AttachmentTracker {
    gateway: Arc<dyn MailboxGateway>,
    uploads: Arc<Mutex<Uploads>>,
}

impl AttachmentTracker {
    pub fn new(gateway: Arc<dyn MailboxGateway>) -> Self {
        Self {
            gateway,
            uploads: Arc::new(Mutex::new(Uploads::default())),
        }
    }

    /// File name to percent for uploads that have not resolved yet.
    pub fn uploading(&self) -> BTreeMap<String, u8> {
        lock(&self.uploads).in_flight.clone()
    }

    pub fn is_uploading(&self) -> bool {
        !lock(&self.uploads).in_flight.is_empty()
    }

    pub fn attachments(&self) -> Vec<UploadedAttachment> {
        lock(&self.uploads).attached.clone()
    }

    /// Validates the whole batch, then uploads every file concurrently.
    /// A rejected batch uploads nothing; a failed file does not affect its
    /// siblings.
    pub async fn add_files(&self, files: Vec<LocalFile>) -> AppResult<BatchReport> {
        let epoch = {
            let mut uploads = lock(&self.uploads);
            validate_batch(&files, uploads.attached.len(), &uploads.in_flight)?;
            for file in &files {
                uploads.in_flight.insert(file.name.clone(), 0);
            }
            uploads.epoch
        };

        let results = join_all(files.iter().map(|file| self.upload_one(file, epoch))).await;

        let mut report = BatchReport::default();
        let mut auth_error = None;
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(meta) => report.uploaded.push(meta),
                Err(err) => {
                    report.failed.push(UploadFailure {
                        file: file.name.clone(),
                        reason: err.reason(),
                    });
                    if err.is_auth() {
                        auth_error = Some(err);
                    }
                }
            }
        }

        match auth_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    pub fn remove_attachment(&self, index: usize) -> AppResult<UploadedAttachment> {
        let mut uploads = lock(&self.uploads);
        if index >= uploads.attached.len() {
            return Err(AppError::Validation(format!(
                "no attachment at position {index}"
            )));
        }
        Ok(uploads.attached.remove(index))
    }

    /// Drops confirmed attachments and forgets in-flight uploads.
    pub fn clear(&self) {
        let mut uploads = lock(&self.uploads);
        uploads.epoch += 1;
        uploads.in_flight.clear();
        uploads.attached.clear();
    }

    async fn upload_one(&self, file: &LocalFile, epoch: u64) -> AppResult<UploadedAttachment> {
        let progress = progress_reporter(Arc::clone(&self.uploads), file.name.clone(), epoch);
        let result = self.gateway.upload_attachment(file, progress).await;

        let mut uploads = lock(&self.uploads);
        if uploads.epoch != epoch {
            return result;
        }

        uploads.in_flight.remove(&file.name);
        match result {
            Ok(meta) => {
                uploads.attached.push(meta.clone());
                Ok(meta)
            }
            Err(err) => {
                tracing::warn!(file = %file.name, error = %err, "attachment upload failed");
                Err(err)
            }
        }
    }
}

fn progress_reporter(uploads: Arc<Mutex<Uploads>>, name: String, epoch: u64) -> ProgressFn {
    Arc::new(move |percent| {
        let mut uploads = lock(&uploads);
        if uploads.epoch != epoch {
            return;
        }
        if let Some(current) = uploads.in_flight.get_mut(&name) {
            *current = (*current).max(percent.min(100));
        }
    })
}

fn validate_batch(
    files: &[LocalFile],
    attached: usize,
    in_flight: &BTreeMap<String, u8>,
) -> AppResult<()> {
    let oversized = files
        .iter()
        .filter(|file| file.size() > MAX_ATTACHMENT_BYTES)
        .map(|file| file.name.as_str())
        .collect::<Vec<_>>();
    if !oversized.is_empty() {
        return Err(AppError::Validation(format!(
            "files exceed the {} MB limit: {}",
            MAX_ATTACHMENT_BYTES / (1024 * 1024),
            oversized.join(", ")
        )));
    }

    if attached + in_flight.len() + files.len() > MAX_ATTACHMENTS {
        return Err(AppError::Validation(format!(
            "maximum {MAX_ATTACHMENTS} attachments allowed"
        )));
    }

    let mut seen = BTreeSet::new();
    let duplicates = files
        .iter()
        .filter(|file| in_flight.contains_key(&file.name) || !seen.insert(file.name.as_str()))
        .map(|file| file.name.as_str())
        .collect::<Vec<_>>();
    if !duplicates.is_empty() {
        return Err(AppError::Validation(format!(
            "already uploading: {}",
            duplicates.join(", ")
        )));
    }

    Ok(())
}

fn lock(uploads: &Mutex<Uploads>) -> MutexGuard<'_, Uploads> {
    uploads.lock().unwrap_or_else(PoisonError::into_inner)
}
