use std::sync::Arc;

use crate::api::gateway::MailboxGateway;
use crate::api::models::{LocalFile, OutgoingAttachment, OutgoingMessage, Tone};
use crate::error::{AppError, AppResult};

use super::device::Microphone;
use super::inline;
use super::uploads::AttachmentTracker;
use super::voice::VoiceRecorder;

const GENERATED_SEPARATOR: &str = "<br><br>";

/// One compose window: header fields, the rich text body with a cursor,
/// uploaded attachments and an optional voice message.
pub struct ComposeSession {
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub subject: String,
    body: String,
    cursor: usize,
    tracker: AttachmentTracker,
    voice: VoiceRecorder,
    gateway: Arc<dyn MailboxGateway>,
}

impl ComposeSession {
    pub fn new(gateway: Arc<dyn MailboxGateway>, microphone: Microphone) -> Self {
        Self {
            to: String::new(),
            cc: String::new(),
            bcc: String::new(),
            subject: String::new(),
            body: String::new(),
            cursor: 0,
            tracker: AttachmentTracker::new(Arc::clone(&gateway)),
            voice: VoiceRecorder::new(microphone),
            gateway,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replaces the body and moves the cursor to its end.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.cursor = self.body.len();
    }

    /// Places the cursor at byte offset `position`, clamped to the body and
    /// moved back to the nearest character boundary.
    pub fn set_cursor(&mut self, position: usize) {
        let mut position = position.min(self.body.len());
        while !self.body.is_char_boundary(position) {
            position -= 1;
        }
        self.cursor = position;
    }

    pub fn insert_at_cursor(&mut self, markup: &str) {
        self.set_cursor(self.cursor);
        self.body.insert_str(self.cursor, markup);
        self.cursor += markup.len();
    }

    /// Embeds an image directly in the body. It never becomes an attachment.
    pub fn insert_inline_image(&mut self, file: &LocalFile) -> AppResult<()> {
        let tag = inline::image_tag(file)?;
        self.insert_at_cursor(&tag);
        Ok(())
    }

    pub fn attachments(&self) -> &AttachmentTracker {
        &self.tracker
    }

    pub fn voice(&self) -> &VoiceRecorder {
        &self.voice
    }

    pub fn voice_mut(&mut self) -> &mut VoiceRecorder {
        &mut self.voice
    }

    /// Send stays disabled while any upload is unresolved.
    pub fn can_send(&self) -> bool {
        !self.tracker.is_uploading()
    }

    pub async fn send(&mut self) -> AppResult<()> {
        if self.to.trim().is_empty() {
            return Err(AppError::Validation("recipient is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::Validation("subject is required".to_string()));
        }
        if !self.can_send() {
            return Err(AppError::Validation(
                "wait for attachments to finish uploading".to_string(),
            ));
        }

        let mut message = self.outgoing();
        if let Some(recording) = self.voice.recording() {
            message.attachments.push(recording.as_attachment());
        }

        tracing::debug!(
            attachments = message.attachments.len(),
            "sending composed message"
        );
        self.gateway.send(&message).await?;
        self.reset();
        Ok(())
    }

    /// Saves whatever has been written so far. Drafts carry confirmed uploads
    /// only; the voice message stays local.
    pub async fn save_draft(&self) -> AppResult<()> {
        if self.to.trim().is_empty()
            && self.subject.trim().is_empty()
            && self.body.trim().is_empty()
        {
            return Err(AppError::Validation("nothing to save as draft".to_string()));
        }

        self.gateway.save_draft(&self.outgoing()).await
    }

    /// Appends generated text to the body and returns the fragment.
    pub async fn generate(&mut self, instruction: &str, tone: Tone) -> AppResult<String> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(AppError::Validation(
                "describe the email you want to write".to_string(),
            ));
        }

        let fragment = self.gateway.generate(instruction, tone).await?;
        if self.body.is_empty() {
            self.body = fragment.clone();
        } else {
            self.body.push_str(GENERATED_SEPARATOR);
            self.body.push_str(&fragment);
        }
        self.cursor = self.body.len();
        Ok(fragment)
    }

    /// Abandons the session: fields are cleared, attachments discarded and
    /// the microphone released.
    pub fn reset(&mut self) {
        self.to.clear();
        self.cc.clear();
        self.bcc.clear();
        self.subject.clear();
        self.body.clear();
        self.cursor = 0;
        self.tracker.clear();
        self.voice.reset();
    }

    fn outgoing(&self) -> OutgoingMessage {
        OutgoingMessage {
            to: self.to.trim().to_string(),
            cc: non_blank(&self.cc),
            bcc: non_blank(&self.bcc),
            subject: self.subject.clone(),
            body: self.body.clone(),
            attachments: self
                .tracker
                .attachments()
                .into_iter()
                .map(OutgoingAttachment::Uploaded)
                .collect(),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
