use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A message as returned by the gateway. Identity is `id`; every other field
/// may be replaced by a server-confirmed update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub is_unread: bool,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub label_ids: BTreeSet<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentMeta>,
}

impl Message {
    pub fn subject_or_placeholder(&self) -> &str {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty())
            .unwrap_or("(no subject)")
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label_ids.contains(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub attachment_id: Option<String>,
}

/// Metadata the server issues for a file uploaded ahead of send/draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAttachment {
    #[serde(alias = "originalname", alias = "name")]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, alias = "mimetype")]
    pub mime_type: String,
    #[serde(alias = "path", alias = "reference")]
    pub id: String,
}

/// A file picked on the client, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            name,
            mime_type,
            data: data.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn from_path(path: &Path) -> AppResult<Self> {
        let data = fs::read(path)?;
        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("invalid attachment path: {}", path.display()))
            })?;

        Ok(Self::new(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// One attachment of an outgoing message. Pre-uploaded files travel as
/// metadata, anything else (the voice recording) as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingAttachment {
    Uploaded(UploadedAttachment),
    PendingBinary {
        data: Bytes,
        filename: String,
        mime_type: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    /// Rich text markup, passed through untouched.
    pub body: String,
    pub attachments: Vec<OutgoingAttachment>,
}

impl OutgoingMessage {
    pub fn uploaded_attachments(&self) -> Vec<&UploadedAttachment> {
        self.attachments
            .iter()
            .filter_map(|attachment| match attachment {
                OutgoingAttachment::Uploaded(meta) => Some(meta),
                OutgoingAttachment::PendingBinary { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    Star,
    Unstar,
    MarkRead,
    MarkUnread,
    Trash,
    Restore,
    PermanentDelete,
}

impl Mutation {
    pub fn describe(self) -> &'static str {
        match self {
            Mutation::Star => "star",
            Mutation::Unstar => "unstar",
            Mutation::MarkRead => "mark as read",
            Mutation::MarkUnread => "mark as unread",
            Mutation::Trash => "move to trash",
            Mutation::Restore => "restore",
            Mutation::PermanentDelete => "permanently delete",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Formal,
    Casual,
    Urgent,
}

impl Tone {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "friendly" => Ok(Tone::Friendly),
            "formal" => Ok(Tone::Formal),
            "casual" => Ok(Tone::Casual),
            "urgent" => Ok(Tone::Urgent),
            other => Err(AppError::InvalidInput(format!(
                "unknown tone `{other}`; expected professional, friendly, formal, casual or urgent"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub max_results: u32,
    pub page_token: Option<String>,
}

impl PageRequest {
    pub fn first(max_results: u32) -> Self {
        Self {
            max_results,
            page_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_message_summary_with_defaults() {
        let message: Message = serde_json::from_str(
            r#"{"id":"m1","subject":"hi","isUnread":true,"labelIds":["INBOX","UNREAD"]}"#,
        )
        .expect("message json");

        assert_eq!(message.id, "m1");
        assert!(message.is_unread);
        assert!(!message.is_starred);
        assert!(message.has_label("INBOX"));
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn guesses_mime_type_from_file_name() {
        let file = LocalFile::new("report.pdf", b"%PDF".to_vec());
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.size(), 4);
    }

    #[test]
    fn uploaded_attachment_accepts_path_alias() {
        let meta: UploadedAttachment = serde_json::from_str(
            r#"{"filename":"a.txt","size":3,"mimeType":"text/plain","path":"uploads/abc"}"#,
        )
        .expect("upload json");
        assert_eq!(meta.id, "uploads/abc");
    }

    #[test]
    fn blank_subject_uses_placeholder() {
        let message = Message {
            id: "m1".to_string(),
            subject: Some("  ".to_string()),
            ..Message::default()
        };
        assert_eq!(message.subject_or_placeholder(), "(no subject)");
    }
}
