use std::fmt;

use crate::error::{AppError, AppResult};

/// One named slice of the mailbox. Exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    Inbox,
    Sent,
    Drafts,
    Trash,
    Starred,
    Search(String),
}

impl View {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(View::Inbox),
            "sent" => Ok(View::Sent),
            "drafts" => Ok(View::Drafts),
            "trash" => Ok(View::Trash),
            "starred" => Ok(View::Starred),
            other => Err(AppError::InvalidInput(format!(
                "unknown view `{other}`; expected inbox, sent, drafts, trash or starred"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::Inbox => "inbox",
            View::Sent => "sent",
            View::Drafts => "drafts",
            View::Trash => "trash",
            View::Starred => "starred",
            View::Search(_) => "search",
        }
    }

    pub fn is_trash(&self) -> bool {
        matches!(self, View::Trash)
    }

    pub fn is_starred(&self) -> bool {
        matches!(self, View::Starred)
    }

    pub fn empty_notice(&self) -> &'static str {
        match self {
            View::Inbox => "Your inbox is empty",
            View::Sent => "No sent messages",
            View::Trash => "Trash is empty",
            View::Starred => "No starred messages",
            View::Drafts | View::Search(_) => "No messages found",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Search(query) => write!(f, "search \"{query}\""),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_names_case_insensitively() {
        assert_eq!(View::parse("Trash").expect("trash"), View::Trash);
        assert_eq!(View::parse(" starred ").expect("starred"), View::Starred);
    }

    #[test]
    fn rejects_unknown_view() {
        assert!(matches!(View::parse("spam"), Err(AppError::InvalidInput(_))));
    }
}
