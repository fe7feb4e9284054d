pub mod store;

pub use store::{FileSessionStore, SessionStore};

use serde::{Deserialize, Serialize};

/// Bearer credentials for the mail backend, issued by the login flow of the
/// web client and handed to this tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            email: None,
        }
    }

    /// Token with the middle elided, for status output.
    pub fn masked_token(&self) -> String {
        let token = self.access_token.as_str();
        let chars = token.chars().count();
        if chars <= 8 {
            return "*".repeat(chars);
        }

        let head = token.chars().take(4).collect::<String>();
        let tail = token.chars().skip(chars - 4).collect::<String>();
        format!("{head}...{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_the_ends() {
        assert_eq!(Session::new("abcdefghijkl").masked_token(), "abcd...ijkl");
        assert_eq!(Session::new("short").masked_token(), "*****");
    }
}
