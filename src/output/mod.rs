pub mod json;
pub mod text;

use serde::Serialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(json: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Prints `text_line` in text mode, `json_value` in JSON mode.
    pub fn emit<T: Serialize>(&self, text_line: &str, json_value: &T) -> AppResult<()> {
        match self.mode {
            OutputMode::Text => text::print_line(text_line),
            OutputMode::Json => json::print(json_value),
        }
    }

    /// JSON callers get failures on stdout as well; text mode leaves them to
    /// the caller's stderr line.
    pub fn report_error(&self, err: &AppError) -> AppResult<()> {
        match self.mode {
            OutputMode::Text => Ok(()),
            OutputMode::Json => json::print_error(err),
        }
    }
}
