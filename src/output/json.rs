use serde::Serialize;
use serde_json::json;

use crate::error::{AppError, AppResult};

pub fn print<T: Serialize>(value: &T) -> AppResult<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

/// Error envelope for `--json` callers: `{"error": {"kind", "message"}}`.
pub fn print_error(err: &AppError) -> AppResult<()> {
    print(&json!({
        "error": {
            "kind": err.kind(),
            "message": err.reason(),
        }
    }))
}
