use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_BASE_URL;
use crate::error::{AppError, AppResult};
use crate::mailbox::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl Settings {
    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn page_size(&self) -> AppResult<u32> {
        match self.page_size {
            None => Ok(DEFAULT_PAGE_SIZE),
            Some(0) => Err(AppError::Config(
                "page_size in profile settings must be at least 1".to_string(),
            )),
            Some(size) => Ok(size),
        }
    }
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)?;
    serde_json::from_str(&raw).map_err(|err| {
        AppError::Config(format!("invalid settings file {}: {err}", path.display()))
    })
}

pub fn save(path: PathBuf, settings: &Settings) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(&path, payload)?;
    Ok(())
}
