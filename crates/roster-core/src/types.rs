// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application settings (frontend-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Base URL of the REST service (default: jsonplaceholder)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Users requested per page
    #[serde(default = "default_users_page_size")]
    pub users_page_size: u32,
    /// Posts requested per page
    #[serde(default = "default_posts_page_size")]
    pub posts_page_size: u32,
    /// Tasks requested per page
    #[serde(default = "default_tasks_page_size")]
    pub tasks_page_size: u32,
    /// Quiet period before a search is applied, in milliseconds
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Directory holding durable key-value data (favorites)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_api_base_url() -> String {
    "https://jsonplaceholder.typicode.com".to_string()
}

fn default_users_page_size() -> u32 {
    10
}

fn default_posts_page_size() -> u32 {
    10
}

fn default_tasks_page_size() -> u32 {
    30
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "roster", "roster")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            users_page_size: default_users_page_size(),
            posts_page_size: default_posts_page_size(),
            tasks_page_size: default_tasks_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            data_dir: default_data_dir(),
        }
    }
}

impl AppSettings {
    /// Check that the settings can drive a client and the list controllers
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(AppError::InvalidConfig(format!(
                "API base URL must be http(s): {}",
                self.api_base_url
            )));
        }

        for (name, size) in [
            ("usersPageSize", self.users_page_size),
            ("postsPageSize", self.posts_page_size),
            ("tasksPageSize", self.tasks_page_size),
        ] {
            if size == 0 {
                return Err(AppError::InvalidConfig(format!("{} must be positive", name)));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "requestTimeoutSecs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to {url} failed with status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
