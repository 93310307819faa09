//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MAX_UPLOAD_CHUNK_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_CHUNK_SIZE: u64 = 64 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "timedrop")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("timedrop.toml"))
}

fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "timedrop")
        .map(|p| p.data_dir().join("references.json"))
        .unwrap_or_else(|| PathBuf::from("references.json"))
}

/// Which backend artifact slot a session binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    #[default]
    Timetable,
    Exam,
}

/// Endpoint pair and storage key binding one session to one artifact slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointProfile {
    pub upload_url: String,
    pub delete_url: String,
    pub storage_key: String,
}

impl EndpointProfile {
    /// General timetable slot: `POST /upload`, `DELETE /delete`, key `pdfUrl`.
    pub fn timetable(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            upload_url: format!("{base}/upload"),
            delete_url: format!("{base}/delete"),
            storage_key: "pdfUrl".to_string(),
        }
    }

    /// Exam timetable slot: `POST /upload-exam`, `DELETE /delete-exam`, key `examPdfUrl`.
    pub fn exam_timetable(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            upload_url: format!("{base}/upload-exam"),
            delete_url: format!("{base}/delete-exam"),
            storage_key: "examPdfUrl".to_string(),
        }
    }
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend base URL, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Upload body chunk size in bytes (progress granularity)
    pub chunk_size: u64,
    /// Override for the reference store file location
    pub store_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            store_file: None,
        }
    }
}

impl AppConfig {
    /// Returns the endpoint profile for the selected slot.
    pub fn profile(&self, slot: Slot) -> EndpointProfile {
        match slot {
            Slot::Timetable => EndpointProfile::timetable(&self.base_url),
            Slot::Exam => EndpointProfile::exam_timetable(&self.base_url),
        }
    }

    /// Returns the reference store location, configured or platform default.
    pub fn store_path(&self) -> PathBuf {
        self.store_file.clone().unwrap_or_else(default_store_path)
    }

    /// Validates endpoint and transfer bounds and rejects unsafe values.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.base_url.starts_with("http://") || self.base_url.starts_with("https://"),
            "Invalid config: base_url must start with http:// or https://"
        );
        ensure!(
            self.timeout_secs >= 1 && self.timeout_secs <= MAX_TIMEOUT_SECS,
            "Invalid config: timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
        );
        ensure!(self.chunk_size > 0, "Invalid config: chunk_size must be > 0");
        ensure!(
            self.chunk_size <= MAX_UPLOAD_CHUNK_SIZE_BYTES,
            "Invalid config: chunk_size must be <= {MAX_UPLOAD_CHUNK_SIZE_BYTES}"
        );
        Ok(())
    }
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();

    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("TIMEDROP_"))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}
