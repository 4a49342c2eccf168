//! Application configuration loaded from `crawlwatch.ron`.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crawlwatch_core::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crawlwatch_engine::{EngineSettings, DEFAULT_BASE_URL};
use log::LevelFilter;
use serde::Deserialize;

use super::logging::LogDestination;

const CONFIG_FILENAME: &str = "crawlwatch.ron";
const CONFIG_ENV: &str = "CRAWLWATCH_CONFIG";
const BASE_URL_ENV: &str = "CRAWLWATCH_BASE_URL";
const API_KEY_ENV: &str = "CRAWLWATCH_API_KEY";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub page_size: u32,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub state_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            poll_interval_ms: 1000,
            page_size: DEFAULT_PAGE_SIZE,
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
            state_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Reads the config file if there is one, then applies environment
    /// overrides. A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        let mut config = match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).with_context(|| format!("parsing {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
                Self::default()
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        config.apply_overrides(
            std::env::var(BASE_URL_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        );
        Ok(config)
    }

    /// `page_size` is clamped to the range the list endpoint accepts.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config: Self = ron::from_str(text)?;
        config.page_size = config.page_size.clamp(1, MAX_PAGE_SIZE);
        Ok(config)
    }

    fn apply_overrides(&mut self, base_url: Option<String>, api_key: Option<String>) {
        if let Some(base_url) = base_url.filter(|value| !value.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
        if let Some(api_key) = api_key.filter(|value| !value.trim().is_empty()) {
            self.api_key = Some(api_key.trim().to_string());
        }
    }

    /// Unknown level names fall back to info.
    pub fn level(&self) -> LevelFilter {
        engine_logging::parse_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
