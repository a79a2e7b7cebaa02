use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineSettings;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub fetch_timeout_secs: Option<u64>,
    pub metadata_timeout_secs: Option<u64>,
    pub yt_dlp_path: Option<String>,
    pub notion_parent_page_id: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        let defaults = PipelineSettings::default();
        PipelineSettings {
            yt_dlp_path: self.yt_dlp_path.clone().unwrap_or(defaults.yt_dlp_path),
            metadata_timeout: self
                .metadata_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.metadata_timeout),
            fetch_timeout: self
                .fetch_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}
