//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use crate::audio::AMBIENCE_VOLUME;
use crate::controller::{SelectionOverrides, DEFAULT_PLACEHOLDER_DELAY};

pub const DEFAULT_API_BASE_URL: &str = "https://tadabbur-be.eng-sharjeel-baig.workers.dev";

#[derive(Parser, Debug, Clone)]
#[command(name = "tadabbur-rs")]
#[command(about = "Listen to the Quran verse by verse, with translation and rain ambience")]
#[command(version)]
pub struct Config {
    /// Base URL of the content API
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "TADABBUR_API_BASE_URL")]
    pub api_base_url: String,

    /// Looping ambience track (file path or URL)
    #[arg(long, default_value = "sounds/rain.mp3", env = "TADABBUR_AMBIENCE")]
    pub ambience: String,

    /// Ambience volume while enabled, between 0 and 1
    #[arg(long, default_value_t = AMBIENCE_VOLUME)]
    pub ambience_volume: f32,

    /// How long a verse without recitation audio stays on screen
    #[arg(long, default_value_t = DEFAULT_PLACEHOLDER_DELAY.as_millis() as u64)]
    pub missing_audio_delay_ms: u64,

    /// Directory for daily log files
    #[arg(long, default_value = ".logs", env = "TADABBUR_LOG_DIR")]
    pub log_dir: PathBuf,

    /// Directory for remembered selections
    #[arg(long, default_value = ".cache", env = "TADABBUR_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Reciter id to start with, overriding the remembered one
    #[arg(long, env = "TADABBUR_RECITER")]
    pub reciter: Option<u32>,

    /// Translation id to start with, overriding the remembered one
    #[arg(long, env = "TADABBUR_TRANSLATION")]
    pub translation: Option<u32>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 20, env = "TADABBUR_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            bail!("API base URL must not be empty");
        }
        if self.http_timeout_secs == 0 {
            bail!("HTTP timeout must be at least one second");
        }
        if !(0.0..=1.0).contains(&self.ambience_volume) {
            bail!("Ambience volume must be between 0 and 1, got {}", self.ambience_volume);
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn missing_audio_delay(&self) -> Duration {
        Duration::from_millis(self.missing_audio_delay_ms)
    }

    pub fn overrides(&self) -> SelectionOverrides {
        SelectionOverrides {
            reciter_id: self.reciter,
            translation_id: self.translation,
        }
    }
}
