use std::time::Duration;

use serde::Deserialize;

use crate::services::backend::SimulatedBackend;
use crate::services::engine::{EngineSettings, DEFAULT_MAX_FILE_BYTES};
use crate::services::progress::ProgressSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// File holding the persisted signed-in user.
    #[serde(default = "default_session_path")]
    pub session_path: String,

    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Interval between simulated progress ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Progress value ticks stop at; only completion reaches 100.
    #[serde(default = "default_progress_ceiling")]
    pub progress_ceiling: u8,

    #[serde(default = "default_image_progress_step")]
    pub image_progress_step: u8,

    #[serde(default = "default_audio_progress_step")]
    pub audio_progress_step: u8,

    /// Simulated OCR duration.
    #[serde(default = "default_image_processing_ms")]
    pub image_processing_ms: u64,

    /// Simulated speech-to-text duration.
    #[serde(default = "default_audio_processing_ms")]
    pub audio_processing_ms: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_session_path() -> String {
    "syncbridge_session.json".to_string()
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_tick_interval_ms() -> u64 {
    200
}

fn default_progress_ceiling() -> u8 {
    98
}

fn default_image_progress_step() -> u8 {
    5
}

fn default_audio_progress_step() -> u8 {
    3
}

fn default_image_processing_ms() -> u64 {
    3000
}

fn default_audio_processing_ms() -> u64 {
    4000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            session_path: default_session_path(),
            max_upload_bytes: default_max_upload_bytes(),
            tick_interval_ms: default_tick_interval_ms(),
            progress_ceiling: default_progress_ceiling(),
            image_progress_step: default_image_progress_step(),
            audio_progress_step: default_audio_progress_step(),
            image_processing_ms: default_image_processing_ms(),
            audio_processing_ms: default_audio_processing_ms(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if !(1..100).contains(&self.progress_ceiling) {
            return Err(ConfigError::Invalid(
                "progress_ceiling must be between 1 and 99".into(),
            ));
        }
        if self.image_progress_step == 0 || self.audio_progress_step == 0 {
            return Err(ConfigError::Invalid("progress steps must be positive".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be positive".into()));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            progress: ProgressSettings {
                tick_interval: Duration::from_millis(self.tick_interval_ms),
                ceiling: self.progress_ceiling,
                image_step: self.image_progress_step,
                audio_step: self.audio_progress_step,
            },
            max_file_bytes: self.max_upload_bytes,
        }
    }

    pub fn backend(&self) -> SimulatedBackend {
        SimulatedBackend::new(
            Duration::from_millis(self.image_processing_ms),
            Duration::from_millis(self.audio_processing_ms),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
