//! Configuration management for the inference service
//!
//! Settings are loaded from a JSON file at startup. Missing sections fall back
//! to defaults field by field, and a missing or unreadable file falls back to
//! the full default configuration so the service can always start.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default location of the model artifact directory
pub const DEFAULT_MODEL_DIR: &str = "models/cnn_lstm_multi_model_fixedmask";

/// Default config file consulted by the server binary
pub const DEFAULT_CONFIG_PATH: &str = "config/quake_detector.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
}

/// HTTP server parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Predictor artifact location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding `artifact.json` and the graph it names
    pub dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_MODEL_DIR),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file doesn't exist or
    /// the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Apply command-line overrides on top of the loaded file
    pub fn with_overrides(mut self, addr: Option<SocketAddr>, model_dir: Option<PathBuf>) -> Self {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        if let Some(dir) = model_dir {
            self.model.dir = dir;
        }
        self
    }
}
