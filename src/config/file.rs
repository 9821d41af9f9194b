//! TOML configuration file loading
//!
//! Supports `~/.config/nevira/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::persona::Persona;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NeviraConfigFile {
    /// Assistant name, honorific and phrasing
    #[serde(default)]
    pub persona: Option<Persona>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Session lifecycle
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Action execution limits
    #[serde(default)]
    pub actions: ActionsFileConfig,

    /// Outgoing mail
    #[serde(default)]
    pub email: EmailFileConfig,

    /// Screenshot output
    #[serde(default)]
    pub screenshot: ScreenshotFileConfig,

    /// Weather lookups
    #[serde(default)]
    pub weather: WeatherFileConfig,

    /// Web search
    #[serde(default)]
    pub search: SearchFileConfig,

    /// Per-day timetable overrides, keyed by lowercase day name
    #[serde(default)]
    pub schedule: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Bearer key required on `/api/*`
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Seconds between the farewell and process exit
    pub grace_secs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionsFileConfig {
    /// Per-action time limit in seconds; 0 disables it
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailFileConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScreenshotFileConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherFileConfig {
    /// Base URL of a wttr.in compatible service
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchFileConfig {
    /// Brave Search key; DuckDuckGo is used without one
    pub brave_api_key: Option<String>,
}

/// Load the TOML config file from `path`, or from the standard path
///
/// Returns `NeviraConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> NeviraConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return NeviraConfigFile::default();
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return NeviraConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NeviraConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NeviraConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/nevira/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("nevira").join("config.toml"))
}
