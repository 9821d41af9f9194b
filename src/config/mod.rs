//! Configuration management for Nevira
//!
//! Resolution order is defaults, then the TOML file, then environment
//! variables. The environment is read through an injected lookup so the
//! overlay can be tested without touching the process environment.

pub mod file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Weekday;
use secrecy::SecretString;

use crate::persona::Persona;
use crate::session::DEFAULT_GRACE_DELAY;
use crate::{Error, Result};

pub use file::{NeviraConfigFile, config_file_path, load_config_file};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 18790;

/// Default per-action time limit
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default weather service
pub const DEFAULT_WEATHER_URL: &str = "https://wttr.in";

/// Gmail submission relay
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// STARTTLS submission port
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Nevira configuration
#[derive(Debug)]
pub struct Config {
    /// Assistant persona
    pub persona: Persona,

    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Wait between the farewell and process exit
    pub grace_delay: Duration,

    /// Per-action time limit; `None` disables it
    pub action_timeout: Option<Duration>,

    /// Outgoing mail
    pub email: EmailConfig,

    /// Where screenshots are written
    pub screenshot_dir: PathBuf,

    /// Base URL of the weather service
    pub weather_url: String,

    /// Brave Search key; DuckDuckGo is used when absent
    pub brave_api_key: Option<SecretString>,

    /// Timetable text replacing the built-in entry for a day
    pub schedule: HashMap<Weekday, String>,
}

/// HTTP API server configuration
#[derive(Debug)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Bearer key for `/api/*` (from `NEVIRA_API_KEY` env)
    pub api_key: Option<SecretString>,
}

/// SMTP settings for the email action
#[derive(Debug)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Account name, usually the Gmail address
    pub username: Option<String>,
    /// Gmail app password
    pub password: Option<SecretString>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            persona: Persona::default(),
            server: ServerConfig {
                port: DEFAULT_PORT,
                api_key: None,
            },
            grace_delay: DEFAULT_GRACE_DELAY,
            action_timeout: Some(DEFAULT_ACTION_TIMEOUT),
            email: EmailConfig {
                smtp_host: DEFAULT_SMTP_HOST.to_string(),
                smtp_port: DEFAULT_SMTP_PORT,
                username: None,
                password: None,
            },
            screenshot_dir: default_screenshot_dir(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            brave_api_key: None,
            schedule: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and the process environment
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(load_config_file(path), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for schedule entries that do not name a day
    /// or a negative grace delay
    pub fn from_sources(fc: NeviraConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Server config (env > toml > default)
        let server = ServerConfig {
            port: parsed(&env, "NEVIRA_PORT")
                .or_else(|| parsed(&env, "PORT"))
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            api_key: env("NEVIRA_API_KEY")
                .or(fc.server.api_key)
                .map(SecretString::from),
        };

        let grace_secs = parsed::<f64>(&env, "NEVIRA_GRACE_SECS").or(fc.session.grace_secs);
        // Passed through unclamped; the session controller caps it and warns
        let grace_delay = match grace_secs {
            None => defaults.grace_delay,
            Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| {
                Error::Config(format!(
                    "grace delay must be a non-negative number of seconds, got {secs}"
                ))
            })?,
        };

        let action_timeout = match parsed::<u64>(&env, "NEVIRA_ACTION_TIMEOUT_SECS")
            .or(fc.actions.timeout_secs)
        {
            None => defaults.action_timeout,
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let email = EmailConfig {
            smtp_host: env("NEVIRA_SMTP_HOST")
                .or(fc.email.smtp_host)
                .unwrap_or(defaults.email.smtp_host),
            smtp_port: parsed(&env, "NEVIRA_SMTP_PORT")
                .or(fc.email.smtp_port)
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: env("GMAIL_USER").or(fc.email.username),
            password: env("GMAIL_APP_PASSWORD")
                .or(fc.email.password)
                .map(SecretString::from),
        };

        let mut schedule = HashMap::new();
        for (day, text) in fc.schedule {
            let weekday = day.parse::<Weekday>().map_err(|_| {
                Error::Config(format!("schedule entry '{day}' is not a day of the week"))
            })?;
            schedule.insert(weekday, text);
        }

        Ok(Self {
            persona: fc.persona.unwrap_or(defaults.persona),
            server,
            grace_delay,
            action_timeout,
            email,
            screenshot_dir: env("NEVIRA_SCREENSHOT_DIR")
                .map(PathBuf::from)
                .or(fc.screenshot.dir)
                .unwrap_or(defaults.screenshot_dir),
            weather_url: env("NEVIRA_WEATHER_URL")
                .or(fc.weather.url)
                .unwrap_or(defaults.weather_url),
            brave_api_key: env("NEVIRA_BRAVE_API_KEY")
                .or(fc.search.brave_api_key)
                .map(SecretString::from),
            schedule,
        })
    }
}

/// Parse an environment value, ignoring (with a warning) values that don't parse
fn parsed<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

/// `~/Pictures/Screenshots`, falling back to the working directory
fn default_screenshot_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| {
            dirs.picture_dir()
                .map(Path::to_path_buf)
                .or_else(|| Some(dirs.home_dir().join("Pictures")))
        })
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Screenshots")
}
