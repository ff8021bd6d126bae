//! Configuration types for httptape

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{Result, TapeError};

/// Environment variable that both enables the transport and selects its mode
pub const MODE_ENV: &str = "HTTPTAPE_MODE";
/// Environment variable overriding the cassette directory
pub const CASSETTE_DIR_ENV: &str = "HTTPTAPE_CASSETTE_DIR";

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Transport disabled: every call passes through to the live transport
    Off,
    /// Record live traffic to cassettes, then return the live response
    Record,
    /// Serve responses from cassettes; never touch the network
    Playback,
    /// Record if the cassette file does not exist yet, otherwise play back
    RecordOnce,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::Record => "record",
            Self::Playback => "playback",
            Self::RecordOnce => "record_once",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = TapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "off" => Ok(Self::Off),
            "record" => Ok(Self::Record),
            "playback" => Ok(Self::Playback),
            "record_once" => Ok(Self::RecordOnce),
            other => Err(TapeError::ConfigError(format!("unknown mode: {other}"))),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VcrConfig {
    /// Master switch; when false every call passes through untouched
    pub enabled: bool,
    /// Operating mode
    pub mode: Mode,
    /// Directory cassette files live in
    pub cassette_dir: PathBuf,
    /// Force a specific cassette file instead of deriving one per request
    pub cassette_name: Option<String>,
    /// Redact sensitive header values before persistence
    pub sanitize_headers: bool,
    /// Exclude sensitive query parameters from naming and matching
    pub sanitize_params: bool,
    /// Case-insensitive substrings marking a header name as sensitive
    pub redact_headers: Vec<String>,
    /// Case-insensitive substrings marking a query parameter as sensitive
    pub redact_params: Vec<String>,
    /// Require method equality during playback matching
    pub match_method: bool,
    /// Require URL path equality during playback matching
    pub match_uri: bool,
    /// Require non-sensitive query set equality during playback matching
    pub match_query: bool,
    /// Require recorded non-sensitive headers to match during playback
    pub match_headers: bool,
    /// Require exact body equality during playback matching
    pub match_body: bool,
}

impl Default for VcrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: Mode::Off,
            cassette_dir: PathBuf::from("cassettes"),
            cassette_name: None,
            sanitize_headers: true,
            sanitize_params: true,
            redact_headers: vec![
                "authorization".to_string(),
                "cookie".to_string(),
                "x-api-key".to_string(),
                "token".to_string(),
            ],
            redact_params: vec![
                "api_key".to_string(),
                "token".to_string(),
                "password".to_string(),
                "secret".to_string(),
            ],
            match_method: true,
            match_uri: true,
            match_query: false,
            match_headers: false,
            match_body: false,
        }
    }
}

impl VcrConfig {
    /// Build configuration from the environment.
    ///
    /// [`MODE_ENV`] both enables the transport and selects its mode; unset,
    /// empty, or `off` means disabled and returns `None`. An unrecognized
    /// value is logged and degrades to disabled rather than failing the
    /// caller. [`CASSETTE_DIR_ENV`] overrides the cassette directory.
    pub fn from_env() -> Option<Self> {
        let raw = std::env::var(MODE_ENV).unwrap_or_default();
        if raw.is_empty() || raw == "off" {
            return None;
        }

        let mode = match raw.parse::<Mode>() {
            Ok(mode) => mode,
            Err(e) => {
                error!("{e}, falling back to live pass-through");
                return None;
            }
        };

        let mut config = Self {
            enabled: true,
            mode,
            ..Self::default()
        };

        if let Ok(dir) = std::env::var(CASSETTE_DIR_ENV) {
            if !dir.is_empty() {
                config.cassette_dir = PathBuf::from(dir);
            }
        }

        Some(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TapeError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TapeError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cassette_dir.as_os_str().is_empty() {
            return Err(TapeError::ConfigError(
                "cassette_dir cannot be empty".to_string(),
            ));
        }

        if let Some(name) = &self.cassette_name {
            if name.is_empty() {
                return Err(TapeError::ConfigError(
                    "cassette_name cannot be empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }
}
