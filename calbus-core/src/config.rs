//! calbus configuration.
//!
//! Loaded from `~/.config/calbus/config.toml` and layered with `CALBUS_*`
//! environment variables (`CALBUS_MQTT__HOST=broker` sets `mqtt.host`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_GOOGLE_API_BASE, DEFAULT_MAX_UPCOMING,
    DEFAULT_NO_EVENTS_TEXT, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_TICK_INTERVAL_MS,
    DEFAULT_TOPIC_PREFIX, DEFAULT_UPCOMING_DAYS, MAX_FETCH_TIMEOUT_SECS, MAX_UPCOMING_DAYS,
    MIN_FETCH_TIMEOUT_SECS,
};
use crate::error::{CalBusError, CalBusResult};
use crate::format::RelativeStyle;

const ENV_PREFIX: &str = "CALBUS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalBusConfig {
    /// Seconds between source fetches
    pub refresh_interval_secs: u64,
    /// Control loop granularity in milliseconds
    pub tick_interval_ms: u64,
    pub fetch_timeout_secs: u64,
    /// How many days ahead "upcoming" reaches
    pub upcoming_days: i64,
    pub max_upcoming: usize,
    pub relative_style: RelativeStyle,
    /// `today/list` value when there is nothing today
    pub no_events_text: String,
    pub mqtt: MqttConfig,
    pub source: Option<SourceConfig>,
}

impl Default for CalBusConfig {
    fn default() -> Self {
        CalBusConfig {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            upcoming_days: DEFAULT_UPCOMING_DAYS,
            max_upcoming: DEFAULT_MAX_UPCOMING,
            relative_style: RelativeStyle::default(),
            no_events_text: DEFAULT_NO_EVENTS_TEXT.to_string(),
            mqtt: MqttConfig::default(),
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Prepended to every topic: `{topic_prefix}/next/title`
    pub topic_prefix: String,
    pub keep_alive_secs: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        MqttConfig {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "calbus".to_string(),
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            keep_alive_secs: 60,
            username: None,
            password: None,
        }
    }
}

/// The upstream events come from, selected by `provider`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum SourceConfig {
    Google(GoogleSourceConfig),
    Caldav(CalDavSourceConfig),
    Ics(IcsSourceConfig),
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_api_base() -> String {
    DEFAULT_GOOGLE_API_BASE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleSourceConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// File holding the bearer token, kept fresh by an external tool
    pub token_file: Option<PathBuf>,
    pub access_token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalDavSourceConfig {
    /// Calendar collection URL
    pub url: String,
    pub username: String,
    pub password: Option<String>,
    pub password_file: Option<PathBuf>,
}

impl CalDavSourceConfig {
    pub fn resolve_password(&self) -> CalBusResult<String> {
        resolve_secret(&self.password, &self.password_file, "caldav password")
            .map_err(credential_error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcsSourceConfig {
    pub url: Option<String>,
    /// File holding a secret feed URL
    pub url_file: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl IcsSourceConfig {
    pub fn resolve_url(&self) -> CalBusResult<String> {
        resolve_secret(&self.url, &self.url_file, "ics feed url")
    }
}

impl CalBusConfig {
    /// Load from `path` (or the default location) plus `CALBUS_*` variables.
    ///
    /// A missing file is fine: defaults and environment still apply.
    pub fn load(path: Option<&Path>) -> CalBusResult<Self> {
        let path = match path {
            Some(p) => expand_path(p),
            None => Self::config_path()?,
        };
        Self::load_from(&path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_from(path: &Path, environment: Environment) -> CalBusResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(environment)
            .build()
            .map_err(|e| CalBusError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalBusError::Config(e.to_string()))
    }

    pub fn config_path() -> CalBusResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalBusError::Config("Could not determine config directory".into()))?
            .join("calbus");

        Ok(config_dir.join("config.toml"))
    }

    /// Create a default config file with every option commented out.
    pub fn create_default_config(path: &Path) -> CalBusResult<()> {
        let contents = format!(
            "\
# calbus configuration

# Seconds between calendar fetches:
# refresh_interval_secs = {DEFAULT_REFRESH_INTERVAL_SECS}

# Upstream request timeout (10-30 seconds):
# fetch_timeout_secs = {DEFAULT_FETCH_TIMEOUT_SECS}

# How far ahead to look for the next event, and how many to keep:
# upcoming_days = {DEFAULT_UPCOMING_DAYS}
# max_upcoming = {DEFAULT_MAX_UPCOMING}

# \"tiered\" (in 2h 30m, 09:30 tomorrow) or \"simple\" (in 2h, in 3d):
# relative_style = \"tiered\"

# no_events_text = \"{DEFAULT_NO_EVENTS_TEXT}\"

[mqtt]
# host = \"localhost\"
# port = 1883
# topic_prefix = \"{DEFAULT_TOPIC_PREFIX}\"
# username = \"\"
# password = \"\"

# Pick one source:

# [source]
# provider = \"ics\"
# url = \"https://calendar.example.com/feed.ics\"

# [source]
# provider = \"caldav\"
# url = \"https://caldav.example.com/calendars/me/personal/\"
# username = \"me\"
# password_file = \"~/.config/calbus/caldav-password\"

# [source]
# provider = \"google\"
# calendar_id = \"primary\"
# token_file = \"~/.config/calbus/google-token.json\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalBusError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalBusError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The configured source, or a configuration error when there is none.
    pub fn source(&self) -> CalBusResult<&SourceConfig> {
        self.source
            .as_ref()
            .ok_or_else(|| CalBusError::Config("No [source] configured".into()))
    }

    /// Check everything needed before the loop starts.
    pub fn validate(&self) -> CalBusResult<()> {
        if self.refresh_interval_secs == 0 {
            return Err(CalBusError::Config(
                "refresh_interval_secs must be positive".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(CalBusError::Config("tick_interval_ms must be positive".into()));
        }
        if !(1..=MAX_UPCOMING_DAYS).contains(&self.upcoming_days) {
            return Err(CalBusError::Config(format!(
                "upcoming_days must be between 1 and {MAX_UPCOMING_DAYS}"
            )));
        }

        match self.source()? {
            SourceConfig::Google(google) => {
                match (&google.token_file, &google.access_token) {
                    (Some(path), _) if !expand_path(path).exists() => Err(
                        CalBusError::Credentials(format!(
                            "Token file {} does not exist",
                            path.display()
                        )),
                    ),
                    (None, None) => Err(CalBusError::Credentials(
                        "Google source needs token_file or access_token".into(),
                    )),
                    _ => Ok(()),
                }
            }
            SourceConfig::Caldav(caldav) => {
                if caldav.url.trim().is_empty() {
                    return Err(CalBusError::Config("CalDAV source needs a url".into()));
                }
                if caldav.username.trim().is_empty() {
                    return Err(CalBusError::Credentials(
                        "CalDAV source needs a username".into(),
                    ));
                }
                caldav.resolve_password().map(|_| ())
            }
            SourceConfig::Ics(ics) => ics.resolve_url().map(|_| ()),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Request timeout, clamped to the supported range.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(
            self.fetch_timeout_secs
                .clamp(MIN_FETCH_TIMEOUT_SECS, MAX_FETCH_TIMEOUT_SECS),
        )
    }

    /// The "upcoming" horizon, clamped to the supported range.
    pub fn horizon(&self) -> TimeDelta {
        TimeDelta::days(self.upcoming_days.clamp(1, MAX_UPCOMING_DAYS))
    }
}

/// Expand `~` and environment variables in a configured path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).into_owned()),
    }
}

/// Read a secret stored in a file, trimmed.
pub fn read_secret_file(path: &Path) -> CalBusResult<String> {
    let path = expand_path(path);
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        CalBusError::Config(format!("Could not read {}: {e}", path.display()))
    })?;
    let secret = contents.trim();
    if secret.is_empty() {
        return Err(CalBusError::Config(format!("{} is empty", path.display())));
    }
    Ok(secret.to_string())
}

/// Reclassify a config error raised while resolving a credential.
pub(crate) fn credential_error(err: CalBusError) -> CalBusError {
    match err {
        CalBusError::Config(msg) => CalBusError::Credentials(msg),
        other => other,
    }
}

fn resolve_secret(
    inline: &Option<String>,
    file: &Option<PathBuf>,
    what: &str,
) -> CalBusResult<String> {
    match (inline, file) {
        (Some(value), _) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        (_, Some(path)) => read_secret_file(path),
        _ => Err(CalBusError::Config(format!("No {what} configured"))),
    }
}
