//! Configuration types for ukg-bi

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};
use url::Url;

/// Default service root for UKG Pro web services
pub const DEFAULT_BASE_URL: &str = "https://service2.ultipro.com/services/";

/// Environment variable names read by [`Credentials::from_env`]
pub mod env_keys {
    /// Web service user name
    pub const USERNAME: &str = "UKG_USERNAME";
    /// Web service user password
    pub const PASSWORD: &str = "UKG_PASSWORD";
    /// Customer API key
    pub const CLIENT_ACCESS_KEY: &str = "UKG_CLIENT_ACCESS_KEY";
    /// Web service user API key
    pub const USER_ACCESS_KEY: &str = "UKG_USER_ACCESS_KEY";
    /// Service root URL (optional)
    pub const BASE_URL: &str = "UKG_BASE_URL";
}

/// Web service user credentials and service location
///
/// All five fields are required. [`Credentials::validate`] is checked before
/// any remote call is attempted.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Web service user name
    pub username: String,
    /// Web service user password
    pub password: String,
    /// Customer API key
    pub client_access_key: String,
    /// Web service user API key
    pub user_access_key: String,
    /// Service root, e.g. `https://service2.ultipro.com/services/`
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Credentials {
    /// Create credentials for the given service root
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_access_key: impl Into<String>,
        user_access_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_access_key: client_access_key.into(),
            user_access_key: user_access_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Load credentials from `UKG_*` environment variables
    ///
    /// `UKG_BASE_URL` is optional and defaults to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load credentials through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::config(key, format!("{key} is not set")))
        };

        let credentials = Self {
            username: required(env_keys::USERNAME)?,
            password: required(env_keys::PASSWORD)?,
            client_access_key: required(env_keys::CLIENT_ACCESS_KEY)?,
            user_access_key: required(env_keys::USER_ACCESS_KEY)?,
            base_url: lookup(env_keys::BASE_URL).unwrap_or_else(default_base_url),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Check that every field is present and the base URL is usable
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("username", &self.username),
            ("password", &self.password),
            ("client_access_key", &self.client_access_key),
            ("user_access_key", &self.user_access_key),
            ("base_url", &self.base_url),
        ];
        for (key, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::config(key, format!("{key} must not be empty")));
            }
        }

        self.service_root()?;
        Ok(())
    }

    /// Parsed service root, always ending in `/` so endpoint names can be joined
    pub fn service_root(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)
            .map_err(|e| Error::config("base_url", format!("invalid base_url: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::config(
                "base_url",
                format!("base_url {raw} cannot be used as a base"),
            ));
        }
        Ok(url)
    }
}

// Keep secrets out of logs and panic messages
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_access_key", &"<redacted>")
            .field("user_access_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Inner poll loop configuration (status checks for a single report job)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of status checks per job (default: 3)
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,

    /// Pause between status checks while the job is working (default: 60 seconds)
    #[serde(default = "default_poll_pause", with = "duration_serde")]
    pub pause: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_poll_attempts(),
            pause: default_poll_pause(),
        }
    }
}

/// Outer retry configuration (re-runs logon, submit and poll as a unit)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first (default: 3)
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,

    /// Delay before the next attempt (default: 5 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,

    /// Upper bound on the delay once backoff is applied (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each failure (default: 1.0, fixed delay)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            delay: default_retry_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Main configuration for [`ReportClient`](crate::ReportClient)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Service credentials
    pub credentials: Credentials,

    /// Field delimiter requested from the service (default: '|')
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Inner poll loop settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Outer retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Report name to full report path mapping
    #[serde(default)]
    pub reports: HashMap<String, String>,

    /// Timeout for a single HTTP request (default: 300 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Config {
    /// Create a configuration with defaults for everything but credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            delimiter: default_delimiter(),
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
            reports: HashMap::new(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Add a named report path to the mapping
    pub fn with_report(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.reports.insert(name.into(), path.into());
        self
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;

        if matches!(self.delimiter, '\r' | '\n') {
            return Err(Error::config(
                "delimiter",
                "delimiter must not be a line break character",
            ));
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::config(
                "poll.max_attempts",
                "poll.max_attempts must be at least 1",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "retry.max_attempts",
                "retry.max_attempts must be at least 1",
            ));
        }
        if !(self.retry.backoff_multiplier.is_finite() && self.retry.backoff_multiplier >= 1.0) {
            return Err(Error::config(
                "retry.backoff_multiplier",
                "retry.backoff_multiplier must be a finite number >= 1.0",
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_delimiter() -> char {
    '|'
}

fn default_poll_attempts() -> u32 {
    3
}

fn default_poll_pause() -> Duration {
    Duration::from_secs(60)
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
