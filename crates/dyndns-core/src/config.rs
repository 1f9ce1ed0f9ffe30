//! Configuration types for the dynamic DNS updater
//!
//! All values come from environment variables. Loading goes through a lookup
//! function so tests never touch the process environment.

use crate::record::NameMatch;
use serde::{Deserialize, Serialize};

/// Default echo endpoint for the external IP lookup
pub const DEFAULT_EXTERNAL_IP_URL: &str = "http://checkip.amazonaws.com/";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DyndnsConfig {
    /// AWS region for the Route 53 client
    pub aws_region: String,

    /// Hosted zone identifier
    pub hosted_zone_id: String,

    /// Target record name
    pub record_name: String,

    /// Minimum log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Push notification credentials; `None` disables notifications
    #[serde(default)]
    pub pushover: Option<PushoverConfig>,

    /// External IP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Reject a selected record set that is not exactly the target
    #[serde(default)]
    pub require_exact_record_name: bool,

    /// Read real state but only log the upsert
    #[serde(default)]
    pub dry_run: bool,
}

impl DyndnsConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, then validate it
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| crate::Error::config(format!("environment variable {key} not set")))
        };

        let config = Self {
            aws_region: required("AWS_REGION")?,
            hosted_zone_id: required("HOSTED_ZONE_ID")?,
            record_name: required("RECORD_NAME")?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(default_log_level),
            pushover: PushoverConfig::from_lookup(&lookup),
            http: HttpConfig {
                url: lookup("EXTERNAL_IP_URL").unwrap_or_else(default_external_ip_url),
                timeout_secs: parse_or("HTTP_TIMEOUT_SECS", &lookup, default_timeout_secs())?,
                max_retries: parse_or("HTTP_MAX_RETRIES", &lookup, default_max_retries())?,
            },
            require_exact_record_name: parse_bool_or("REQUIRE_EXACT_RECORD_NAME", &lookup, false)?,
            dry_run: parse_bool_or("DRY_RUN", &lookup, false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.aws_region.trim().is_empty() {
            return Err(crate::Error::config("AWS_REGION cannot be empty"));
        }
        if self.hosted_zone_id.trim().is_empty() {
            return Err(crate::Error::config("HOSTED_ZONE_ID cannot be empty"));
        }
        if self.record_name.trim().is_empty() {
            return Err(crate::Error::config("RECORD_NAME cannot be empty"));
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(format!(
                    "LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                    self.log_level
                )));
            }
        }

        self.http.validate()
    }

    /// Record selection policy derived from `require_exact_record_name`
    pub fn name_match(&self) -> NameMatch {
        if self.require_exact_record_name {
            NameMatch::Exact
        } else {
            NameMatch::FirstReturned
        }
    }
}

/// External IP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Echo endpoint returning the caller's IP as plain text
    #[serde(default = "default_external_ip_url")]
    pub url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl HttpConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "EXTERNAL_IP_URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }

        if !(1..=300).contains(&self.timeout_secs) {
            return Err(crate::Error::config(format!(
                "HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.timeout_secs
            )));
        }

        if self.max_retries > 10 {
            return Err(crate::Error::config(format!(
                "HTTP_MAX_RETRIES must be between 0 and 10. Got: {}",
                self.max_retries
            )));
        }

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            url: default_external_ip_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Pushover credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct PushoverConfig {
    /// Application API token
    pub api_token: String,
    /// Recipient user key
    pub user_key: String,
}

impl PushoverConfig {
    /// Both credentials present and non-empty, or `None`
    fn from_lookup<F>(lookup: &F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("PUSHOVER_API_TOKEN").filter(|v| !v.is_empty());
        let user_key = lookup("PUSHOVER_USER_KEY").filter(|v| !v.is_empty());

        match (api_token, user_key) {
            (Some(api_token), Some(user_key)) => Some(Self { api_token, user_key }),
            _ => {
                tracing::debug!("Pushover credentials not provided, notifications will not be sent");
                None
            }
        }
    }
}

// Credentials never show up in logs
impl std::fmt::Debug for PushoverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverConfig")
            .field("api_token", &"<REDACTED>")
            .field("user_key", &"<REDACTED>")
            .finish()
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, crate::Error>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::config(format!("{key} is not a valid number: {raw:?}"))),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(key: &str, lookup: &F, default: bool) -> Result<bool, crate::Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(crate::Error::config(format!("{key} is not a valid boolean: {raw:?}"))),
        },
        None => Ok(default),
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_external_ip_url() -> String {
    DEFAULT_EXTERNAL_IP_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> usize {
    3
}
