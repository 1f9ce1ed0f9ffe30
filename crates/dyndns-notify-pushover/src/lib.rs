// # Pushover Notifier
//
// Sends a push message through the Pushover API after a record update.
//
// ## API Reference
//
// - Send message: POST `https://api.pushover.net/1/messages.json`
//   (form-encoded `token`, `user`, `title`, `message`)
// - Answers `{"status": 1, "request": "..."}` on success and
//   `{"status": 0, "errors": [...]}` otherwise
//
// ## Security Requirements
//
// - Token and user key NEVER appear in logs or error messages

use async_trait::async_trait;
use dyndns_core::config::PushoverConfig;
use dyndns_core::traits::Notifier;
use dyndns_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Pushover message endpoint
const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const MESSAGE_TITLE: &str = "DNS record updated";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: i64,
    #[serde(default)]
    errors: Vec<String>,
}

pub struct PushoverNotifier {
    /// ⚠️ NEVER log this value
    api_token: String,

    /// ⚠️ NEVER log this value
    user_key: String,

    /// Message endpoint (overridable for tests)
    api_url: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverNotifier")
            .field("api_token", &"<REDACTED>")
            .field("user_key", &"<REDACTED>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl PushoverNotifier {
    /// Create a notifier from configured credentials
    pub fn new(config: &PushoverConfig) -> Result<Self> {
        if config.api_token.is_empty() || config.user_key.is_empty() {
            return Err(Error::config("Pushover API token and user key are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token: config.api_token.clone(),
            user_key: config.user_key.clone(),
            api_url: PUSHOVER_API_URL.to_string(),
            client,
        })
    }

    /// Send messages to `api_url` instead of the public endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Message body announcing an updated record
pub fn update_message(record_name: &str) -> String {
    format!("AWS Route53 DNS record updated for: {record_name}")
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify_record_updated(&self, record_name: &str) -> Result<()> {
        let message = update_message(record_name);
        let form = [
            ("token", self.api_token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", MESSAGE_TITLE),
            ("message", message.as_str()),
        ];

        // reqwest errors carry the URL only, never the form body
        let response = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::notification(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::notification(format!("failed to read response: {e}")))?;
        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();

        if !status.is_success() {
            let detail = parsed
                .map(|r| r.errors.join("; "))
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| status.to_string());
            return Err(Error::notification(format!(
                "Pushover rejected message ({status}): {detail}"
            )));
        }

        match parsed {
            Some(ApiResponse { status: 1, .. }) => {
                tracing::debug!(record_name, "Pushover message accepted");
                Ok(())
            }
            Some(ApiResponse { errors, .. }) => Err(Error::notification(format!(
                "Pushover rejected message: {}",
                errors.join("; ")
            ))),
            None => Err(Error::notification(format!(
                "unexpected Pushover response: {body}"
            ))),
        }
    }

    fn notifier_name(&self) -> &'static str {
        "pushover"
    }
}
