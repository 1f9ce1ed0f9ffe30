// # HTTP IP Source
//
// Resolves the caller's public IP by asking a plain-text echo service
// (default: http://checkip.amazonaws.com/).
//
// ## Behavior
//
// - One GET per call, no caching: the updater runs once per process
// - Per-request timeout from `HTTP_TIMEOUT_SECS`
// - Connection errors, timeouts, 429 and 5xx answers are retried up to
//   `HTTP_MAX_RETRIES` times with doubling backoff (100ms, capped at 2s)
// - Any other non-success status fails immediately
// - The body is trimmed and must be a bare IP literal

use dyndns_core::config::HttpConfig;
use dyndns_core::traits::IpSource;
use dyndns_core::{Error, IpAddress, Result, is_valid_ip_address};

use std::time::Duration;

use reqwest::StatusCode;

/// First retry delay; doubles on every further attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Upper bound for a single retry delay
const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

const USER_AGENT: &str = concat!("dyndns-route53/", env!("CARGO_PKG_VERSION"));

/// A failed attempt, tagged with whether another attempt may help
enum Attempt {
    Transient(Error),
    Permanent(Error),
}

/// HTTP echo-service IP source
pub struct HttpIpSource {
    /// URL returning the caller's IP as plain text
    url: String,

    /// Retries after the first attempt
    max_retries: usize,

    /// First retry delay
    retry_base_delay: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source from the transport configuration
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: config.url.clone(),
            max_retries: config.max_retries,
            retry_base_delay: RETRY_BASE_DELAY,
            client,
        })
    }

    /// Create a source for `url` with default timeout and retries
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        Self::new(&HttpConfig {
            url: url.into(),
            ..HttpConfig::default()
        })
    }

    /// Override the number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the first retry delay
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_ip(&self) -> Result<IpAddress> {
        let mut attempt = 0;

        loop {
            match self.fetch_once().await {
                Ok(ip) => return Ok(ip),
                Err(Attempt::Permanent(e)) => return Err(e),
                Err(Attempt::Transient(e)) if attempt >= self.max_retries => return Err(e),
                Err(Attempt::Transient(e)) => {
                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    tracing::warn!(
                        url = %self.url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "External IP lookup failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_once(&self) -> std::result::Result<IpAddress, Attempt> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            let err = Error::transport(format!("request to {} failed: {}", self.url, e));
            if e.is_timeout() || e.is_connect() {
                Attempt::Transient(err)
            } else {
                Attempt::Permanent(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = Error::transport(format!("unexpected HTTP status {} from {}", status, self.url));
            return Err(if is_retryable_status(status) {
                Attempt::Transient(err)
            } else {
                Attempt::Permanent(err)
            });
        }

        let body = response.text().await.map_err(|e| {
            let err = Error::transport(format!("failed to read response from {}: {}", self.url, e));
            if e.is_timeout() {
                Attempt::Transient(err)
            } else {
                Attempt::Permanent(err)
            }
        })?;

        parse_body(&body).map_err(Attempt::Permanent)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddress> {
        let ip = self.fetch_ip().await?;
        tracing::debug!(url = %self.url, ip_address = %ip, "Fetched external IP");
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

fn parse_body(body: &str) -> Result<IpAddress> {
    let candidate = body.trim();
    if !is_valid_ip_address(candidate) {
        return Err(Error::validation(format!(
            "retrieved value is not a valid IP address: {candidate}"
        )));
    }
    IpAddress::parse(candidate)
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    let factor = 1u32 << attempt.min(16);
    base.saturating_mul(factor).min(RETRY_MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> HttpIpSource {
        HttpIpSource::with_url(format!("{}/", server.uri()))
            .expect("client builds")
            .with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn trims_the_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
            .expect(1)
            .mount(&server)
            .await;

        let ip = source(&server).current().await.expect("lookup succeeds");
        assert_eq!(ip.as_str(), "203.0.113.7");
    }

    #[tokio::test]
    async fn returns_ipv6_literals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("2001:db8::1"))
            .mount(&server)
            .await;

        let ip = source(&server).current().await.expect("lookup succeeds");
        assert!(ip.is_ipv6());
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = source(&server)
            .with_max_retries(2)
            .current()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[tokio::test]
    async fn retry_recovers_from_a_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.4"))
            .expect(1)
            .mount(&server)
            .await;

        let ip = source(&server).current().await.expect("second attempt succeeds");
        assert_eq!(ip.as_str(), "198.51.100.4");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = source(&server).current().await.unwrap_err();
        assert!(err.to_string().contains("404"), "got: {err}");
    }

    #[tokio::test]
    async fn non_ip_body_is_a_validation_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = source(&server).current().await.unwrap_err();
        assert_eq!(
            err,
            Error::validation("retrieved value is not a valid IP address: <html>blocked</html>")
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let source = HttpIpSource::with_url("http://127.0.0.1:1/")
            .expect("client builds")
            .with_max_retries(0);

        let err = source.current().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        assert_eq!(backoff_delay(RETRY_BASE_DELAY, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(RETRY_BASE_DELAY, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(RETRY_BASE_DELAY, 3), Duration::from_millis(800));
        assert_eq!(backoff_delay(RETRY_BASE_DELAY, 5), RETRY_MAX_DELAY);
        assert_eq!(backoff_delay(RETRY_BASE_DELAY, 40), RETRY_MAX_DELAY);
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(matches!(parse_body("  \n"), Err(Error::Validation(_))));
    }
}
