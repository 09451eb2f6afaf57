//! Defensive request wrapper for the Congress.gov API.
//!
//! This module provides a trait-based HTTP client that performs exactly one
//! logical upstream call per [`RequestSpec`]. The trait abstraction enables:
//!
//! - Easy mocking in unit tests
//! - HTTP-level testing with `MockHttpServer` in integration tests
//! - Swapping implementations (e.g., a different API provider)
//!
//! Every call is sanitized, bounded by a per-endpoint timeout and retried on
//! transient failures (timeouts, transport errors, 5xx, honourable 429s) with
//! exponential backoff. All failures come back as a [`CongressError`].
//!
//! Dropping the returned future aborts the in-flight request; nothing is
//! cached or reused afterwards.
//!
//! # Example
//!
//! ```ignore
//! use congress_mcp::congress::{CongressApiClient, HttpCongressClient, RequestContext, RequestSpec};
//!
//! let client = HttpCongressClient::new("https://api.congress.gov/v3", "my-api-key");
//! let spec = RequestSpec::new("/member/A000360");
//! let payload = client.execute(&spec, &RequestContext::default()).await?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;

use super::error::{CongressError, ResourceRef};
use super::resources::TimeoutClass;
use crate::config::{RequestConfig, UpstreamConfig};

/// Header carrying the upstream API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Exponential backoff between attempts of one logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Upper bound on attempts for any call, including the first. A
    /// [`RequestSpec`] may ask for fewer.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    /// Cap on a single delay, and on an honoured `Retry-After` hint.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RequestConfig::default())
    }
}

impl From<&RequestConfig> for RetryPolicy {
    fn from(config: &RequestConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.backoff_multiplier,
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_possible_wrap)] // attempt count won't exceed i32
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_backoff.as_secs_f64() {
            return self.max_backoff;
        }
        Duration::from_secs_f64(secs)
    }
}

/// Caller identity for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Overrides the client's configured key when present.
    pub api_key: Option<String>,
    /// Protocol session, used for log correlation only.
    pub session_id: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// One outbound call: resolved endpoint path, parameters, and its limits.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Resolved path below the base URL, e.g. `/bill/117/hr`.
    pub endpoint: String,
    /// Query parameters. `None` and blank values are never sent.
    pub params: BTreeMap<String, Option<String>>,
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Set for single-record lookups so a 404 becomes `NotFound`.
    pub resource: Option<ResourceRef>,
}

impl RequestSpec {
    /// A call with the configuration defaults for a standard endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let defaults = RequestConfig::default();
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
            timeout: defaults.timeout_for(TimeoutClass::Standard),
            max_attempts: defaults.max_attempts,
            resource: None,
        }
    }

    #[must_use]
    pub fn with_param<S: Into<String>>(mut self, name: impl Into<String>, value: Option<S>) -> Self {
        self.params.insert(name.into(), value.map(Into::into));
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource: ResourceRef) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Query pairs with absent and blank values stripped, plus `format=json`.
    #[must_use]
    pub fn sanitized_query(&self) -> Vec<(&str, &str)> {
        let mut query: Vec<(&str, &str)> = self
            .params
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.as_str(), v))
            })
            .filter(|(name, _)| *name != "format")
            .collect();
        query.push(("format", "json"));
        query
    }
}

/// Trait for Congress API operations.
///
/// Use `HttpCongressClient` for real HTTP calls, or
/// [`mock::MockCongressClient`] in tests.
#[async_trait]
pub trait CongressApiClient: Send + Sync {
    /// Perform one logical GET, returning the decoded body unchanged.
    async fn execute(&self, spec: &RequestSpec, ctx: &RequestContext)
        -> Result<Value, CongressError>;
}

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptFailure {
    Timeout(Duration),
    Transport(String),
    Status {
        status: StatusCode,
        body: String,
        retry_after: Option<Duration>,
    },
    Decode(String),
}

impl AttemptFailure {
    fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Decode(_) => false,
        }
    }

    const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    fn into_error(self, spec: &RequestSpec) -> CongressError {
        match self {
            Self::Timeout(elapsed) => CongressError::timeout(&spec.endpoint, elapsed),
            Self::Transport(message) => CongressError::server_error(None, message),
            Self::Status {
                status,
                retry_after,
                ..
            } if status == StatusCode::TOO_MANY_REQUESTS => {
                CongressError::rate_limited(retry_after)
            }
            Self::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                match spec.resource.clone() {
                    Some(resource) => CongressError::NotFound { resource },
                    None => CongressError::server_error(Some(status.as_u16()), "Not Found"),
                }
            }
            Self::Status { status, body, .. } => {
                CongressError::server_error(Some(status.as_u16()), upstream_message(&body))
            }
            Self::Decode(message) => CongressError::server_error(
                None,
                format!("the response body could not be decoded ({message})"),
            ),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(elapsed) => write!(f, "timed out after {elapsed:?}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Status { status, .. } => write!(f, "HTTP {status}"),
            Self::Decode(message) => write!(f, "decode error: {message}"),
        }
    }
}

/// Pull a readable message out of an upstream error body.
fn upstream_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .or_else(|| v.get("message"))
        })
        .and_then(Value::as_str)
        .map_or_else(
            || body.chars().take(200).collect(),
            std::string::ToString::to_string,
        )
}

/// `Retry-After` as delta-seconds. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// HTTP-based implementation of `CongressApiClient`.
///
/// The inner `reqwest::Client` owns the connection pool and is cheap to share
/// across concurrent invocations.
pub struct HttpCongressClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpCongressClient {
    /// Create a new client with the given base URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client with a custom `reqwest::Client` (for testing with custom config).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn from_config(
        upstream: &UpstreamConfig,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(upstream.user_agent.clone())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self::with_client(client, &upstream.base_url, &upstream.api_key).with_retry_policy(retry))
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn send_once(
        &self,
        url: &str,
        query: &[(&str, &str)],
        api_key: &str,
        timeout: Duration,
    ) -> Result<Value, AttemptFailure> {
        let started = Instant::now();
        let request = self
            .client
            .get(url)
            .query(query)
            .header(API_KEY_HEADER, api_key);

        let outcome = tokio::time::timeout(timeout, async {
            let response = request.send().await?;
            let status = response.status();
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, retry_after, body))
        })
        .await;

        let (status, retry_after, body) = match outcome {
            Err(_) => return Err(AttemptFailure::Timeout(started.elapsed())),
            Ok(Err(e)) if e.is_timeout() => return Err(AttemptFailure::Timeout(started.elapsed())),
            Ok(Err(e)) => return Err(AttemptFailure::Transport(e.to_string())),
            Ok(Ok(parts)) => parts,
        };

        if !status.is_success() {
            return Err(AttemptFailure::Status {
                status,
                body,
                retry_after,
            });
        }

        serde_json::from_str(&body).map_err(|e| AttemptFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl CongressApiClient for HttpCongressClient {
    async fn execute(
        &self,
        spec: &RequestSpec,
        ctx: &RequestContext,
    ) -> Result<Value, CongressError> {
        let url = format!("{}{}", self.base_url, spec.endpoint);
        let query = spec.sanitized_query();
        let api_key = ctx.api_key.as_deref().unwrap_or(&self.api_key);
        let max_attempts = spec.max_attempts.min(self.retry.max_attempts).max(1);
        let session = ctx.session_id.as_deref().unwrap_or("-");

        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::debug!(endpoint = %spec.endpoint, attempt, max_attempts, session, "sending upstream request");

            let failure = match self.send_once(&url, &query, api_key, spec.timeout).await {
                Ok(payload) => return Ok(payload),
                Err(failure) => failure,
            };

            let hint = failure.retry_after();
            let hint_too_long = hint.is_some_and(|h| h > self.retry.max_backoff);
            if !failure.is_transient() || attempt >= max_attempts || hint_too_long {
                tracing::error!(
                    endpoint = %spec.endpoint,
                    attempts = attempt,
                    max_attempts,
                    session,
                    error = %failure,
                    "upstream request failed"
                );
                return Err(failure.into_error(spec));
            }

            let delay = hint.map_or_else(
                || self.retry.delay_for_attempt(attempt),
                |h| h.max(self.retry.delay_for_attempt(attempt)),
            );
            tracing::warn!(
                endpoint = %spec.endpoint,
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                session,
                error = %failure,
                "transient upstream failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Mock implementation for unit testing.

    use super::{CongressApiClient, CongressError, RequestContext, RequestSpec};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock implementation of `CongressApiClient` for unit tests.
    ///
    /// Queue responses with `push_result` and verify calls with `calls()`.
    /// An empty queue answers with an empty list.
    pub struct MockCongressClient {
        results: Mutex<VecDeque<Result<Value, CongressError>>>,
        calls: Mutex<Vec<RequestSpec>>,
    }

    impl MockCongressClient {
        pub fn new() -> Self {
            Self {
                results: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Queue the result for the next `execute` call.
        pub fn push_result(&self, result: Result<Value, CongressError>) {
            self.results.lock().unwrap().push_back(result);
        }

        /// Every spec passed to `execute`, in call order.
        pub fn calls(&self) -> Vec<RequestSpec> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Default for MockCongressClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl CongressApiClient for MockCongressClient {
        async fn execute(
            &self,
            spec: &RequestSpec,
            _ctx: &RequestContext,
        ) -> Result<Value, CongressError> {
            self.calls.lock().unwrap().push(spec.clone());

            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Value::Array(Vec::new())))
        }
    }
}
