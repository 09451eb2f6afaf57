//! HTTP mock server helpers for testing outbound HTTP calls.
//!
//! This module provides a thin wrapper around `wiremock` for declarative
//! HTTP stubbing. Use it to mock Congress.gov responses in integration tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::common::http_mock::MockHttpServer;
//!
//! #[tokio::test]
//! async fn test_external_api_call() {
//!     let server = MockHttpServer::start().await;
//!
//!     server
//!         .expect_get("/bill/117")
//!         .respond_with_json(json!({"bills": []}))
//!         .expect_times(1)
//!         .mount()
//!         .await;
//!
//!     // Point the client at server.url()
//! }
//! ```
//!
//! # Patterns
//!
//! - **Success response**: `.respond_with_json(value)` or `.respond_with_body(string)`
//! - **Error response**: `.respond_with_status(503)`, optionally `.with_json_response(value)`
//! - **Rate limiting**: `.respond_with_status(429).with_retry_after("2")`
//! - **Timeout simulation**: `.respond_with_delay(Duration::from_millis(500))`
//! - **Request verification**: `.expect_times(1)` to assert call count
//! - **Transient then healthy**: mount a failing stub with `.up_to_n_times(1)` first

#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;
pub use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
pub use wiremock::MockServer as WiremockServer;
pub use wiremock::{Mock, ResponseTemplate};

/// Wrapper around a running wiremock server.
pub struct MockHttpServer {
    inner: WiremockServer,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        Self {
            inner: WiremockServer::start().await,
        }
    }

    /// Base URL to hand to the client under test.
    pub fn url(&self) -> String {
        self.inner.uri()
    }

    /// Escape hatch for matchers the builder does not cover.
    pub fn inner(&self) -> &WiremockServer {
        &self.inner
    }

    pub fn expect_get(&self, route: &str) -> StubBuilder<'_> {
        StubBuilder {
            server: &self.inner,
            route: route.to_string(),
            headers: Vec::new(),
            query: Vec::new(),
            status: 200,
            body: None,
            delay: None,
            retry_after: None,
            times: None,
            up_to: None,
        }
    }

    /// Every request the server has seen, in arrival order.
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.inner.received_requests().await.unwrap_or_default()
    }

    /// Query pairs of every received request.
    pub async fn received_queries(&self) -> Vec<Vec<(String, String)>> {
        self.received_requests()
            .await
            .iter()
            .map(|r| {
                r.url
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .collect()
    }
}

/// Declarative GET stub. Nothing is registered until [`StubBuilder::mount`].
pub struct StubBuilder<'a> {
    server: &'a WiremockServer,
    route: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    status: u16,
    body: Option<ResponseBody>,
    delay: Option<Duration>,
    retry_after: Option<String>,
    times: Option<u64>,
    up_to: Option<u64>,
}

enum ResponseBody {
    Json(Value),
    Raw(String),
}

impl StubBuilder<'_> {
    /// Only match requests carrying this header value.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Only match requests carrying this query parameter.
    #[must_use]
    pub fn with_query_param(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn respond_with_json(mut self, body: Value) -> Self {
        self.status = 200;
        self.body = Some(ResponseBody::Json(body));
        self
    }

    #[must_use]
    pub fn respond_with_body(mut self, body: &str) -> Self {
        self.status = 200;
        self.body = Some(ResponseBody::Raw(body.to_string()));
        self
    }

    #[must_use]
    pub const fn respond_with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// JSON body for a non-200 response; keeps the status already set.
    #[must_use]
    pub fn with_json_response(mut self, body: Value) -> Self {
        self.body = Some(ResponseBody::Json(body));
        self
    }

    #[must_use]
    pub const fn respond_with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_retry_after(mut self, value: &str) -> Self {
        self.retry_after = Some(value.to_string());
        self
    }

    /// Verified when the server drops.
    #[must_use]
    pub const fn expect_times(mut self, times: u64) -> Self {
        self.times = Some(times);
        self
    }

    /// Stop matching after `n` hits so later stubs take over.
    #[must_use]
    pub const fn up_to_n_times(mut self, n: u64) -> Self {
        self.up_to = Some(n);
        self
    }

    pub async fn mount(self) {
        let mut builder = Mock::given(method("GET")).and(path(self.route.as_str()));
        for (name, value) in &self.headers {
            builder = builder.and(header(name.as_str(), value.as_str()));
        }
        for (name, value) in &self.query {
            builder = builder.and(query_param(name.as_str(), value.as_str()));
        }

        let mut template = ResponseTemplate::new(self.status);
        match self.body {
            Some(ResponseBody::Json(body)) => template = template.set_body_json(body),
            Some(ResponseBody::Raw(body)) => template = template.set_body_string(body),
            None => {}
        }
        if let Some(delay) = self.delay {
            template = template.set_delay(delay);
        }
        if let Some(retry_after) = &self.retry_after {
            template = template.insert_header("Retry-After", retry_after.as_str());
        }

        let mut mock = builder.respond_with(template);
        if let Some(n) = self.up_to {
            mock = mock.up_to_n_times(n);
        }
        if let Some(n) = self.times {
            mock = mock.expect(n);
        }
        mock.mount(self.server).await;
    }
}
