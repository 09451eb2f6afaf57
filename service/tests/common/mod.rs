//! Common test utilities for integration tests.
//!
//! This module provides:
//!
//! - [`http_mock::MockHttpServer`] - Stub Congress.gov over real HTTP
//! - [`fast_retry`] / [`request_config`] - Retry settings that keep tests fast
//! - [`args`] - Build tool argument maps from `json!` literals
//!
//! # Usage
//!
//! ```ignore
//! use crate::common::{fast_client, http_mock::MockHttpServer};
//!
//! #[tokio::test]
//! async fn test_with_stub() {
//!     let server = MockHttpServer::start().await;
//!     let client = fast_client(&server);
//!     // ...
//! }
//! ```

#![allow(dead_code)]

pub mod http_mock;

use std::time::Duration;

use congress_mcp::config::RequestConfig;
use congress_mcp::congress::{HttpCongressClient, RetryPolicy};
use http_mock::MockHttpServer;
use serde_json::{Map, Value};

pub const TEST_API_KEY: &str = "test-api-key";

/// Three attempts with millisecond backoff.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(10),
        multiplier: 2.0,
        max_backoff: Duration::from_millis(50),
    }
}

pub fn request_config() -> RequestConfig {
    RequestConfig {
        initial_backoff_ms: 10,
        max_backoff_ms: 50,
        ..RequestConfig::default()
    }
}

/// Client pointed at the stub server with the test key and fast retries.
pub fn fast_client(server: &MockHttpServer) -> HttpCongressClient {
    HttpCongressClient::new(server.url(), TEST_API_KEY).with_retry_policy(fast_retry())
}

pub fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
