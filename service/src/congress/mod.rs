//! Congress.gov access layer.
//!
//! Every tool call flows through the same pipeline:
//!
//! - [`validate`] - pure parameter checks with actionable messages
//! - [`LegislativeService`] - resolves a [`ResourceDef`] from the [`resources`]
//!   table, validates the arguments and builds a [`RequestSpec`]
//! - [`CongressApiClient`] - one logical upstream call with timeout, retry and
//!   backoff ([`HttpCongressClient`] in production)
//! - [`response`] - envelope detection, deduplication and windowing
//! - [`format`] - markdown rendering of the normalized result
//!
//! Failures anywhere in the pipeline are a [`CongressError`], rendered for
//! callers by [`CongressError::to_markdown`].
//!
//! # Testing Patterns
//!
//! ## Unit Tests (Mock Implementation)
//!
//! Use `MockCongressClient` to drive the service without a network:
//!
//! ```ignore
//! use congress_mcp::congress::mock::MockCongressClient;
//!
//! let mock = Arc::new(MockCongressClient::new());
//! mock.push_result(Ok(json!({"bills": [], "pagination": {"count": 0}})));
//!
//! let service = LegislativeService::new(mock.clone(), RequestConfig::default());
//! let result = service.execute_validated("list_bills", &args, &ctx).await?;
//! assert_eq!(mock.calls()[0].endpoint, "/bill/117");
//! ```
//!
//! ## Integration Tests (HTTP Stubbing)
//!
//! Use `MockHttpServer` to test `HttpCongressClient` against stubbed HTTP:
//!
//! ```ignore
//! use crate::common::http_mock::MockHttpServer;
//!
//! let server = MockHttpServer::start().await;
//!
//! server
//!     .expect_get("/bill/117")
//!     .with_header("X-API-Key", "test-key")
//!     .respond_with_json(json!({"bills": []}))
//!     .mount()
//!     .await;
//!
//! let client = HttpCongressClient::new(server.url(), "test-key");
//! ```

mod client;
pub mod error;
pub mod format;
pub mod resources;
pub mod response;
mod service;
pub mod validate;

pub use client::{
    CongressApiClient, HttpCongressClient, RequestContext, RequestSpec, RetryPolicy,
    API_KEY_HEADER,
};
pub use error::{CongressError, ErrorKind, ResourceRef};
pub use format::format_result;
pub use resources::{ParamKind, ParamSpec, ResourceDef, TimeoutClass, ToolGroup, RESOURCES};
pub use response::NormalizedResult;
pub use service::{overfetch, LegislativeService, DEFAULT_LIMIT};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock;
