//! The single error shape for every failure path.
//!
//! [`CongressError::to_markdown`] is the only way an error reaches a caller.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use super::validate::describe;

/// Closed set of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Timeout,
    RateLimited,
    ServerError,
    General,
}

impl ErrorKind {
    /// Machine-parsable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServerError => "SERVER_ERROR",
            Self::General => "GENERAL_ERROR",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Validation => "Invalid parameter",
            Self::NotFound => "Not found",
            Self::Timeout => "Request timed out",
            Self::RateLimited => "Rate limit reached",
            Self::ServerError => "Upstream API error",
            Self::General => "Request failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "Validation",
            Self::NotFound => "NotFound",
            Self::Timeout => "Timeout",
            Self::RateLimited => "RateLimited",
            Self::ServerError => "ServerError",
            Self::General => "General",
        };
        f.write_str(name)
    }
}

/// Identifies the record a failure refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub resource_type: String,
    pub identifier: String,
}

impl ResourceRef {
    pub fn new(resource_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }
}

/// Errors surfaced to tool callers. Immutable once built; holds no live resources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CongressError {
    /// A parameter failed local validation. Raised before any network access.
    #[error("Invalid value for `{parameter}`: {message}")]
    Validation {
        parameter: String,
        value: String,
        message: String,
        suggestions: Vec<String>,
    },

    /// The upstream API has no record for a specific identifier.
    #[error("No {} found for `{}`.", .resource.resource_type, .resource.identifier)]
    NotFound { resource: ResourceRef },

    /// The per-call timeout elapsed on the final attempt.
    #[error("The request to {endpoint} did not complete within {:.1}s.", seconds(.elapsed))]
    Timeout { endpoint: String, elapsed: Duration },

    /// The upstream API signalled quota exhaustion.
    #[error("{}", rate_limited_message(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Non-2xx response, transport failure or undecodable body.
    #[error("{}", server_error_message(.status, .message))]
    ServerError { status: Option<u16>, message: String },

    /// Fallback for anything else.
    #[error("{message}")]
    General {
        message: String,
        suggestions: Vec<String>,
    },
}

fn seconds(elapsed: &Duration) -> f64 {
    elapsed.as_secs_f64()
}

#[allow(clippy::ref_option)]
fn rate_limited_message(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(
            "The Congress.gov API rate limit was reached; it asked clients to wait {}s.",
            d.as_secs()
        ),
        None => "The Congress.gov API rate limit was reached.".to_string(),
    }
}

#[allow(clippy::ref_option)]
fn server_error_message(status: &Option<u16>, message: &str) -> String {
    let message = message.trim();
    match (status, message.is_empty()) {
        (Some(status), true) => format!("The Congress.gov API responded with HTTP {status}."),
        (Some(status), false) => {
            format!("The Congress.gov API responded with HTTP {status}: {message}")
        }
        (None, true) => "The Congress.gov API could not be reached.".to_string(),
        (None, false) => format!("The Congress.gov API request failed: {message}"),
    }
}

impl CongressError {
    /// Build a Validation error. `hint` becomes the first suggestion.
    pub fn validation(
        parameter: impl Into<String>,
        value: &Value,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        let parameter = parameter.into();
        let mut suggestions: Vec<String> = hint.into_iter().collect();
        suggestions.push(format!("Correct `{parameter}` and call the tool again."));
        Self::Validation {
            value: describe(value),
            parameter,
            message: message.into(),
            suggestions,
        }
    }

    pub fn not_found(resource_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource: ResourceRef::new(resource_type, identifier),
        }
    }

    pub fn timeout(endpoint: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            endpoint: endpoint.into(),
            elapsed,
        }
    }

    #[must_use]
    pub const fn rate_limited(retry_after: Option<Duration>) -> Self {
        Self::RateLimited { retry_after }
    }

    pub fn server_error(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    /// Replace the suggestions on a Validation or General error. Other kinds
    /// derive their suggestions and ignore this.
    #[must_use]
    pub fn with_suggestions<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Self::Validation { suggestions, .. } | Self::General { suggestions, .. } = &mut self
        {
            *suggestions = items.into_iter().map(Into::into).collect();
        }
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ServerError { .. } => ErrorKind::ServerError,
            Self::General { .. } => ErrorKind::General,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind().code()
    }

    #[must_use]
    pub const fn resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::NotFound { resource } => Some(resource),
            _ => None,
        }
    }

    /// Ordered remediation steps. Never empty.
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        let suggestions = match self {
            Self::Validation { suggestions, .. } | Self::General { suggestions, .. } => {
                suggestions.clone()
            }
            Self::NotFound { resource } => vec![
                format!(
                    "Check that the {} identifier `{}` is correct.",
                    resource.resource_type, resource.identifier
                ),
                "Use the matching list tool to discover valid identifiers.".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Try the request again in a few moments.".to_string(),
                "Narrow the query with a smaller limit or more specific filters.".to_string(),
            ],
            Self::RateLimited { retry_after } => vec![
                retry_after.map_or_else(
                    || "Wait a minute before retrying.".to_string(),
                    |d| format!("Wait at least {} seconds before retrying.", d.as_secs().max(1)),
                ),
                "Reduce how often requests are made.".to_string(),
            ],
            Self::ServerError { status, .. } => match status {
                Some(400..=499) => vec![
                    "Check the parameter values against the Congress.gov API documentation."
                        .to_string(),
                    "Verify that the configured API key is valid.".to_string(),
                ],
                _ => vec![
                    "The Congress.gov API may be temporarily unavailable; try again later."
                        .to_string(),
                ],
            },
        };
        if suggestions.is_empty() {
            vec!["Try again; if the problem persists, report it with the error code.".to_string()]
        } else {
            suggestions
        }
    }

    /// Render the user-visible markdown block.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let kind = self.kind();
        let mut out = format!(
            "## Error: {}\n\n{self}\n\n- **Kind:** {kind}\n- **Code:** `{}`\n",
            kind.title(),
            kind.code()
        );
        if let Some(resource) = self.resource() {
            out.push_str(&format!(
                "- **Resource:** {} `{}`\n",
                resource.resource_type, resource.identifier
            ));
        }
        out.push_str("\n**Suggestions:**\n");
        for (i, suggestion) in self.suggestions().iter().enumerate() {
            out.push_str(&format!("{}. {suggestion}\n", i + 1));
        }
        out
    }

    /// Machine-readable companion to the markdown block.
    #[must_use]
    pub fn to_report(&self) -> Value {
        json!({
            "kind": self.kind(),
            "code": self.code(),
            "message": self.to_string(),
            "suggestions": self.suggestions(),
            "resource": self.resource(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_kind() -> Vec<CongressError> {
        vec![
            CongressError::validation(
                "month",
                &json!(13),
                "Month must be an integer between 1 and 12 (got 13).",
                Some("Use a month between 1 and 12.".to_string()),
            ),
            CongressError::not_found("bill", "117/hr/99999"),
            CongressError::timeout("/bound-congressional-record/1990/1/1", Duration::from_secs(45)),
            CongressError::rate_limited(Some(Duration::from_secs(30))),
            CongressError::rate_limited(None),
            CongressError::server_error(Some(503), "Service Unavailable"),
            CongressError::server_error(None, ""),
            CongressError::general("unexpected"),
        ]
    }

    #[test]
    fn every_error_has_code_and_suggestion() {
        for err in every_kind() {
            assert!(!err.code().is_empty());
            assert!(!err.suggestions().is_empty(), "{err:?} has no suggestions");
        }
    }

    #[test]
    fn codes_are_distinct_per_kind() {
        let codes = [
            ErrorKind::Validation,
            ErrorKind::NotFound,
            ErrorKind::Timeout,
            ErrorKind::RateLimited,
            ErrorKind::ServerError,
            ErrorKind::General,
        ]
        .map(ErrorKind::code);
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn markdown_block_layout() {
        let err = CongressError::validation(
            "month",
            &json!(13),
            "Month must be an integer between 1 and 12 (got 13).",
            Some("Use a month between 1 and 12.".to_string()),
        );
        let md = err.to_markdown();

        assert!(md.starts_with("## Error: Invalid parameter\n"));
        assert!(md.contains("Invalid value for `month`: Month must be an integer between 1 and 12"));
        assert!(md.contains("- **Kind:** Validation"));
        assert!(md.contains("- **Code:** `VALIDATION_ERROR`"));
        assert!(md.contains("1. Use a month between 1 and 12."));
        assert!(md.contains("2. Correct `month` and call the tool again."));
    }

    #[test]
    fn not_found_carries_resource() {
        let err = CongressError::not_found("member", "Z999999");
        assert_eq!(err.resource(), Some(&ResourceRef::new("member", "Z999999")));
        assert!(err.to_markdown().contains("- **Resource:** member `Z999999`"));
    }

    #[test]
    fn rate_limit_hint_in_suggestions() {
        let err = CongressError::rate_limited(Some(Duration::from_secs(30)));
        assert_eq!(err.suggestions()[0], "Wait at least 30 seconds before retrying.");
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn general_without_suggestions_gets_fallback() {
        let err = CongressError::general("boom");
        assert_eq!(err.suggestions().len(), 1);

        let err = CongressError::general("boom").with_suggestions(["one", "two"]);
        assert_eq!(err.suggestions(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn report_is_machine_readable() {
        let report = CongressError::server_error(Some(500), "oops").to_report();
        assert_eq!(report["kind"], "ServerError");
        assert_eq!(report["code"], "SERVER_ERROR");
        assert!(report["suggestions"].as_array().is_some_and(|s| !s.is_empty()));
    }
}
