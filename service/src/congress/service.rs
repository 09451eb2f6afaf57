//! Single entry point shared by every tool: validate, call upstream, normalize.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::client::{CongressApiClient, RequestContext, RequestSpec};
use super::error::{CongressError, ResourceRef};
use super::resources::{self, Location, ParamKind, ParamSpec, ResourceDef};
use super::response::{process, process_page, NormalizedResult};
use super::validate::{
    as_integer, current_year, validate_chamber, validate_congress_number, validate_datetime,
    validate_day, validate_enum, validate_identifier, validate_limit, validate_month,
    validate_offset, validate_positive_integer, validate_year, ValidationResult, MAX_LIMIT,
};
use crate::config::RequestConfig;

pub const DEFAULT_LIMIT: usize = 20;
const OFFSET: &str = "offset";
const LIMIT: &str = "limit";

/// Largest page upstream will serve.
const UPSTREAM_PAGE_CAP: usize = 250;

/// A parameter after validation, rendered the way upstream expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    spec: &'static ParamSpec,
    value: String,
}

/// Validated, windowed access to the resource table.
#[derive(Clone)]
pub struct LegislativeService {
    client: Arc<dyn CongressApiClient>,
    request: RequestConfig,
}

impl LegislativeService {
    pub fn new(client: Arc<dyn CongressApiClient>, request: RequestConfig) -> Self {
        Self { client, request }
    }

    /// Run a named resource with raw caller arguments.
    ///
    /// # Errors
    /// A `Validation` error when any argument is rejected (no upstream call is
    /// made), `General` for an unknown resource, otherwise whatever the request
    /// wrapper reports, or `NotFound` when a lookup comes back empty.
    pub async fn execute_validated(
        &self,
        resource: &str,
        params: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<NormalizedResult, CongressError> {
        let def = resources::find(resource).ok_or_else(|| {
            CongressError::general(format!("Unknown resource `{resource}`."))
                .with_suggestions(["Call tools/list to see the available tools."])
        })?;
        self.execute(def, params, ctx).await
    }

    /// Same as [`Self::execute_validated`] for an already resolved resource.
    ///
    /// # Errors
    /// See [`Self::execute_validated`].
    pub async fn execute(
        &self,
        def: &'static ResourceDef,
        params: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<NormalizedResult, CongressError> {
        let (resolved, offset, limit) = resolve(def, params).inspect_err(|e| {
            tracing::debug!(resource = def.name, error = %e, "rejected tool arguments");
        })?;

        let spec = self.build_request(def, &resolved, offset, limit);
        let raw = self.client.execute(&spec, ctx).await?;

        let result = if def.upstream_paging {
            // Upstream already skipped `offset` raw records.
            process_page(
                raw,
                def.envelope(),
                def.dedup_keys,
                offset,
                limit,
                overfetch(limit),
            )
        } else {
            process(raw, def.envelope(), def.dedup_keys, offset, limit)
        };

        if let Some(label) = def.lookup {
            if result.records.is_empty() {
                return Err(CongressError::not_found(label, path_identifier(&resolved)));
            }
        }

        tracing::info!(
            resource = def.name,
            records = result.records.len(),
            duplicates_removed = result.count_removed,
            offset,
            limit,
            session = ctx.session_id.as_deref().unwrap_or("-"),
            "tool call completed"
        );
        Ok(result)
    }

    fn build_request(
        &self,
        def: &ResourceDef,
        resolved: &[Resolved],
        offset: usize,
        limit: usize,
    ) -> RequestSpec {
        let mut path = def.path.to_string();
        let mut spec_params = Vec::new();
        for param in resolved {
            match param.spec.location {
                Location::Path => {
                    let placeholder = format!("{{{}}}", param.spec.name);
                    path = path.replace(&placeholder, &urlencoding::encode(&param.value));
                }
                Location::Query => spec_params.push((param.spec.name, param.value.clone())),
            }
        }

        let mut spec = RequestSpec::new(path)
            .with_timeout(self.request.timeout_for(def.timeout))
            .with_max_attempts(self.request.max_attempts);
        for (name, value) in spec_params {
            spec = spec.with_param(name, Some(value));
        }
        if def.upstream_paging {
            spec = spec
                .with_param(OFFSET, Some(offset.to_string()))
                .with_param(LIMIT, Some(overfetch(limit).to_string()));
        }
        if let Some(label) = def.lookup {
            spec = spec.with_resource(ResourceRef::new(label, path_identifier(resolved)));
        }
        spec
    }
}

/// Page size to request so that `limit` distinct records survive deduplication.
#[must_use]
pub fn overfetch(limit: usize) -> usize {
    (limit + limit.div_ceil(4).max(5)).min(UPSTREAM_PAGE_CAP)
}

fn path_identifier(resolved: &[Resolved]) -> String {
    resolved
        .iter()
        .filter(|p| p.spec.location == Location::Path)
        .map(|p| p.value.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn present<'a>(params: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|v| !v.is_null())
}

/// Validate every argument against the resource's parameter table, in table order.
fn resolve(
    def: &'static ResourceDef,
    params: &Map<String, Value>,
) -> Result<(Vec<Resolved>, usize, usize), CongressError> {
    for (name, value) in params {
        if name != OFFSET && name != LIMIT && def.param(name).is_none() {
            let accepted: Vec<&str> = def
                .params
                .iter()
                .map(|p| p.name)
                .chain([OFFSET, LIMIT])
                .collect();
            return Err(CongressError::validation(
                name.as_str(),
                value,
                format!("`{}` does not accept this parameter.", def.name),
                Some(format!("Accepted parameters: {}.", accepted.join(", "))),
            ));
        }
    }

    let mut resolved = Vec::with_capacity(def.params.len());
    for spec in def.params {
        let Some(value) = present(params, spec.name) else {
            if spec.required {
                let required: Vec<&str> = def
                    .params
                    .iter()
                    .filter(|p| p.required)
                    .map(|p| p.name)
                    .collect();
                return Err(CongressError::validation(
                    spec.name,
                    &Value::Null,
                    format!("`{}` is required.", spec.name),
                    Some(format!("Required parameters: {}.", required.join(", "))),
                ));
            }
            continue;
        };

        check(spec, value, params).into_result(spec.name, value)?;
        resolved.push(Resolved {
            spec,
            value: render(spec.kind, value),
        });
    }

    let offset = match present(params, OFFSET) {
        Some(value) => {
            validate_offset(value).into_result(OFFSET, value)?;
            to_usize(value)
        }
        None => 0,
    };
    let limit = match present(params, LIMIT) {
        Some(value) => {
            validate_limit(value, MAX_LIMIT).into_result(LIMIT, value)?;
            to_usize(value)
        }
        None => DEFAULT_LIMIT,
    };

    Ok((resolved, offset, limit))
}

fn check(spec: &ParamSpec, value: &Value, params: &Map<String, Value>) -> ValidationResult {
    match spec.kind {
        ParamKind::Congress => validate_congress_number(value),
        ParamKind::Chamber(allowed) => validate_chamber(value, allowed),
        ParamKind::Year { min, max } => {
            validate_year(value, min..=max.unwrap_or_else(current_year))
        }
        ParamKind::Month => validate_month(value),
        ParamKind::Day => validate_day(
            value,
            present(params, "year").unwrap_or(&Value::Null),
            present(params, "month").unwrap_or(&Value::Null),
        ),
        ParamKind::Enum(legal) => validate_enum(value, legal, spec.name),
        ParamKind::PositiveInteger => validate_positive_integer(value, spec.name),
        ParamKind::Identifier => validate_identifier(value, spec.name),
        ParamKind::Timestamp => validate_datetime(value, spec.name),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Canonical upstream form of an already validated value.
fn render(kind: ParamKind, value: &Value) -> String {
    match kind {
        ParamKind::Congress
        | ParamKind::Year { .. }
        | ParamKind::Month
        | ParamKind::Day
        | ParamKind::PositiveInteger => {
            as_integer(value).map_or_else(|| text(value), |n| n.to_string())
        }
        ParamKind::Chamber(_) => text(value).to_ascii_lowercase(),
        ParamKind::Enum(legal) => {
            let raw = text(value);
            legal
                .iter()
                .find(|l| l.eq_ignore_ascii_case(&raw))
                .map_or_else(|| raw.to_ascii_lowercase(), |l| (*l).to_string())
        }
        ParamKind::Identifier | ParamKind::Timestamp => text(value),
    }
}

fn to_usize(value: &Value) -> usize {
    as_integer(value)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or_default()
}
