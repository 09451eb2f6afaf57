//! Normalization of upstream payloads.
//!
//! The upstream API wraps records inconsistently: sometimes a bare list,
//! sometimes an object keyed by the resource name, sometimes a single record.
//! Envelope detection happens once, here, through [`RawResponse::detect`];
//! nothing downstream inspects payload shape.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Where the records of a particular resource live in its response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// Key holding the record list (e.g. `bills`).
    pub collection: &'a str,
    /// Key holding a single record on detail endpoints (e.g. `bill`).
    pub item: Option<&'a str>,
}

impl<'a> Envelope<'a> {
    #[must_use]
    pub const fn new(collection: &'a str) -> Self {
        Self {
            collection,
            item: None,
        }
    }

    #[must_use]
    pub const fn with_item(mut self, item: &'a str) -> Self {
        self.item = Some(item);
        self
    }
}

/// Decoded upstream body, classified by envelope shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    List(Vec<Value>),
    Keyed { key: String, records: Vec<Value> },
    Single(Value),
}

impl RawResponse {
    /// Classify a decoded body.
    #[must_use]
    pub fn detect(raw: Value, envelope: Envelope<'_>) -> Self {
        match raw {
            Value::Array(records) => Self::List(records),
            Value::Null => Self::List(Vec::new()),
            Value::Object(mut map) => {
                let key = [Some(envelope.collection), envelope.item]
                    .into_iter()
                    .flatten()
                    .find(|key| map.contains_key(*key));
                match key.and_then(|key| map.remove(key).map(|value| (key, value))) {
                    Some((key, Value::Array(records))) => Self::Keyed {
                        key: key.to_string(),
                        records,
                    },
                    Some((key, Value::Null)) => Self::Keyed {
                        key: key.to_string(),
                        records: Vec::new(),
                    },
                    Some((_, record)) => Self::Single(record),
                    None => Self::Single(Value::Object(map)),
                }
            }
            scalar => Self::Single(scalar),
        }
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Value> {
        match self {
            Self::List(records) | Self::Keyed { records, .. } => records,
            Self::Single(record) => vec![record],
        }
    }
}

/// Extract the ordered record sequence from any envelope shape.
#[must_use]
pub fn normalize_container(raw: Value, envelope: Envelope<'_>) -> Vec<Value> {
    RawResponse::detect(raw, envelope).into_records()
}

/// Upstream total from a `pagination.count` block, when present.
#[must_use]
pub fn upstream_total(raw: &Value) -> Option<u64> {
    raw.pointer("/pagination/count").and_then(Value::as_u64)
}

/// Resolve a dotted field path such as `latestAction.actionDate`.
#[must_use]
pub fn field<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, segment| current.get(segment))
}

fn key_part(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Identity of a record under `key_fields`. Records missing every key field
/// fall back to their full content.
fn identity(record: &Value, key_fields: &[&str]) -> Vec<Option<String>> {
    let parts: Vec<Option<String>> = key_fields
        .iter()
        .map(|path| key_part(field(record, path)))
        .collect();
    if parts.iter().all(Option::is_none) {
        vec![Some(record.to_string())]
    } else {
        parts
    }
}

/// Stable duplicate removal: the first occurrence wins and survivor order is preserved.
///
/// Returns the surviving records and how many were dropped.
#[must_use]
pub fn deduplicate(records: Vec<Value>, key_fields: &[&str]) -> (Vec<Value>, usize) {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<Value> = records
        .into_iter()
        .filter(|record| seen.insert(identity(record, key_fields)))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

#[must_use]
pub fn paginate(records: Vec<Value>, offset: usize, limit: usize) -> Vec<Value> {
    records.into_iter().skip(offset).take(limit).collect()
}

fn is_date_key(key: &str) -> bool {
    key == "date" || key.contains("Date") || key.ends_with("_date")
}

/// Render date-like text as `YYYY-MM-DD`. Unrecognized text is returned as `None`.
#[must_use]
pub fn normalize_date(text: &str) -> Option<String> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).format("%Y-%m-%d").to_string());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            ["%Y-%m-%d", "%m/%d/%Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn clean_value(key: Option<&str>, value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => match key {
            Some(k) if is_date_key(k) => Some(Value::String(normalize_date(&s).unwrap_or(s))),
            _ => Some(Value::String(s)),
        },
        Value::Array(items) => {
            let items: Vec<Value> = items
                .into_iter()
                .filter_map(|item| clean_value(key, item))
                .collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| clean_value(Some(&k), v).map(|v| (k, v)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        other => Some(other),
    }
}

/// Drop empty and null fields and normalize date-like fields for display.
#[must_use]
pub fn clean_record(record: Value) -> Value {
    clean_value(None, record).unwrap_or_else(|| Value::Object(Map::new()))
}

/// Distinct, windowed records ready for formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub records: Vec<Value>,
    /// Duplicates dropped between the first and last record shown.
    pub count_removed: usize,
    pub offset: usize,
    pub limit: usize,
    /// Offset that continues right after this page, when more records exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_available: Option<u64>,
}

/// One deduplicated window over a raw record sequence.
struct Window {
    records: Vec<Value>,
    removed: usize,
    /// Raw records scanned to fill the window.
    consumed: usize,
    /// Whether a distinct record follows the window in the same batch.
    more: bool,
}

/// Skip `skip` distinct records, then keep the next `limit` distinct ones.
///
/// Duplicates are counted only once the window has started.
fn window(records: Vec<Value>, key_fields: &[&str], skip: usize, limit: usize) -> Window {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let mut distinct = 0usize;
    let mut kept = Vec::with_capacity(limit.min(total));
    let mut removed = 0usize;
    let mut consumed = total;
    let mut rest = records.into_iter().enumerate();

    if limit > 0 {
        for (index, record) in rest.by_ref() {
            if !seen.insert(identity(&record, key_fields)) {
                if distinct >= skip {
                    removed += 1;
                }
                continue;
            }
            distinct += 1;
            if distinct <= skip {
                continue;
            }
            kept.push(record);
            if kept.len() == limit {
                consumed = index + 1;
                break;
            }
        }
    }
    let more = rest.any(|(_, record)| !seen.contains(&identity(&record, key_fields)));

    Window {
        records: kept.into_iter().map(clean_record).collect(),
        removed,
        consumed,
        more,
    }
}

/// Full pipeline for a complete upstream collection: detect envelope,
/// deduplicate, window by distinct offset, clean.
#[must_use]
pub fn process(
    raw: Value,
    envelope: Envelope<'_>,
    key_fields: &[&str],
    offset: usize,
    limit: usize,
) -> NormalizedResult {
    let total_available = upstream_total(&raw);
    let window = window(normalize_container(raw, envelope), key_fields, offset, limit);
    let next_offset = window.more.then(|| offset + window.records.len());
    NormalizedResult {
        records: window.records,
        count_removed: window.removed,
        offset,
        limit,
        next_offset,
        total_available,
    }
}

/// Pipeline for one upstream page that already starts at raw position
/// `offset` and was requested with page size `fetched`.
///
/// `next_offset` is a raw upstream position: it points just past the last
/// record shown, or past the whole batch when nothing distinct is left in it
/// and upstream may still have more.
#[must_use]
pub fn process_page(
    raw: Value,
    envelope: Envelope<'_>,
    key_fields: &[&str],
    offset: usize,
    limit: usize,
    fetched: usize,
) -> NormalizedResult {
    let total_available = upstream_total(&raw);
    let records = normalize_container(raw, envelope);
    let batch = records.len();
    let window = window(records, key_fields, 0, limit);

    let next_offset = if window.more {
        Some(offset + window.consumed)
    } else {
        let next = offset + batch;
        let below_total = match total_available {
            Some(total) => u64::try_from(next).is_ok_and(|n| n < total),
            None => true,
        };
        (batch >= fetched && below_total).then_some(next)
    };

    NormalizedResult {
        records: window.records,
        count_removed: window.removed,
        offset,
        limit,
        next_offset,
        total_available,
    }
}
