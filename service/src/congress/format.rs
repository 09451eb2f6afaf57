//! Markdown rendering of successful tool results.

use serde_json::Value;

use super::resources::ResourceDef;
use super::response::{field, NormalizedResult};

const MAX_VALUE_CHARS: usize = 200;
const MAX_LIST_ITEMS: usize = 5;

/// Render a result as a heading, a counts line and one numbered line per record.
#[must_use]
pub fn format_result(def: &ResourceDef, result: &NormalizedResult) -> String {
    let shown = result.records.len();
    let mut out = format!("## {}\n\n", def.title);

    let mut counts = vec![
        format!("{shown} {}", plural(shown, "record", "records")),
        format!("offset {}", result.offset),
    ];
    if result.count_removed > 0 {
        counts.push(format!(
            "{} {} removed",
            result.count_removed,
            plural(result.count_removed, "duplicate", "duplicates")
        ));
    }
    if let Some(total) = result.total_available {
        counts.push(format!("{total} available upstream"));
    }
    out.push_str(&format!("Showing {}.\n\n", counts.join(", ")));

    if shown == 0 {
        out.push_str("No records matched.\n");
        return out;
    }

    for (i, record) in result.records.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, summarize(def, record)));
    }

    if let Some(next) = result.next_offset {
        out.push_str(&format!(
            "\nMore records are available: call again with `offset` {next}.\n"
        ));
    }
    out
}

const fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn summarize(def: &ResourceDef, record: &Value) -> String {
    let parts: Vec<String> = def
        .summary_fields
        .iter()
        .filter_map(|path| field(record, path).map(|value| (path, value)))
        .filter_map(|(path, value)| render(value).map(|text| format!("**{path}:** {text}")))
        .collect();
    if parts.is_empty() {
        truncate(&record.to_string())
    } else {
        parts.join("; ")
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(truncate(s)),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Array(items) => {
            let mut rendered: Vec<String> = items
                .iter()
                .take(MAX_LIST_ITEMS)
                .filter_map(render)
                .collect();
            if items.len() > MAX_LIST_ITEMS {
                rendered.push(format!("+{} more", items.len() - MAX_LIST_ITEMS));
            }
            (!rendered.is_empty()).then(|| rendered.join(", "))
        }
        Value::Object(map) => ["fullName", "name", "partyName", "title", "text"]
            .iter()
            .find_map(|key| map.get(*key).and_then(render))
            .or_else(|| Some(truncate(&value.to_string()))),
    }
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_VALUE_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_VALUE_CHARS).collect();
    format!("{}...", cut.trim_end())
}
