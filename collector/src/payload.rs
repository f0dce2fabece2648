//! Turns statistic payloads into samples.
//!
//! `summary` payloads are a flat `metric -> number` map. Grouped payloads carry a `result` list of such maps, each
//! with the grouping key (`code`, `resource`) and optionally its display name (`resource_name`) next to the numbers.

use crate::{
    error::PayloadError,
    sample::MetricSample,
};
use sbercdn_api_client::{
    Payload,
    StatQuery,
};
use serde_json::Value;

pub const ACCOUNT_LABEL: &str = "account";

/// Every numeric leaf becomes one sample stamped with the end of the query window. Anything else is metadata and
/// skipped.
pub fn samples(query: &StatQuery, payload: &Payload) -> Result<Vec<MetricSample>, PayloadError> {
    let timestamp = query.window.end;
    let Some(label) = query.group.label() else {
        return Ok(numeric(payload)
            .map(|(name, value)| {
                MetricSample::new(metric_name(name), value)
                    .label(ACCOUNT_LABEL, &query.account)
                    .at(timestamp)
            })
            .collect());
    };

    let entries = payload
        .get("result")
        .and_then(Value::as_array)
        .ok_or(PayloadError::MissingResult { group: query.group })?;
    let name_key = format!("{label}_name");

    let mut samples = Vec::new();
    for entry in entries.iter().filter_map(Value::as_object) {
        let group_value = entry
            .get(&name_key)
            .or_else(|| entry.get(label))
            .map(label_value)
            .unwrap_or_default();
        let metrics = numeric(entry).filter(|(key, _)| *key != label && *key != name_key);
        for (key, value) in metrics {
            samples.push(
                MetricSample::new(format!("{}_{}", query.group, metric_name(key)), value)
                    .label(ACCOUNT_LABEL, &query.account)
                    .label(label, group_value.clone())
                    .at(timestamp),
            );
        }
    }
    Ok(samples)
}

fn numeric(map: &Payload) -> impl Iterator<Item = (&str, f64)> {
    map.iter()
        .filter_map(|(key, value)| value.as_f64().map(|value| (key.as_str(), value)))
}

/// Maps a payload key onto the metric name charset. Names are always namespaced, so a leading digit is fine.
fn metric_name(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect()
}

/// Numbers are printed without a fractional part when they have none, `200.0` becomes `"200"`.
fn label_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(float) => float.to_string(),
            None => number.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
