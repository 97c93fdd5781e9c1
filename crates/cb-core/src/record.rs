//! Clock records supplied by the host and the billable values derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One clocked task as reported by the host time tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Outline depth, 1 for top-level tasks.
    #[serde(default = "default_level")]
    pub level: u32,
    pub headline: String,
    /// Clocked minutes. Missing or non-numeric values read as 0.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub minutes: u64,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: BTreeMap<String, String>,
}

/// All clocked entries of one originating document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSource {
    /// Name of the originating document, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Sum of the entries' minutes. Non-numeric values read as absent.
    #[serde(default, deserialize_with = "lenient_total")]
    pub total_minutes: Option<i64>,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

/// A line item priced at the report's rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillableEntry {
    pub level: u32,
    pub headline: String,
    pub minutes: u64,
    pub hours: f64,
    pub cost: f64,
    pub properties: BTreeMap<String, String>,
}

/// A source that survived filtering, with its own rounded subtotal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillableSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub total_minutes: u64,
    pub total_hours: f64,
    pub total_cost: f64,
    pub entries: Vec<BillableEntry>,
}

const fn default_level() -> u32 {
    1
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn minutes_from_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    // Fractional minutes round to the nearest whole minute.
    (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.round() as i64)
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(minutes_from_value)
        .and_then(|m| u64::try_from(m).ok())
        .unwrap_or(0))
}

fn lenient_total<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(minutes_from_value))
}

/// Property values are opaque: non-string JSON values keep their JSON text.
fn lenient_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}
