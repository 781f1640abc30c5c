//! Training report and its canonical JSON form
//!
//! The report is written with sorted object keys and fixed indentation so two
//! runs over the same data differ only in `created_at`.

use serde::{ser::Error as SerdeSerError, Deserialize, Serialize};
use serde_json::{map::Map, ser::PrettyFormatter, Serializer, Value};

/// Diagnostics produced by one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub created_at: String,
    pub feature_columns: Vec<String>,
    pub rows_total: usize,
    pub rows_used: usize,
    pub rows_dropped: usize,
    pub team1_wins: usize,
    pub team1_losses: usize,
    pub encoded_width: usize,
    pub solver_iterations: usize,
    pub converged: bool,
    pub in_sample_auc: f64,
    pub in_sample_accuracy: f64,
    #[serde(default)]
    pub model_hash: String,
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key, sort_keys(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Serialize with sorted keys and two-space indentation
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = sort_keys(serde_json::to_value(value)?);
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"  "));
    canonical.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|err| SerdeSerError::custom(err.to_string()))
}
