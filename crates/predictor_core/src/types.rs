//! Match context, feature column schema and prediction output types

use crate::errors::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predictor columns in the order the encoder lays them out.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "season",
    "venue",
    "team1",
    "team2",
    "toss_winner",
    "toss_decision",
];

/// Column holding the match winner in historical records.
pub const WINNER_COLUMN: &str = "winner";

/// Column whose values are lowercase-normalized before encoding.
pub const TOSS_DECISION_COLUMN: &str = "toss_decision";

/// Every column the training data must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "season",
    "venue",
    "team1",
    "team2",
    "toss_winner",
    "toss_decision",
    "winner",
];

/// Lowercase a toss decision; values other than `bat`/`field` pass through.
pub fn normalize_toss_decision(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Ordered list of predictor column names shared by training and inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumns(Vec<String>);

impl FeatureColumns {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    /// The six match-context columns in training order
    pub fn standard() -> Self {
        Self(FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    /// Parse the comma-separated artifact text
    pub fn parse(text: &str) -> Result<Self> {
        let columns: Vec<String> = text
            .trim()
            .split(',')
            .map(|c| c.trim().to_string())
            .collect();

        if columns.iter().any(|c| c.is_empty()) {
            return Err(PredictorError::Artifact(format!(
                "feature column list contains an empty entry: {:?}",
                text.trim()
            )));
        }

        Ok(Self(columns))
    }

    /// Render as the comma-separated artifact text
    pub fn to_text(&self) -> String {
        self.0.join(",")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for FeatureColumns {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for FeatureColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Categorical frame: named columns and rows of string cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalFrame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CategoricalFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the column count
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PredictorError::DimensionMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }
}

/// Match context used as a prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchContext {
    pub season: String,
    pub venue: String,
    pub team1: String,
    pub team2: String,
    pub toss_winner: String,
    pub toss_decision: String,
}

impl MatchContext {
    /// Look up a predictor field by column name
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "season" => Some(&self.season),
            "venue" => Some(&self.venue),
            "team1" => Some(&self.team1),
            "team2" => Some(&self.team2),
            "toss_winner" => Some(&self.toss_winner),
            "toss_decision" => Some(&self.toss_decision),
            _ => None,
        }
    }

    /// Build a context from name/value pairs given in any order.
    ///
    /// Unknown names are ignored; a missing or blank predictor field is a
    /// [`PredictorError::PredictionInput`].
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut slots: [Option<String>; 6] = Default::default();
        for (name, value) in fields {
            if let Some(idx) = FEATURE_COLUMNS.iter().position(|c| *c == name.as_ref()) {
                slots[idx] = Some(value.into());
            }
        }

        let mut values = Vec::with_capacity(FEATURE_COLUMNS.len());
        for (name, slot) in FEATURE_COLUMNS.iter().zip(slots) {
            match slot {
                Some(v) if !v.trim().is_empty() => values.push(v),
                _ => {
                    return Err(PredictorError::PredictionInput(format!(
                        "missing field `{}`",
                        name
                    )))
                }
            }
        }

        let [season, venue, team1, team2, toss_winner, toss_decision]: [String; 6] = values
            .try_into()
            .map_err(|_| PredictorError::PredictionInput("incomplete match context".into()))?;
        Ok(Self {
            season,
            venue,
            team1,
            team2,
            toss_winner,
            toss_decision,
        })
    }
}

/// Win probabilities for both sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub team1_win_probability: f64,
    pub team2_win_probability: f64,
}

impl PredictionResult {
    /// Build the pair from team1's probability; team2 gets the complement
    pub fn from_team1_probability(p: f64) -> Self {
        let p = if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) };
        Self {
            team1_win_probability: p,
            team2_win_probability: 1.0 - p,
        }
    }
}
