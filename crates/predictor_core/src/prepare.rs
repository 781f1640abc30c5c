//! Data preparation for historical match records
//!
//! Selects the required columns, drops incomplete rows, normalizes the toss
//! decision and derives the `team1_win` label.

use crate::errors::{PredictorError, Result};
use crate::types::{
    normalize_toss_decision, CategoricalFrame, FEATURE_COLUMNS, REQUIRED_COLUMNS,
    TOSS_DECISION_COLUMN, WINNER_COLUMN,
};
use tracing::{debug, info};

/// Cell values treated as missing, matching the usual CSV NA markers.
const NA_TOKENS: [&str; 10] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A",
];

/// Whether a raw cell counts as a missing value
pub fn is_missing(cell: Option<&str>) -> bool {
    match cell {
        None => true,
        Some(value) => NA_TOKENS.contains(&value.trim()),
    }
}

/// Raw tabular match data: a header row and optional string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with missing cells
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Output of [`prepare`]: predictor frame plus aligned labels
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub features: CategoricalFrame,
    pub labels: Vec<bool>,
    pub total_rows: usize,
    pub dropped_rows: usize,
}

impl PreparedData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Counts of (team1 wins, team1 losses)
    pub fn class_counts(&self) -> (usize, usize) {
        let wins = self.labels.iter().filter(|&&l| l).count();
        (wins, self.labels.len() - wins)
    }

    /// Number of distinct label values present
    pub fn distinct_classes(&self) -> usize {
        let (wins, losses) = self.class_counts();
        usize::from(wins > 0) + usize::from(losses > 0)
    }
}

/// Turn raw match records into a predictor frame and `team1_win` labels.
///
/// Fails only when required columns are absent from the header.
pub fn prepare(table: &RawTable) -> Result<PreparedData> {
    let mut missing = Vec::new();
    let mut indices = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for name in REQUIRED_COLUMNS {
        match table.column_index(name) {
            Some(idx) => indices.push(idx),
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(PredictorError::Data { missing });
    }

    let winner_pos = REQUIRED_COLUMNS
        .iter()
        .position(|c| *c == WINNER_COLUMN)
        .unwrap_or(REQUIRED_COLUMNS.len() - 1);
    let toss_pos = FEATURE_COLUMNS
        .iter()
        .position(|c| *c == TOSS_DECISION_COLUMN);
    let team1_pos = FEATURE_COLUMNS.iter().position(|c| *c == "team1").unwrap_or(2);

    let mut features =
        CategoricalFrame::new(FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect());
    let mut labels = Vec::with_capacity(table.len());
    let mut dropped = 0usize;

    for (row_idx, row) in table.rows().iter().enumerate() {
        let cells: Vec<Option<&str>> = indices
            .iter()
            .map(|&idx| row.get(idx).and_then(|c| c.as_deref()))
            .collect();

        if cells.iter().any(|c| is_missing(*c)) {
            debug!("Dropping incomplete record at row {}", row_idx + 1);
            dropped += 1;
            continue;
        }

        let mut values: Vec<String> = cells
            .iter()
            .map(|c| c.unwrap_or_default().trim().to_string())
            .collect();
        let winner = values.remove(winner_pos);
        if let Some(pos) = toss_pos {
            values[pos] = normalize_toss_decision(&values[pos]);
        }

        labels.push(winner == values[team1_pos]);
        features.push_row(values)?;
    }

    info!(
        "Prepared {} of {} match records ({} dropped as incomplete)",
        labels.len(),
        table.len(),
        dropped
    );

    Ok(PreparedData {
        features,
        labels,
        total_rows: table.len(),
        dropped_rows: dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        [
            "id", "season", "city", "venue", "team1", "team2", "toss_winner",
            "toss_decision", "winner",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells.iter().map(|c| Some(c.to_string())).collect()
    }

    #[test]
    fn test_prepare_selects_and_labels() {
        let mut table = RawTable::new(headers());
        table.push_row(row(&["1", "2020", "Kolkata", "Eden Gardens", "A", "B", "A", "bat", "A"]));
        table.push_row(row(&["2", "2020", "Mumbai", "Wankhede", "B", "A", "A", "field", "A"]));

        let prepared = prepare(&table).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared.features.columns(), &FEATURE_COLUMNS.map(String::from));
        assert_eq!(
            prepared.features.rows()[0],
            vec!["2020", "Eden Gardens", "A", "B", "A", "bat"]
        );
        assert_eq!(prepared.labels, vec![true, false]);
        assert_eq!(prepared.class_counts(), (1, 1));
        assert_eq!(prepared.distinct_classes(), 2);
    }

    #[test]
    fn test_prepare_drops_incomplete_rows() {
        let mut table = RawTable::new(headers());
        table.push_row(row(&["1", "2020", "Kolkata", "Eden Gardens", "A", "B", "A", "bat", "A"]));
        table.push_row(row(&["2", "2020", "", "Wankhede", "B", "A", "A", "field", "NA"]));
        table.push_row(vec![Some("3".into()), Some("2021".into())]);

        let prepared = prepare(&table).unwrap();
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared.dropped_rows, 2);
        assert_eq!(prepared.total_rows, 3);
    }

    #[test]
    fn test_missing_city_is_not_required() {
        let mut table = RawTable::new(headers());
        table.push_row(row(&["1", "2020", "", "Eden Gardens", "A", "B", "A", "bat", "B"]));

        let prepared = prepare(&table).unwrap();
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared.labels, vec![false]);
    }

    #[test]
    fn test_toss_decision_is_lowercased() {
        let mut table = RawTable::new(headers());
        table.push_row(row(&["1", "2020", "K", "Eden Gardens", "A", "B", "A", "FIELD", "A"]));
        table.push_row(row(&["2", "2020", "K", "Eden Gardens", "A", "B", "A", "Bowl", "A"]));

        let prepared = prepare(&table).unwrap();
        let decisions: Vec<&str> = prepared
            .features
            .column_values(TOSS_DECISION_COLUMN)
            .unwrap()
            .collect();
        assert_eq!(decisions, vec!["field", "bowl"]);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let table = RawTable::new(vec!["season".into(), "venue".into(), "team1".into()]);
        match prepare(&table) {
            Err(PredictorError::Data { missing }) => {
                assert_eq!(missing, vec!["team2", "toss_winner", "toss_decision", "winner"]);
            }
            other => panic!("expected data error, got {:?}", other),
        }
    }

    #[test]
    fn test_na_tokens() {
        assert!(is_missing(None));
        assert!(is_missing(Some("  ")));
        assert!(is_missing(Some("NaN")));
        assert!(!is_missing(Some("Eden Gardens")));
    }
}
