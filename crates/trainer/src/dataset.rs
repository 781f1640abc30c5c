//! CSV loading of raw match records
//!
//! Reads the upstream match export as-is: every column is kept as text and
//! empty cells become missing values. Column selection and row filtering are
//! left to [`ipl_predictor_core::prepare`].

use crate::errors::TrainerError;
use ipl_predictor_core::RawTable;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Load a match CSV with a header row
pub fn load_matches<P: AsRef<Path>>(path: P) -> Result<RawTable, TrainerError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        TrainerError::Dataset(format!("failed to open {}: {}", path.display(), err))
    })?;
    let table = read_matches(file)?;
    info!(
        "Loaded {} match records with {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

/// Parse match records from any reader.
///
/// Quoted fields may contain commas. Rows shorter than the header are padded
/// with missing values.
pub fn read_matches<R: Read>(reader: R) -> Result<RawTable, TrainerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(TrainerError::Dataset("CSV has no header row".into()));
    }

    let mut table = RawTable::new(headers);
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > table.headers().len() {
            debug!(
                "Record {} has {} fields, header has {}; extra fields ignored",
                line + 1,
                record.len(),
                table.headers().len()
            );
        }
        let row = record
            .iter()
            .take(table.headers().len())
            .map(|cell| {
                if cell.trim().is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                }
            })
            .collect();
        table.push_row(row);
    }
    Ok(table)
}
