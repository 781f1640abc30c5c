//! Artifact persistence for the fitted pipeline
//!
//! Layout under one directory:
//! - `model.bin`: bincode-encoded [`FittedPipeline`]
//! - `feature_columns.txt`: predictor column names, comma-separated
//! - `model.hash`: hex BLAKE3 digest of `model.bin`
//! - `training_report.json`: canonical JSON [`TrainingReport`]
//!
//! Every file is serialized in memory first and written into a staging
//! directory next to the target. The staging directory then replaces the
//! target directory, so a failed save leaves the previous artifact set intact.
//! Entries of the target directory that are not artifact files are carried
//! over into the new directory.

use crate::config::ArtifactsConfig;
use crate::errors::{PredictorError, Result};
use crate::pipeline::{FittedPipeline, MatchScorer};
use crate::report::{to_canonical_json, TrainingReport};
use crate::types::FeatureColumns;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::{debug, info, warn};

/// Resolved artifact file locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub model: PathBuf,
    pub features: PathBuf,
    pub hash: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    /// Default file names under `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::from_config(&ArtifactsConfig {
            dir: dir.as_ref().to_path_buf(),
            ..ArtifactsConfig::default()
        })
    }

    pub fn from_config(config: &ArtifactsConfig) -> Self {
        let dir = config.dir.clone();
        Self {
            model: dir.join(&config.model_file),
            features: dir.join(&config.features_file),
            hash: dir.join(&config.hash_file),
            report: dir.join(&config.report_file),
            dir,
        }
    }
}

/// Outcome of a successful save
#[derive(Debug, Clone)]
pub struct SavedArtifacts {
    pub model_hash: String,
    pub model_size: usize,
    pub report: TrainingReport,
}

/// Hex BLAKE3 digest of a serialized model
pub fn model_hash(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Persist the pipeline, its column list, hash and report
pub fn save_artifacts(
    paths: &ArtifactPaths,
    pipeline: &FittedPipeline,
    columns: &FeatureColumns,
    report: &TrainingReport,
) -> Result<SavedArtifacts> {
    ensure_schema(pipeline, columns)?;

    let model_bytes = pipeline.to_bytes()?;
    let hash = model_hash(&model_bytes);
    let mut report = report.clone();
    report.model_hash = hash.clone();
    let report_json = to_canonical_json(&report)?;
    let columns_text = columns.to_text();

    let files: [(&Path, &[u8]); 4] = [
        (paths.model.as_path(), model_bytes.as_slice()),
        (paths.features.as_path(), columns_text.as_bytes()),
        (paths.hash.as_path(), hash.as_bytes()),
        (paths.report.as_path(), report_json.as_bytes()),
    ];

    let parent = parent_dir(&paths.dir);
    fs::create_dir_all(&parent)?;
    let staging = Builder::new()
        .prefix(".artifacts-staging-")
        .tempdir_in(&parent)?;

    let mut owned: Vec<OsString> = Vec::with_capacity(files.len());
    for (dest, contents) in files {
        let relative = dest.strip_prefix(&paths.dir).map_err(|_| {
            PredictorError::Artifact(format!(
                "{} is outside the artifact directory {}",
                dest.display(),
                paths.dir.display()
            ))
        })?;
        let staged = staging.path().join(relative);
        if let Some(dir) = staged.parent() {
            fs::create_dir_all(dir)?;
        }
        write_synced(&staged, contents)?;
        if let Some(first) = relative.components().next() {
            owned.push(first.as_os_str().to_os_string());
        }
        debug!("Staged {}", dest.display());
    }

    replace_dir(staging, &paths.dir, &parent, &owned)?;

    info!(
        "Saved model ({} bytes, blake3 {}) to {}",
        model_bytes.len(),
        hash,
        paths.dir.display()
    );

    Ok(SavedArtifacts {
        model_hash: hash,
        model_size: model_bytes.len(),
        report,
    })
}

fn parent_dir(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_synced(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Swap a fully staged directory into place at `dir`.
///
/// The current `dir` is first moved aside. If the staged directory cannot take
/// its place, the previous directory is moved back.
fn replace_dir(staging: TempDir, dir: &Path, parent: &Path, owned: &[OsString]) -> Result<()> {
    if fs::symlink_metadata(dir).is_err() {
        fs::rename(staging.path(), dir)?;
        return Ok(());
    }

    let aside = Builder::new()
        .prefix(".artifacts-previous-")
        .tempdir_in(parent)?;
    let previous = aside.path().join("previous");
    fs::rename(dir, &previous)?;

    if let Err(err) = fs::rename(staging.path(), dir) {
        if let Err(restore) = fs::rename(&previous, dir) {
            let kept = aside.into_path();
            return Err(PredictorError::Artifact(format!(
                "failed to install artifacts ({}) and to restore the previous set ({}); it remains in {}",
                err,
                restore,
                kept.display()
            )));
        }
        return Err(err.into());
    }

    if previous.is_dir() {
        if let Err(err) = carry_over(&previous, dir, owned) {
            let kept = aside.into_path();
            return Err(PredictorError::Artifact(format!(
                "new artifacts are in place but other entries of {} could not be kept ({}); they remain in {}",
                dir.display(),
                err,
                kept.display()
            )));
        }
    }
    Ok(())
}

/// Move entries that are not artifact files from the old directory into the new one
fn carry_over(previous: &Path, dir: &Path, owned: &[OsString]) -> std::io::Result<()> {
    for entry in fs::read_dir(previous)? {
        let entry = entry?;
        let name = entry.file_name();
        if owned.contains(&name) {
            continue;
        }
        fs::rename(entry.path(), dir.join(&name))?;
        debug!("Kept {}", dir.join(&name).display());
    }
    Ok(())
}

/// Load and verify the pipeline and its column list.
///
/// The model hash is checked when a hash file is present. The column list
/// must match the columns the model was fitted on.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<(FittedPipeline, FeatureColumns)> {
    let model_bytes = fs::read(&paths.model).map_err(|err| {
        PredictorError::Artifact(format!(
            "failed to read model {}: {}",
            paths.model.display(),
            err
        ))
    })?;

    match fs::read_to_string(&paths.hash) {
        Ok(expected) => {
            let actual = model_hash(&model_bytes);
            if expected.trim() != actual {
                return Err(PredictorError::Artifact(format!(
                    "model hash mismatch: expected {}, computed {}",
                    expected.trim(),
                    actual
                )));
            }
            debug!("Model hash verified: {}", actual);
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "No hash file at {}; skipping model integrity check",
                paths.hash.display()
            );
        }
        Err(err) => return Err(err.into()),
    }

    let pipeline = FittedPipeline::from_bytes(&model_bytes)?;

    let text = fs::read_to_string(&paths.features).map_err(|err| {
        PredictorError::Artifact(format!(
            "failed to read feature columns {}: {}",
            paths.features.display(),
            err
        ))
    })?;
    let columns = FeatureColumns::parse(&text)?;
    ensure_schema(&pipeline, &columns)?;

    info!(
        "Loaded model from {} ({} features over columns {})",
        paths.model.display(),
        pipeline.encoder().width(),
        columns
    );
    Ok((pipeline, columns))
}

/// Column list must equal the model's fitted columns, in order
pub fn ensure_schema(scorer: &dyn MatchScorer, columns: &FeatureColumns) -> Result<()> {
    if scorer.feature_columns() != columns.as_slice() {
        return Err(PredictorError::SchemaMismatch {
            expected: scorer.feature_columns().to_vec(),
            found: columns.as_slice().to_vec(),
        });
    }
    Ok(())
}
