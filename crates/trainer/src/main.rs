//! IPL predictor training CLI
//!
//! Fits the win probability pipeline on a local CSV export of match history
//! and writes the model artifacts.

use anyhow::{Context, Result};
use clap::Parser;
use ipl_predictor_core::{ArtifactPaths, ClassWeight, PredictorConfig};
use ipl_predictor_trainer::{load_matches, MatchTrainer};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ipl-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train the IPL match winner predictor", long_about = None)]
struct Args {
    /// Input CSV of historical matches
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for artifacts [default: artifacts]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inverse regularization strength
    #[arg(long)]
    c: Option<f64>,

    /// Maximum solver iterations
    #[arg(long)]
    max_iter: Option<usize>,

    /// Convergence tolerance on the gradient norm
    #[arg(long)]
    tolerance: Option<f64>,

    /// Weight every sample equally instead of balancing the classes
    #[arg(long)]
    no_class_weight: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("IPL predictor trainer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = PredictorConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(output) = args.output {
        config.artifacts.dir = output;
    }
    if let Some(c) = args.c {
        config.training.c = c;
    }
    if let Some(max_iter) = args.max_iter {
        config.training.max_iter = max_iter;
    }
    if let Some(tolerance) = args.tolerance {
        config.training.tolerance = tolerance;
    }
    if args.no_class_weight {
        config.training.class_weight = ClassWeight::None;
    }
    config.validate().context("Invalid training configuration")?;

    info!("Training configuration:");
    info!("  C: {}", config.training.c);
    info!("  Max iterations: {}", config.training.max_iter);
    info!("  Tolerance: {:e}", config.training.tolerance);
    info!("  Class weight: {:?}", config.training.class_weight);

    let table = load_matches(&args.input)
        .with_context(|| format!("Failed to load dataset {}", args.input.display()))?;

    let paths = ArtifactPaths::from_config(&config.artifacts);
    let outcome = MatchTrainer::new(config.training.clone())
        .train(&table, &paths)
        .context("Training failed")?;

    let report = outcome.report();
    info!("Training complete");
    info!(
        "  Rows: {} used, {} dropped",
        report.rows_used, report.rows_dropped
    );
    info!("  Encoded width: {}", report.encoded_width);
    info!(
        "  Solver: {} iterations (converged={})",
        report.solver_iterations, report.converged
    );
    info!("  Model: {}", paths.model.display());
    info!("  Features: {}", paths.features.display());
    info!("  Hash: {}", outcome.saved.model_hash);

    println!("In-sample ROC AUC: {:.3}", outcome.in_sample_auc());

    Ok(())
}
