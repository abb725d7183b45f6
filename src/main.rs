//! Implantometrics: Invasion Factor scoring
//!
//! Usage:
//!   implantometrics score --time 24 --measurements sample.json
//!   implantometrics timeline --measurements series.json --json
//!   implantometrics shap --time 24

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use implantometrics::adapters::{load_measurements, CalibrationSlot, CsvShapTables};
use implantometrics::application::{InvasionFactorService, ScoringSession, ShapWindowExtractor};
use implantometrics::config::ScoringConfig;
use implantometrics::domain::Calibrator;
use implantometrics::{InvasionReport, ObservationTime};

static CALIBRATOR: CalibrationSlot = CalibrationSlot::new();

#[derive(Parser)]
#[command(name = "implantometrics")]
#[command(about = "Invasion Factor scoring from SHAP tables and extracted spheroid parameters")]
#[command(version)]
struct Cli {
    /// Directory containing the SHAP tables (overrides IMPLANTO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Calibration artifact (overrides IMPLANTO_CALIBRATION)
    #[arg(long, global = true)]
    calibration: Option<PathBuf>,

    /// Refuse to score without a calibration model
    #[arg(long, global = true)]
    strict_calibration: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every record of a measurement file at one observation time
    Score {
        /// Observation time in hours (0-143)
        #[arg(long, allow_negative_numbers = true)]
        time: ObservationTime,

        /// Measurement JSON file (one record or an array)
        #[arg(long)]
        measurements: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score a time series in order, sharing one score history
    Timeline {
        /// Measurement JSON array; every record needs `time_h`
        #[arg(long)]
        measurements: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the merged SHAP values for the bucket containing a time
    Shap {
        /// Observation time in hours (0-143)
        #[arg(long, allow_negative_numbers = true)]
        time: ObservationTime,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Stdout carries results; logs go to stderr unless a file is requested.
    let log_mode = std::env::var("IMPLANTO_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file = std::env::var("IMPLANTO_LOG_FILE")
            .unwrap_or_else(|_| "implantometrics.log".to_string());

        if let Some(parent) = Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("opening log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    Ok(guard)
}

fn resolve_config(cli: &Cli) -> ScoringConfig {
    let mut config = ScoringConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        // Keep an explicitly configured calibration path; otherwise follow the data dir.
        let calibration = ScoringConfig::with_data_dir(&config.data_dir).calibration_path;
        let follow = config.calibration_path == calibration;
        config.data_dir = dir.clone();
        if follow {
            config.calibration_path = ScoringConfig::with_data_dir(dir).calibration_path;
        }
    }
    if let Some(path) = &cli.calibration {
        config.calibration_path = path.clone();
    }
    config.strict_calibration |= cli.strict_calibration;
    config
}

fn build_service(config: &ScoringConfig) -> Result<InvasionFactorService<CsvShapTables>> {
    let calibrator: Arc<Calibrator> = CALIBRATOR.get_or_load(&config.calibration_path);
    if config.strict_calibration && !calibrator.is_loaded() {
        bail!(
            "calibration model unavailable at {} (strict calibration enabled)",
            config.calibration_path.display()
        );
    }

    let tables = Arc::new(CsvShapTables::new(&config.data_dir));
    let extractor = ShapWindowExtractor::new(tables, config.tables.clone());
    Ok(InvasionFactorService::new(extractor, calibrator))
}

fn print_reports(reports: &[InvasionReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    println!(
        "{:>6}  {:>7}  {:>5}  {:>12}  {:>15}  {}",
        "time_h", "bucket", "group", "raw_score", "invasion_factor", "calibrated"
    );
    for report in reports {
        println!(
            "{:>6}  {:>7}  {:>5}  {:>12.6}  {:>15.6}  {}",
            report.time_h.hours(),
            report.bucket.to_string(),
            report.group.to_string(),
            report.raw_score,
            report.invasion_factor,
            if report.calibrated { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    let config = resolve_config(&cli);
    tracing::info!(
        "Starting Implantometrics (data_dir={:?}, calibration={:?})",
        config.data_dir,
        config.calibration_path
    );
    let service = build_service(&config)?;

    match cli.command {
        Commands::Score {
            time,
            measurements,
            json,
        } => {
            let records = load_measurements(&measurements)
                .with_context(|| format!("reading {}", measurements.display()))?;
            let mut reports = Vec::with_capacity(records.len());
            for record in &records {
                reports.push(service.score(&mut ScoringSession::new(), time, record, record)?);
            }
            print_reports(&reports, json)?;
        }

        Commands::Timeline { measurements, json } => {
            let mut records = load_measurements(&measurements)
                .with_context(|| format!("reading {}", measurements.display()))?;
            if let Some(index) = records.iter().position(|r| r.time_h.is_none()) {
                bail!("record {index} has no time_h; timeline scoring needs one per record");
            }
            records.sort_by_key(|r| r.time_h);

            let mut session = ScoringSession::new();
            let mut reports = Vec::with_capacity(records.len());
            for record in &records {
                let Some(time) = record.time_h else { continue };
                reports.push(service.score(&mut session, time, record, record)?);
            }
            print_reports(&reports, json)?;
        }

        Commands::Shap { time, json } => {
            let values = service.extract_shap(time)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                println!("bucket {}", time.bucket());
                for (name, value) in values.iter() {
                    println!("{name:<40} {value:>12.6}");
                }
            }
        }
    }

    tracing::info!("Implantometrics done.");
    Ok(())
}
