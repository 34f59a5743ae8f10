//! pulsealign CLI
//!
//! Commands:
//! - generate: Write a synthetic device pair as NDJSON track files
//! - compare: Reconcile two track files and report agreement
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pulsealign::profile::ProfileConfig;
use pulsealign::simulate::{DeviceConfig, SimulationConfig, DEFAULT_SEED};
use pulsealign::stats::StatsReporter;
use pulsealign::track::{TrackCodec, TRACK_SCHEMA_VERSION};
use pulsealign::types::RawStream;
use pulsealign::{compare_streams, generate_pair, CompareError, PULSEALIGN_VERSION};

/// pulsealign - Compare paired heart-rate tracks and simulate device pairs
#[derive(Parser)]
#[command(name = "pulsealign")]
#[command(version = PULSEALIGN_VERSION)]
#[command(about = "Reconcile paired heart-rate tracks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic device pair as NDJSON track files
    Generate {
        /// Output directory for the track files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Random seed; omit for fresh entropy, pass for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Use the fixed default seed (reproducible runs without choosing one)
        #[arg(long, conflicts_with = "seed")]
        reproducible: bool,

        /// Warmup duration in seconds
        #[arg(long, default_value = "300")]
        warmup_secs: f64,

        /// Exercise duration in seconds
        #[arg(long, default_value = "1200")]
        exercise_secs: f64,

        /// Cooldown duration in seconds
        #[arg(long, default_value = "300")]
        cooldown_secs: f64,

        /// Resting heart rate in bpm
        #[arg(long, default_value = "60")]
        resting_hr: f64,

        /// Exercise plateau heart rate in bpm
        #[arg(long, default_value = "150")]
        exercise_hr: f64,

        /// Sampling interval in seconds
        #[arg(long, default_value = "1")]
        sample_interval_secs: f64,

        /// Per-tick gap probability
        #[arg(long, default_value = "0.03")]
        gap_probability: f64,

        /// Per-tick duplicate-timestamp probability
        #[arg(long, default_value = "0.1")]
        duplicate_probability: f64,

        /// Half-width of the uniform per-device bias range in bpm
        #[arg(long, default_value = "10")]
        bias_bpm: f64,

        /// Noise mean-reversion rate (1/s)
        #[arg(long, default_value = "0.3")]
        noise_reversion_rate: f64,

        /// Noise volatility (bpm per root-second)
        #[arg(long, default_value = "2")]
        noise_volatility: f64,
    },

    /// Reconcile two track files and report agreement
    Compare {
        /// First device's track file (use - for stdin)
        track_a: PathBuf,

        /// Second device's track file
        track_b: PathBuf,

        /// Report format
        #[arg(long, default_value = "text")]
        format: ReportFormat,

        /// Write the aligned table as NDJSON for external plotting
        #[arg(long)]
        dump_aligned: Option<PathBuf>,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    /// Human-readable summary block
    Text,
    /// Pretty-printed JSON report
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Generate {
            output_dir,
            seed,
            reproducible,
            warmup_secs,
            exercise_secs,
            cooldown_secs,
            resting_hr,
            exercise_hr,
            sample_interval_secs,
            gap_probability,
            duplicate_probability,
            bias_bpm,
            noise_reversion_rate,
            noise_volatility,
        } => {
            let device = DeviceConfig {
                bias_range: (-bias_bpm, bias_bpm),
                noise_reversion_rate,
                noise_volatility,
                gap_probability,
                duplicate_probability,
                ..DeviceConfig::default()
            };
            let config = SimulationConfig {
                profile: ProfileConfig {
                    warmup_secs,
                    exercise_secs,
                    cooldown_secs,
                    resting_hr,
                    exercise_hr,
                    sample_interval_secs,
                },
                device_a: device.clone(),
                device_b: device,
                seed: match (seed, reproducible) {
                    (Some(s), _) => Some(s),
                    (None, true) => Some(DEFAULT_SEED),
                    (None, false) => None,
                },
                ..SimulationConfig::default()
            };
            cmd_generate(&output_dir, &config)
        }

        Commands::Compare {
            track_a,
            track_b,
            format,
            dump_aligned,
        } => cmd_compare(&track_a, &track_b, format, dump_aligned.as_deref()),

        Commands::Doctor { json } => cmd_doctor(json),
    }
}

fn cmd_generate(output_dir: &Path, config: &SimulationConfig) -> Result<(), PulseCliError> {
    fs::create_dir_all(output_dir)?;

    let (a, b) = generate_pair(config)?;

    let path_a = output_dir.join(format!("{}.ndjson", a.device));
    let path_b = output_dir.join(format!("{}.ndjson", b.device));
    TrackCodec::write_file(&a, &path_a)?;
    TrackCodec::write_file(&b, &path_b)?;

    println!("Generated synthetic track files:");
    println!("  {}: {} records", path_a.display(), a.len());
    println!("  {}: {} records", path_b.display(), b.len());
    Ok(())
}

fn cmd_compare(
    track_a: &Path,
    track_b: &Path,
    format: ReportFormat,
    dump_aligned: Option<&Path>,
) -> Result<(), PulseCliError> {
    let a = read_track(track_a)?;
    let b = read_track(track_b)?;

    let comparison = compare_streams(&a, &b)?;

    if let Some(path) = dump_aligned {
        let mut out = String::new();
        for row in &comparison.table.rows {
            out.push_str(&serde_json::to_string(row)?);
            out.push('\n');
        }
        fs::write(path, out)?;
    }

    match format {
        ReportFormat::Text => print!("{}", StatsReporter::render_text(&comparison.report)),
        ReportFormat::Json => println!("{}", StatsReporter::render_json(&comparison.report)?),
    }

    Ok(())
}

fn read_track(path: &Path) -> Result<RawStream, PulseCliError> {
    if path.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(PulseCliError::StdinIsTty);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(TrackCodec::parse_ndjson(&buffer, "stdin")?)
    } else {
        Ok(TrackCodec::read_file(path)?)
    }
}

fn cmd_doctor(json: bool) -> Result<(), PulseCliError> {
    let checks = vec![
        DoctorCheck {
            name: "pulsealign_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("pulsealign version {}", PULSEALIGN_VERSION),
        },
        DoctorCheck {
            name: "track_schema".to_string(),
            status: CheckStatus::Ok,
            message: format!("Track schema: {}", TRACK_SCHEMA_VERSION),
        },
        DoctorCheck {
            name: "default_config".to_string(),
            status: match ProfileConfig::default().validate() {
                Ok(()) => CheckStatus::Ok,
                Err(_) => CheckStatus::Error,
            },
            message: "Default profile configuration validates".to_string(),
        },
        DoctorCheck {
            name: "default_seed".to_string(),
            status: CheckStatus::Ok,
            message: format!("Reproducible default seed: {}", DEFAULT_SEED),
        },
    ];

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        println!("pulsealign doctor");
        println!("=================");
        for check in &checks {
            let marker = match check.status {
                CheckStatus::Ok => "ok",
                CheckStatus::Error => "error",
            };
            println!("  [{}] {}: {}", marker, check.name, check.message);
        }
    }

    if checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Compare(CompareError),
    Json(serde_json::Error),
    StdinIsTty,
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<CompareError> for PulseCliError {
    fn from(e: CompareError) -> Self {
        PulseCliError::Compare(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "io_error".to_string(),
                message: e.to_string(),
            },
            PulseCliError::Compare(e) => CliError {
                code: "compare_error".to_string(),
                message: e.to_string(),
            },
            PulseCliError::Json(e) => CliError {
                code: "json_error".to_string(),
                message: e.to_string(),
            },
            PulseCliError::StdinIsTty => CliError {
                code: "stdin_is_tty".to_string(),
                message: "stdin is a terminal; pipe NDJSON track data or pass a file".to_string(),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "doctor_failed".to_string(),
                message: "One or more doctor checks failed".to_string(),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Ok,
    Error,
}
