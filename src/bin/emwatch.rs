//! Emwatch CLI - Command-line interface for the Emwatch engine
//!
//! Commands:
//! - average: Compute windowed time-weighted averages over a reading file
//! - densify: Run the gap backfiller over a reading file
//! - classify: Classify a raw signal measurement
//! - ambient: Estimate ambient broadcast exposure
//! - measures: List built-in signal measure descriptors

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use emwatch::ambient::{estimate, Environment, ExposureProfile, SourceCounts};
use emwatch::averaging::time_weighted_average;
use emwatch::quality::{SignalMeasure, MEASURES};
use emwatch::store::ExposureSeriesStore;
use emwatch::types::{Reading, WindowAverages};
use emwatch::{EngineError, EMWATCH_VERSION};

/// Emwatch - On-device aggregation engine for personal RF exposure monitoring
#[derive(Parser)]
#[command(name = "emwatch")]
#[command(version = EMWATCH_VERSION)]
#[command(about = "Aggregate and evaluate RF exposure readings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute windowed time-weighted averages over a reading file
    Average {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Window start (milliseconds since the Unix epoch)
        #[arg(long)]
        start: i64,

        /// Window end (exclusive, milliseconds since the Unix epoch)
        #[arg(long)]
        end: i64,

        /// Cap on how long a held value may persist (milliseconds)
        #[arg(long)]
        max_gap: Option<i64>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Run the gap backfiller over a reading file and emit the densified series
    Densify {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Classify a raw signal measurement
    Classify {
        /// Measure name (rsrp, rsrq, snr)
        #[arg(short, long)]
        measure: String,

        /// Raw measurement value
        #[arg(short, long)]
        value: Option<f64>,

        /// Classify an absent measurement (always "none")
        #[arg(long, conflicts_with = "value")]
        absent: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate ambient broadcast exposure
    Ambient {
        /// Strong FM transmitters nearby
        #[arg(long, default_value = "0")]
        fm_strong: u32,

        /// Weak FM transmitters nearby
        #[arg(long, default_value = "0")]
        fm_weak: u32,

        /// Strong AM transmitters nearby
        #[arg(long, default_value = "0")]
        am_strong: u32,

        /// TV channels receivable over the air
        #[arg(long, default_value = "0")]
        tv_open_air: u32,

        /// TV channels receivable with an antenna
        #[arg(long, default_value = "0")]
        tv_antenna: u32,

        /// Environment category (urban, suburban, rural)
        #[arg(long, default_value = "suburban")]
        environment: String,

        /// Estimation profile (conservative, average, maximal)
        #[arg(long, default_value = "average")]
        profile: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in signal measure descriptors
    Measures {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
    /// JSON array of readings
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
    /// JSON array of readings
    Json,
    /// Pretty-printed JSON
    JsonPretty,
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

fn run(cli: Cli) -> Result<(), EmwatchCliError> {
    match cli.command {
        Commands::Average {
            input,
            input_format,
            start,
            end,
            max_gap,
            pretty,
        } => cmd_average(&input, input_format, start, end, max_gap, pretty),

        Commands::Densify {
            input,
            output,
            input_format,
            output_format,
        } => cmd_densify(&input, &output, input_format, output_format),

        Commands::Classify {
            measure,
            value,
            absent,
            json,
        } => cmd_classify(&measure, value, absent, json),

        Commands::Ambient {
            fm_strong,
            fm_weak,
            am_strong,
            tv_open_air,
            tv_antenna,
            environment,
            profile,
            json,
        } => {
            let counts = SourceCounts {
                fm_strong,
                fm_weak,
                am_strong,
                tv_open_air,
                tv_antenna,
            };
            cmd_ambient(&counts, &environment, &profile, json)
        }

        Commands::Measures { json } => cmd_measures(json),
    }
}

fn cmd_average(
    input: &Path,
    input_format: InputFormat,
    start: i64,
    end: i64,
    max_gap: Option<i64>,
    pretty: bool,
) -> Result<(), EmwatchCliError> {
    if let Some(gap) = max_gap {
        if gap <= 0 {
            return Err(EmwatchCliError::InvalidGapCap(gap));
        }
    }

    let readings = read_readings(input, &input_format)?;

    let averages = WindowAverages {
        wifi: time_weighted_average(&readings, start, end, |r| r.wifi_level, max_gap),
        sar: time_weighted_average(&readings, start, end, |r| r.sar_level, max_gap),
        bluetooth: time_weighted_average(&readings, start, end, |r| r.bluetooth_level, max_gap),
    };

    if pretty {
        println!("{}", serde_json::to_string_pretty(&averages)?);
    } else {
        println!("{}", serde_json::to_string(&averages)?);
    }

    Ok(())
}

fn cmd_densify(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), EmwatchCliError> {
    let readings = read_readings(input, &input_format)?;

    if readings.is_empty() {
        return Err(EmwatchCliError::NoReadings);
    }

    let store = ExposureSeriesStore::new();
    store.ingest_batch(readings);
    let densified = store.snapshot();

    let output_data = format_readings(&densified, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_classify(
    measure: &str,
    value: Option<f64>,
    absent: bool,
    json: bool,
) -> Result<(), EmwatchCliError> {
    if value.is_none() && !absent {
        return Err(EmwatchCliError::MissingValue);
    }

    let descriptor = SignalMeasure::by_name(measure)?;
    let quality = descriptor.classify(value);

    if json {
        let report = serde_json::json!({
            "measure": descriptor.name,
            "unit": descriptor.unit,
            "value": value,
            "quality": quality,
        });
        println!("{}", serde_json::to_string(&report)?);
    } else {
        match value {
            Some(raw) => println!(
                "{} {} {} -> {}",
                descriptor.name,
                raw,
                descriptor.unit,
                quality.as_str()
            ),
            None => println!("{} absent -> {}", descriptor.name, quality.as_str()),
        }
    }

    Ok(())
}

fn cmd_ambient(
    counts: &SourceCounts,
    environment: &str,
    profile: &str,
    json: bool,
) -> Result<(), EmwatchCliError> {
    let environment = Environment::parse_or_default(environment);
    let profile = ExposureProfile::parse_or_default(profile);
    let result = estimate(counts, environment, profile);

    if json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("Ambient Exposure Estimate");
        println!("=========================");
        println!("Composite index:   {} / 100", result.composite_index);
        println!("FM density:        {:.3e} W/m2", result.fm_density_w_m2);
        println!("TV density:        {:.3e} W/m2", result.tv_density_w_m2);
        println!("AM density:        {:.3e} W/m2", result.am_density_w_m2);
        println!("Total density:     {:.3e} W/m2", result.total_density_w_m2);
        println!("SAR (total):       {:.3e} W/kg", result.sar_total_w_kg);
        println!("SAR (broadcast):   {:.3e} W/kg", result.sar_broadcast_w_kg);
    }

    Ok(())
}

fn cmd_measures(json: bool) -> Result<(), EmwatchCliError> {
    if json {
        let report: Vec<serde_json::Value> = MEASURES
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "unit": m.unit,
                    "min_value": m.min_value,
                    "max_value": m.max_value,
                })
            })
            .collect();
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("Built-in signal measures:");
        for m in MEASURES.iter() {
            println!("  {:>5} ({}): {} .. {}", m.name, m.unit, m.min_value, m.max_value);
        }
    }

    Ok(())
}

// Helper functions

fn read_readings(input: &Path, format: &InputFormat) -> Result<Vec<Reading>, EmwatchCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading from terminal; pipe readings or pass --input FILE");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    match format {
        InputFormat::Ndjson => input_data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).map_err(EmwatchCliError::from))
            .collect(),
        InputFormat::Json => Ok(serde_json::from_str(&input_data)?),
    }
}

fn format_readings(readings: &[Reading], format: &OutputFormat) -> Result<String, EmwatchCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for reading in readings {
                lines.push(serde_json::to_string(reading)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(readings)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(readings)?),
    }
}

// Error types

#[derive(Debug)]
enum EmwatchCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Engine(EngineError),
    NoReadings,
    MissingValue,
    InvalidGapCap(i64),
}

impl From<io::Error> for EmwatchCliError {
    fn from(e: io::Error) -> Self {
        EmwatchCliError::Io(e)
    }
}

impl From<serde_json::Error> for EmwatchCliError {
    fn from(e: serde_json::Error) -> Self {
        EmwatchCliError::Json(e)
    }
}

impl From<EngineError> for EmwatchCliError {
    fn from(e: EngineError) -> Self {
        EmwatchCliError::Engine(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EmwatchCliError> for CliError {
    fn from(e: EmwatchCliError) -> Self {
        match e {
            EmwatchCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EmwatchCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax and reading fields".to_string()),
            },
            EmwatchCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'emwatch measures' for the supported measures".to_string()),
            },
            EmwatchCliError::NoReadings => CliError {
                code: "NO_READINGS".to_string(),
                message: "No readings found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            EmwatchCliError::MissingValue => CliError {
                code: "MISSING_VALUE".to_string(),
                message: "No measurement value supplied".to_string(),
                hint: Some("Pass --value N, or --absent for a missing measurement".to_string()),
            },
            EmwatchCliError::InvalidGapCap(gap) => CliError {
                code: "INVALID_GAP_CAP".to_string(),
                message: format!("Gap cap must be positive, got {}", gap),
                hint: Some("Pass --max-gap with a positive millisecond value".to_string()),
            },
        }
    }
}
