//! TBPM CLI - Command-line interface for TBPM Extract
//!
//! Commands:
//! - extract: Summarize participant logs into one results table (batch mode)
//! - inspect: Show the parsed trials and diagnostics of one log
//! - keys: Print the recognized measurement keys

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tbpm_extract::output::{write_batch, write_diagnostics, OutputFormat};
use tbpm_extract::schema::{HEADER_KEYS, MEASUREMENT_KEYS};
use tbpm_extract::{ExtractConfig, ExtractError, ExtractProcessor, TBPM_VERSION};

/// TBPM - Extract time-based prospective memory results from E-Prime logs
#[derive(Parser)]
#[command(name = "tbpm")]
#[command(version = TBPM_VERSION)]
#[command(about = "Summarize E-Prime TBPM logs into per-participant results", long_about = None)]
struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize participant logs into one results table
    Extract {
        /// Participant log files, processed in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Settings file (INI, section [global])
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout); defaults to outfilename
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PM scoring tolerance in seconds; overrides pmthreshold
        #[arg(long)]
        tolerance: Option<f64>,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: FormatArg,

        /// Write per-file diagnostics as NDJSON to this path
        #[arg(long)]
        diagnostics: Option<PathBuf>,
    },

    /// Show the parsed trials and diagnostics of one log as JSON
    Inspect {
        /// Participant log file
        file: PathBuf,

        /// Settings file (INI, section [global])
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// PM scoring tolerance in seconds
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Print the recognized log keys
    Keys {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    /// Comma-separated results table with header
    Csv,
    /// Newline-delimited JSON (one participant per line)
    Ndjson,
    /// JSON report with run metadata and failures
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Ndjson => OutputFormat::Ndjson,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), TbpmCliError> {
    match cli.command {
        Commands::Extract {
            files,
            config,
            output,
            tolerance,
            format,
            diagnostics,
        } => cmd_extract(
            &files,
            config.as_deref(),
            output,
            tolerance,
            format.into(),
            diagnostics.as_deref(),
        ),

        Commands::Inspect {
            file,
            config,
            tolerance,
        } => cmd_inspect(&file, config.as_deref(), tolerance),

        Commands::Keys { json } => cmd_keys(json),
    }
}

fn load_config(path: Option<&Path>, tolerance: Option<f64>) -> Result<ExtractConfig, TbpmCliError> {
    let config = ExtractConfig::load(path)?;
    Ok(match tolerance {
        Some(seconds) => config.with_tolerance(seconds)?,
        None => config,
    })
}

fn cmd_extract(
    files: &[PathBuf],
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    tolerance: Option<f64>,
    format: OutputFormat,
    diagnostics: Option<&Path>,
) -> Result<(), TbpmCliError> {
    let mut config = load_config(config_path, tolerance)?;
    if let Some(path) = output {
        config = config.with_output_path(path);
    }

    let processor = ExtractProcessor::new(&config);
    let batch = processor.process_batch(files)?;

    // Write output
    if config.output_path.to_string_lossy() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_batch(&mut handle, format, &config, &batch)?;
        handle.flush()?;
    } else {
        let file = File::create(&config.output_path)
            .map_err(|e| ExtractError::io(&config.output_path, e))?;
        let mut writer = BufWriter::new(file);
        write_batch(&mut writer, format, &config, &batch)?;
        writer.flush()?;
    }

    if let Some(path) = diagnostics {
        let file = File::create(path).map_err(|e| ExtractError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        write_diagnostics(&mut writer, &batch)?;
        writer.flush()?;
    }

    if batch.is_clean() {
        Ok(())
    } else {
        Err(TbpmCliError::BatchIncomplete(
            batch
                .failures
                .iter()
                .map(|f| f.path.display().to_string())
                .collect(),
        ))
    }
}

fn cmd_inspect(
    file: &Path,
    config_path: Option<&Path>,
    tolerance: Option<f64>,
) -> Result<(), TbpmCliError> {
    let config = load_config(config_path, tolerance)?;
    let processed = ExtractProcessor::new(&config).process_file(file)?;
    println!("{}", serde_json::to_string_pretty(&processed)?);
    Ok(())
}

fn cmd_keys(json: bool) -> Result<(), TbpmCliError> {
    if json {
        let keys: Vec<_> = MEASUREMENT_KEYS
            .iter()
            .map(|(key, field)| serde_json::json!({ "key": key, "field": field }))
            .chain(
                HEADER_KEYS
                    .iter()
                    .map(|(key, field)| serde_json::json!({ "key": key, "header": field })),
            )
            .collect();
        println!("{}", serde_json::to_string_pretty(&keys)?);
    } else {
        println!("Measurement keys");
        println!("================");
        for (key, field) in MEASUREMENT_KEYS {
            println!("  {:<20} -> {}", key, field.as_str());
        }
        println!();
        println!("Header keys");
        println!("===========");
        for (key, field) in HEADER_KEYS {
            println!("  {:<20} -> {:?}", key, field);
        }
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum TbpmCliError {
    Io(io::Error),
    Extract(ExtractError),
    Json(serde_json::Error),
    BatchIncomplete(Vec<String>),
}

impl From<io::Error> for TbpmCliError {
    fn from(e: io::Error) -> Self {
        TbpmCliError::Io(e)
    }
}

impl From<ExtractError> for TbpmCliError {
    fn from(e: ExtractError) -> Self {
        TbpmCliError::Extract(e)
    }
}

impl From<serde_json::Error> for TbpmCliError {
    fn from(e: serde_json::Error) -> Self {
        TbpmCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TbpmCliError> for CliError {
    fn from(e: TbpmCliError) -> Self {
        match e {
            TbpmCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TbpmCliError::Extract(e) => {
                let (code, hint) = match &e {
                    ExtractError::Io { .. } => ("IO_ERROR", "Check file paths and permissions"),
                    ExtractError::Decode { .. } => {
                        ("DECODE_ERROR", "Logs must be UTF-16 or UTF-8 text exported by E-Prime")
                    }
                    ExtractError::Config(_) | ExtractError::Settings(_) => {
                        ("CONFIG_ERROR", "Check settings.ini [global] values")
                    }
                    ExtractError::Csv(_) => ("CSV_ERROR", "Check the output path is writable"),
                    ExtractError::Json(_) => ("JSON_ERROR", "Check the output path is writable"),
                    ExtractError::NoInputs => ("NO_INPUTS", "Pass one or more log files"),
                    ExtractError::EmptyLog(_) => ("EMPTY_LOG", "Re-export the log from E-Prime"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TbpmCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            TbpmCliError::BatchIncomplete(paths) => CliError {
                code: "BATCH_INCOMPLETE".to_string(),
                message: format!("{} file(s) could not be processed: {}", paths.len(), paths.join(", ")),
                hint: Some("Rows for all other files were written; see warnings above".to_string()),
            },
        }
    }
}
