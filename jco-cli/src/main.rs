//! JCO CLI - JSON columnar compression
//!
//! Verbs:
//! - compress / decompress: whole-JSON documents
//! - compress-ndjson / decompress-ndjson: NDJSON streams, optionally
//!   columnar, with `--fields` for selective decode
//!
//! Exits 0 on success; any fatal error prints a single-line diagnostic to
//! stderr and exits 1.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use jco_format::JcoError;
use jco_io::{CodecChoice, CompressOptions, DecodeOptions, NdjsonOptions, Profile};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inputs larger than this get a progress spinner.
const SPINNER_THRESHOLD_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "jco")]
#[command(about = "JSON columnar compression with selective field decode")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Timestamp/enum-heavy log streams.
    Logs,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a single JSON document
    Compress {
        /// Input file (JSON)
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Back-end: hybrid, fast, dense, or identity
        #[arg(long, default_value = "hybrid")]
        codec: String,
        /// Compress hybrid windows on a worker pool
        #[arg(long)]
        parallel: bool,
    },
    /// Decompress a single JSON document
    Decompress {
        /// Input file (.jco)
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compress NDJSON
    CompressNdjson {
        /// Input file (NDJSON)
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Back-end: hybrid, fast, dense, or identity
        #[arg(long, default_value = "hybrid")]
        codec: String,
        /// Transpose records into per-field columns
        #[arg(long)]
        columnar: bool,
        /// Input-shape hint
        #[arg(long, value_enum)]
        profile: Option<ProfileArg>,
        /// Compress hybrid windows on a worker pool
        #[arg(long)]
        parallel: bool,
    },
    /// Decompress NDJSON, optionally projecting a field subset
    DecompressNdjson {
        /// Input file (.jco)
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Comma-separated field names for selective decode
        #[arg(long)]
        fields: Option<String>,
    },
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), JcoError> {
    match cli.command {
        Commands::Compress {
            input,
            output,
            codec,
            parallel,
        } => {
            let text = read_text(&input)?;
            let opts = CompressOptions {
                codec: CodecChoice::parse(&codec),
                parallel,
                ..CompressOptions::default()
            };
            let spinner = maybe_spinner(&input, "compressing");
            let bytes = jco_io::compress(&text, &opts)?;
            finish(spinner);
            std::fs::write(&output, bytes)?;
        }
        Commands::Decompress { input, output } => {
            let bytes = std::fs::read(&input)?;
            let text = jco_io::decompress(&bytes)?;
            std::fs::write(&output, text)?;
        }
        Commands::CompressNdjson {
            input,
            output,
            codec,
            columnar,
            profile,
            parallel,
        } => {
            let text = read_text(&input)?;
            let opts = NdjsonOptions {
                codec: CodecChoice::parse(&codec),
                columnar,
                profile: profile.map(|ProfileArg::Logs| Profile::Logs),
                parallel,
                ..NdjsonOptions::default()
            };
            let spinner = maybe_spinner(&input, "compressing");
            let bytes = jco_io::compress_ndjson(&text, &opts)?;
            finish(spinner);
            std::fs::write(&output, bytes)?;
        }
        Commands::DecompressNdjson {
            input,
            output,
            fields,
        } => {
            let bytes = std::fs::read(&input)?;
            let opts = DecodeOptions {
                fields: fields
                    .map(|list| {
                        list.split(',')
                            .map(str::trim)
                            .filter(|name| !name.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
                ..DecodeOptions::default()
            };
            let text = jco_io::decompress_ndjson(&bytes, &opts)?;
            std::fs::write(&output, text)?;
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String, JcoError> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes)
        .map_err(|_| JcoError::InputInvalid(format!("{} is not UTF-8", path.display())))
}

fn maybe_spinner(input: &Path, label: &'static str) -> Option<ProgressBar> {
    let size = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);
    if size < SPINNER_THRESHOLD_BYTES {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    bar.set_message(label);
    bar.enable_steady_tick(Duration::from_millis(120));
    Some(bar)
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
}
