use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use diag_core::Database;
use std::path::{Path, PathBuf};
use std::time::Instant;

mod codec;
mod info;
mod validate;

#[derive(Parser)]
#[command(name = "diag-codec", about = "Encode and decode diagnostic messages described by ODX")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging with timing info
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Display layers, tables and messages of a diagnostic database
    Info {
        /// Input file (.odx, .pdx)
        input: PathBuf,
    },

    /// Check table consistency of a diagnostic database
    Check {
        /// Input file (.odx, .pdx)
        input: PathBuf,

        /// Print summary count only
        #[arg(short, long)]
        summary: bool,
    },

    /// Encode a request from JSON parameter values and print it as hex
    Encode {
        /// Input file (.odx, .pdx)
        input: PathBuf,

        /// Layer short name
        #[arg(short, long)]
        layer: String,

        /// Request short name
        #[arg(short, long)]
        request: String,

        /// Parameter values as a JSON object
        #[arg(long, conflicts_with = "values_file")]
        values: Option<String>,

        /// File containing the parameter values as a JSON object
        #[arg(long)]
        values_file: Option<PathBuf>,
    },

    /// Decode one or more hex messages and print their parameters as JSON
    Decode {
        /// Input file (.odx, .pdx)
        input: PathBuf,

        /// Layer short name
        #[arg(short, long)]
        layer: String,

        /// Request or response short name
        #[arg(short, long)]
        message: String,

        /// Messages as hex strings (e.g. 2E0142)
        #[arg(required = true)]
        pdus: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Odx,
    Pdx,
}

fn detect_format(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("odx") => Ok(Format::Odx),
        Some("pdx") => Ok(Format::Pdx),
        Some(ext) => bail!("Unknown file extension: .{ext}"),
        None => bail!("Cannot detect format: file has no extension"),
    }
}

fn load_database(input: &Path, verbose: bool) -> Result<Database> {
    let in_fmt = detect_format(input).context("input file")?;
    let start = Instant::now();

    let db = match in_fmt {
        Format::Odx => {
            let text = std::fs::read_to_string(input)
                .with_context(|| format!("reading {}", input.display()))?;
            diag_odx::parse_odx(&text)
                .with_context(|| format!("parsing ODX from {}", input.display()))?
        }
        Format::Pdx => diag_odx::read_pdx_file(input)
            .with_context(|| format!("reading PDX from {}", input.display()))?,
    };

    if verbose {
        eprintln!("Load time: {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }
    log::info!("Loaded {} layers from {}", db.layers().count(), input.display());

    Ok(db)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Command::Info { input } => info::run_info(&input, cli.verbose),
        Command::Check { input, summary } => validate::run_check(&input, summary, cli.verbose),
        Command::Encode {
            input,
            layer,
            request,
            values,
            values_file,
        } => codec::run_encode(
            &input,
            &layer,
            &request,
            values.as_deref(),
            values_file.as_deref(),
            cli.verbose,
        ),
        Command::Decode {
            input,
            layer,
            message,
            pdus,
        } => codec::run_decode(&input, &layer, &message, &pdus, cli.verbose),
    }
}
