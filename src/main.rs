//! # llmstxt CLI
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `llmstxt fetch <url> [output]` | Fetch and parse an index; print or save its JSON |
//! | `llmstxt download <input> <dest>` | Download every linked document into a directory |
//! | `llmstxt summarize <input> <dest>` | Write a categorized summary document |
//! | `llmstxt build <url> <dest>` | Run the whole pipeline into one directory |
//!
//! `<input>` is either an http(s) URL or a path to a saved index JSON.
//!
//! ## Exit codes
//!
//! `0` success, `1` usage, `2` input/network, `3` output/parse,
//! `4` nothing downloaded. Results go to stdout as JSON; everything else
//! goes to stderr.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use llmstxt::config::{self, Config};
use llmstxt::error::{Error, Result, EXIT_OK, EXIT_USAGE};
use llmstxt::progress::ProgressMode;
use llmstxt::{download, index, pipeline, summary};

const DEFAULT_CONFIG: &str = "./llmstxt.toml";

/// Fetch llms.txt indexes, download their references, and summarize them.
#[derive(Parser)]
#[command(
    name = "llmstxt",
    version,
    arg_required_else_help = true,
    about = "Fetch llms.txt indexes, download their references, and summarize them",
    long_about = "Fetches an llms.txt-style index document, parses its link list, downloads \
    every linked document with bounded concurrency and per-request timeouts, and writes a \
    categorized summary. JSON results go to stdout; progress and warnings go to stderr."
)]
struct Cli {
    /// Path to a configuration file (TOML).
    ///
    /// Defaults to `./llmstxt.toml` when present; built-in defaults apply
    /// otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and parse an index document.
    ///
    /// Prints the parsed index as JSON, or writes it to OUTPUT instead.
    Fetch {
        /// Index URL (http or https).
        url: String,

        /// Write the index JSON here instead of stdout.
        output: Option<PathBuf>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Download every document an index links to.
    ///
    /// Links are fetched in batches; a failed link never stops the others.
    /// Prints a JSON report. Exits 4 if nothing could be downloaded.
    Download {
        /// Index URL, or path to an index JSON written by `fetch`.
        input: String,

        /// Directory to write the documents into (created if missing).
        dest: PathBuf,

        /// Concurrent fetches per batch.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Progress output on stderr. Defaults to human on a TTY, JSON otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Write a categorized summary document for an index.
    Summarize {
        /// Index URL, or path to an index JSON written by `fetch`.
        input: String,

        /// Output directory, or a `.md` file path.
        dest: PathBuf,

        /// Directory holding downloaded references; links without a file
        /// there are marked as not downloaded.
        #[arg(long)]
        references: Option<PathBuf>,

        /// Per-request timeout in seconds (when INPUT is a URL).
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Fetch, download and summarize into one directory.
    Build {
        /// Index URL (http or https).
        url: String,

        /// Destination directory.
        dest: PathBuf,

        /// Concurrent fetches per batch.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Progress output on stderr. Defaults to human on a TTY, JSON otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },
}

impl Commands {
    fn overrides(&self) -> (Option<u64>, Option<usize>) {
        match self {
            Commands::Fetch { timeout, .. } | Commands::Summarize { timeout, .. } => {
                (*timeout, None)
            }
            Commands::Download {
                timeout,
                batch_size,
                ..
            }
            | Commands::Build {
                timeout,
                batch_size,
                ..
            } => (*timeout, *batch_size),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return usage_exit(e),
    };

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::from(EXIT_OK as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Help and version requested explicitly exit 0; help shown because
/// arguments are missing, and every other usage error, exit 1.
fn usage_exit(err: clap::Error) -> ExitCode {
    let _ = err.print();
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::from(EXIT_OK as u8),
        _ => ExitCode::from(EXIT_USAGE as u8),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(p) => config::load_config(p),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::minimal()),
    };
    loaded.map_err(|e| Error::InvalidArgument(format!("{:#}", e)))
}

async fn run(cli: Cli) -> Result<()> {
    let (timeout, batch_size) = cli.command.overrides();
    let cfg = load_config(cli.config.as_deref())?
        .with_overrides(timeout, batch_size)
        .map_err(|e| Error::InvalidArgument(format!("{:#}", e)))?;

    match cli.command {
        Commands::Fetch { url, output, .. } => {
            index::run_fetch(&cfg, &url, output.as_deref()).await?;
        }
        Commands::Download {
            input,
            dest,
            progress,
            ..
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            download::run_download(&cfg, &input, &dest, mode).await?;
        }
        Commands::Summarize {
            input,
            dest,
            references,
            ..
        } => {
            summary::run_summarize(&cfg, &input, &dest, references.as_deref()).await?;
        }
        Commands::Build {
            url,
            dest,
            progress,
            ..
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            pipeline::run_build(&cfg, &url, &dest, mode).await?;
        }
    }

    Ok(())
}
