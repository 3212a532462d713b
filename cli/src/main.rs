//! copyverify - command-line front end for the verification engine.
//!
//! Parses arguments, builds the walk configuration, installs the Ctrl-C
//! cancellation handler and renders the final report. All comparison logic
//! lives in the engine crate.

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use engine::{
    compare, CancellationToken, CheckConfig, CheckEventSink, ChecksumAlgorithm, Conflict,
    DigestPool, DirEntry, WalkError, WalkMeta, WalkOutcome, WalkStatus,
};

const DEFAULT_ALGORITHM: &str = "md5";
const NO_CHECKSUM: &str = "none";

/// Verify that a directory tree is a faithful copy of another
#[derive(Parser, Debug)]
#[command(name = "copyverify")]
#[command(version)]
#[command(about = "Verify that a destination directory tree is a faithful copy of a source tree")]
struct Args {
    /// Source directory (the original)
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Destination directory (the copy under verification)
    #[arg(value_name = "DESTINATION")]
    destination: PathBuf,

    /// Stop scanning a directory at its first problem and skip its subdirectories
    #[arg(short = 'f', long)]
    fail_fast: bool,

    /// With --fail-fast, also stop listing destination-only entries early
    #[arg(short = 'u', long)]
    fail_on_destination: bool,

    /// Skip file size comparison
    #[arg(short = 's', long)]
    no_size_check: bool,

    /// Checksum algorithm: md5, sha256, blake3, crc32, or none [default: md5]
    #[arg(short = 'c', long, value_name = "ALGORITHM")]
    checksum: Option<String>,

    /// Digest both sides of a file pair sequentially instead of in parallel
    #[arg(short = 'p', long)]
    no_parallel: bool,

    /// Report problems as they are found and enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Walk(WalkError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(message) => write!(f, "{}", message),
            CliError::Walk(err) => write!(f, "{}", err),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Translate CLI flags into a walk configuration.
///
/// Checksum verification needs the size pre-check to skip obviously unequal
/// files, so `--no-size-check` either silently drops the default algorithm
/// or rejects an explicitly requested one.
fn build_config(args: &Args) -> Result<CheckConfig, CliError> {
    let mut config = CheckConfig::new();
    config.fail_fast = args.fail_fast;
    config.fail_on_destination = args.fail_on_destination;
    config.check_size = !args.no_size_check;

    let requested = args.checksum.as_deref();
    config.checksum = if args.no_size_check {
        println!("Size verification disabled");
        match requested {
            Some(name) if !name.eq_ignore_ascii_case(NO_CHECKSUM) => {
                return Err(CliError::Usage(format!(
                    "--checksum {} cannot be combined with --no-size-check",
                    name
                )));
            }
            _ => {
                println!("Checksum verification disabled");
                None
            }
        }
    } else {
        let name = requested.unwrap_or(DEFAULT_ALGORITHM);
        if name.eq_ignore_ascii_case(NO_CHECKSUM) {
            println!("Checksum verification disabled");
            None
        } else {
            Some(ChecksumAlgorithm::from_name(name).ok_or_else(|| {
                CliError::Usage(format!("unknown checksum algorithm: {}", name))
            })?)
        }
    };

    if args.no_parallel {
        println!("Parallel digesting disabled");
    } else if config.checksum_enabled() {
        config = config.with_digest_pool(DigestPool::new());
    }

    Ok(config.init())
}

/// Live issue reporting to stderr, enabled by `--verbose`.
struct CliReporter {
    verbose: bool,
}

impl CheckEventSink for CliReporter {
    fn on_missing_in_destination(&self, source_dir: &Path, _destination_dir: &Path, entry: &DirEntry) {
        if self.verbose {
            eprintln!(
                "missing in destination: {}",
                source_dir.join(&entry.name).display()
            );
        }
    }

    fn on_missing_in_source(&self, _source_dir: &Path, destination_dir: &Path, entry: &DirEntry) {
        if self.verbose {
            eprintln!(
                "unexpected in destination: {}",
                destination_dir.join(&entry.name).display()
            );
        }
    }

    fn on_conflict(
        &self,
        source_dir: &Path,
        _destination_dir: &Path,
        source_entry: &DirEntry,
        _destination_entry: &DirEntry,
        conflict: &Conflict,
    ) {
        if self.verbose {
            eprintln!(
                "conflict: {} ({})",
                source_dir.join(&source_entry.name).display(),
                conflict
            );
        }
    }
}

fn marker(entry: &DirEntry) -> &'static str {
    if entry.is_dir {
        "[D] "
    } else {
        ""
    }
}

/// Elapsed-time rendering: `h:mm:ss` above an hour, `m:ss.d` above a
/// minute, `s.mmm` below.
fn format_time(elapsed: Duration) -> String {
    let total_seconds = elapsed.as_secs();
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        let millis = elapsed.subsec_millis();
        if minutes > 0 {
            format!("{}:{:02}.{}", minutes, seconds, millis / 100)
        } else {
            format!("{}.{:03}", seconds, millis)
        }
    }
}

fn print_report(outcome: &WalkOutcome) {
    println!("Directories with problems: {}", outcome.results.len());

    for cr in &outcome.results {
        println!(
            "{} ({}):",
            cr.source_path.display(),
            cr.destination_path.display()
        );
        if !cr.missing_in_destination.is_empty() {
            println!(
                " missing in destination: {}",
                cr.missing_in_destination.len()
            );
            for entry in &cr.missing_in_destination {
                println!(" - {}{}", marker(entry), entry.display_name());
            }
        }
        if !cr.conflicts.is_empty() {
            println!(" conflicts: {}", cr.conflicts.len());
            for (entry, conflict) in &cr.conflicts {
                println!(" - {}{} ({})", marker(entry), entry.display_name(), conflict);
            }
        }
        if !cr.missing_in_source.is_empty() {
            println!(" unexpected in destination: {}", cr.missing_in_source.len());
            for entry in &cr.missing_in_source {
                println!(" - {}{}", marker(entry), entry.display_name());
            }
        }
    }
}

/// Run a verification walk and render the report. Returns the process exit
/// code: 0 clean, 1 problems found or cancelled.
fn run_cli(args: &Args, token: &CancellationToken) -> Result<i32, CliError> {
    let config = build_config(args)?;
    let meta = WalkMeta::new();
    let reporter = CliReporter {
        verbose: args.verbose,
    };

    let start = Instant::now();
    let walked = compare(
        &config,
        &meta,
        &args.source,
        &args.destination,
        Some(&reporter),
        token,
    );
    let elapsed = start.elapsed();
    config.release();

    let outcome = walked.map_err(CliError::Walk)?;

    println!(
        "Visited {} files and {} directories in {}",
        meta.files_visited(),
        meta.directories_visited(),
        format_time(elapsed)
    );
    print_report(&outcome);

    if outcome.status == WalkStatus::Cancelled {
        println!("Check cancelled, results cover only part of the tree");
        return Ok(1);
    }

    Ok(if outcome.results.is_empty() { 0 } else { 1 })
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let token = CancellationToken::new();
    token.set_listener(|| eprintln!("Cancellation requested, finishing up..."));
    {
        let token = token.clone();
        if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
            warn!("unable to install Ctrl-C handler: {}", e);
        }
    }

    match run_cli(&args, &token) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(2);
        }
    }
}
