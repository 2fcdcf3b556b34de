//! Command-line interface for stackscout.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::analyzer::CodebaseAnalyzer;
use crate::config::ScanConfig;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Codebase analysis tool.
///
/// Stackscout scans a codebase, parses every supported source file and
/// reports the imports, exports, functions, frameworks and dependencies it
/// finds. Supported languages: TypeScript/JavaScript, Python, Go, Rust and
/// Java.
#[derive(Parser)]
#[command(name = "stackscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a codebase and report its structure
    #[command(visible_alias = "analyze")]
    Scan(ScanArgs),
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Root directory to scan
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Override the maximum number of files scanned
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Additional directory name or glob to exclude (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,
}

fn load_config(args: &ScanArgs) -> anyhow::Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::parse_file(path)?,
        None => match ScanConfig::discover() {
            Some(path) => ScanConfig::parse_file(&path)?,
            None => ScanConfig::default(),
        },
    };
    if let Some(max_files) = args.max_files {
        config.max_files = max_files;
    }
    config.exclude_dirs.extend(args.exclude.iter().cloned());
    Ok(config)
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let root = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let mut analyzer = match CodebaseAnalyzer::new(root, config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let spinner = if args.format == "pretty" {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
        pb.set_message("scanning...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(analyzer.scan())?;
    analyzer.dispose();

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match args.format.as_str() {
        "json" => report::write_json(&report)?,
        _ => report::write_pretty(&args.path.to_string_lossy(), &report),
    }

    if report.summary.failed > 0 {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
