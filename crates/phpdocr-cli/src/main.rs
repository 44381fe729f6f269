//! phpdocr CLI - PHPDoc generator
//!
//! Adds or updates the docblock above every function, method, class,
//! interface and trait in the given files, merging derived facts
//! (parameters, return type, thrown exceptions, settings usages) with
//! whatever the author already wrote.

mod cache;
mod config;
mod output;
mod process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use phpdocr_docblock::{GeneratorOptions, SettingsLookup};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cache::SettingsCache;
use config::Config;
use output::{EditInfo, OutputFormat, Reporter};
use process::{process_file, write_file};

/// Environment variable holding the log filter
const LOG_ENV: &str = "PHPDOCR_LOG";

#[derive(Parser)]
#[command(name = "phpdocr")]
#[command(version)]
#[command(about = "Generate and update PHPDoc docblocks")]
#[command(author = "phpdocr contributors")]
struct Cli {
    /// Files or directories to process
    #[arg(required_unless_present = "import_descriptions")]
    paths: Vec<PathBuf>,

    /// Show pending docblock changes without writing them (default mode)
    #[arg(long, conflicts_with = "fix")]
    check: bool,

    /// Write docblocks to files
    #[arg(long, conflicts_with = "check")]
    fix: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Only document the innermost declaration enclosing this 1-based line
    #[arg(long, value_name = "N")]
    line: Option<usize>,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: String,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .phpdocr.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// Settings-description cache file (overrides config)
    #[arg(long, value_name = "PATH")]
    settings_cache: Option<PathBuf>,

    /// Merge a JSON object of setting descriptions into the cache
    #[arg(long, value_name = "JSON")]
    import_descriptions: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine output format
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::from_str(&cli.format).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json, diff",
                cli.format
            )
        })?
    };

    // Load config file
    let config = if cli.no_config {
        Config::default()
    } else if let Some(config_path) = &cli.config {
        let cfg = Config::load_path(config_path)?;
        if cli.verbose && output_format == OutputFormat::Text {
            println!("{}: {}", "Using config".bold(), config_path.display());
        }
        cfg
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                if cli.verbose && output_format == OutputFormat::Text {
                    println!("{}: {}", "Using config".bold(), path.display());
                }
                cfg
            }
            None => Config::default(),
        }
    };

    let cache_path = cli
        .settings_cache
        .clone()
        .unwrap_or_else(|| config.settings.cache.clone());
    let mut settings_cache = SettingsCache::load(&cache_path);

    // Handle --import-descriptions
    if let Some(import_path) = &cli.import_descriptions {
        let descriptions = SettingsCache::read_import(import_path)?;
        let changed = settings_cache.merge(descriptions);
        settings_cache.save(&cache_path)?;
        println!(
            "{} {} description(s) into {} ({} total)",
            "Imported".green(),
            changed,
            cache_path.display(),
            settings_cache.len()
        );
        if cli.paths.is_empty() {
            return Ok(ExitCode::SUCCESS);
        }
    }

    let options = config.generator_options();
    options.validate().context("Invalid [settings] configuration")?;

    // --line is 1-based on the command line
    let target_line = match cli.line {
        Some(0) => bail!("--line is 1-based; 0 is not a valid line"),
        Some(line) => {
            if cli.paths.len() != 1 || !cli.paths[0].is_file() {
                bail!("--line requires exactly one file path");
            }
            Some(line - 1)
        }
        None => None,
    };

    // Determine mode: fix or check (check is default)
    let fix_mode = cli.fix;
    let check_mode = !fix_mode;

    if cli.verbose && output_format == OutputFormat::Text {
        println!(
            "{}: {}",
            "Mode".bold(),
            if fix_mode { "fix" } else { "check" }
        );
        println!(
            "{}: {}",
            "Settings functions".bold(),
            options.settings_functions.join(", ")
        );
        println!(
            "{}: {} ({} descriptions)",
            "Settings cache".bold(),
            cache_path.display(),
            settings_cache.len()
        );
        println!();
    }

    // Collect all file paths first
    let mut file_paths: Vec<PathBuf> = Vec::new();
    let mut missing_paths: Vec<PathBuf> = Vec::new();

    for path in &cli.paths {
        if path.is_file() {
            file_paths.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "php"))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    file_paths.push(file_path.to_path_buf());
                }
            }
        } else {
            missing_paths.push(path.clone());
        }
    }
    debug!(files = file_paths.len(), "collected PHP files");

    // One whole file per unit of work
    let results: Vec<FileOutcome> = file_paths
        .par_iter()
        .map(|path| process_file_to_outcome(path, &options, &settings_cache, target_line))
        .collect();

    // Sort results by path for deterministic output
    let mut sorted_results: Vec<_> = results.into_iter().zip(file_paths.iter()).collect();
    sorted_results.sort_by(|a, b| a.1.cmp(b.1));

    let mut reporter = Reporter::new(output_format, cli.verbose);

    for path in &missing_paths {
        if output_format == OutputFormat::Text {
            eprintln!(
                "{}: Path does not exist: {}",
                "Warning".yellow(),
                path.display()
            );
        }
    }

    for (outcome, path) in sorted_results {
        report_outcome(path, outcome, fix_mode, &mut reporter);
    }

    // Determine exit code
    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;

    Ok(exit_code)
}

/// Result of processing a single file (for parallel processing)
enum FileOutcome {
    /// Docblocks already up to date
    NoChanges,
    /// File has docblock edits to report/apply
    HasChanges {
        edits: Vec<EditInfo>,
        old_source: String,
        new_source: String,
    },
    Error(String),
}

/// Process a file and return an outcome (no writes, suitable for parallel execution)
fn process_file_to_outcome(
    path: &Path,
    options: &GeneratorOptions,
    lookup: &dyn SettingsLookup,
    line: Option<usize>,
) -> FileOutcome {
    match process_file(path, options, lookup, line) {
        Ok(result) => match result.new_source {
            Some(new_source) if !result.edits.is_empty() => FileOutcome::HasChanges {
                edits: result.edits,
                old_source: result.old_source,
                new_source,
            },
            _ => FileOutcome::NoChanges,
        },
        Err(e) => FileOutcome::Error(format!("{:#}", e)),
    }
}

/// Report a file outcome and optionally write the new source
fn report_outcome(path: &Path, outcome: FileOutcome, fix_mode: bool, reporter: &mut Reporter) {
    match outcome {
        FileOutcome::NoChanges => {
            reporter.report_skipped(path);
        }
        FileOutcome::HasChanges {
            edits,
            old_source,
            new_source,
        } => {
            if fix_mode {
                match write_file(path, &new_source) {
                    Ok(()) => reporter.report_fix(path, edits),
                    Err(e) => reporter.report_error(path, &format!("{:#}", e)),
                }
            } else {
                reporter.report_check(path, edits, &old_source, &new_source);
            }
        }
        FileOutcome::Error(msg) => {
            reporter.report_error(path, &msg);
        }
    }
}
