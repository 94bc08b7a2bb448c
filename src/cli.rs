//! Command-line interface module for mediabot.
//!
//! This module handles:
//! - Argument parsing
//! - Root resolution and validation
//! - Running the scan over one root
//! - The post-run choice between doing nothing, cleanup and undo

use crate::cleanup::{CleanupReport, EmptyDirReaper};
use crate::config::{ConfigError, MediaConfig};
use crate::destination::{DestinationFolders, MOVIES_DIR_NAME, SERIES_DIR_NAME};
use crate::file_organizer::RunContext;
use crate::output::OutputFormatter;
use crate::scanner::TreeScanner;
use crate::undo::{UndoManager, UndoReport};
use chrono::Local;
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "mediabot")]
#[command(author, version, long_about = None)]
#[command(about = "Sort downloaded episodes into Series/<Show> and everything else into Movies/")]
pub struct Args {
    /// Folder to organize (defaults to `default_path` from the config)
    pub path: Option<PathBuf>,

    /// Show what would happen without modifying the filesystem
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// What to do after the run instead of asking
    #[arg(short, long, value_enum)]
    pub action: Option<PostRunAction>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// The choices offered once the scan is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PostRunAction {
    /// Leave everything as it is
    #[value(name = "none")]
    Exit,
    /// Delete directories left empty
    Cleanup,
    /// Move everything back
    Undo,
}

impl PostRunAction {
    /// Number typed at the menu to pick this action.
    pub fn number(&self) -> usize {
        match self {
            PostRunAction::Exit => 0,
            PostRunAction::Cleanup => 1,
            PostRunAction::Undo => 2,
        }
    }

    pub fn menu_label(&self) -> &'static str {
        match self {
            PostRunAction::Exit => "Exit and do nothing",
            PostRunAction::Cleanup => "Clean up empty folders",
            PostRunAction::Undo => "Undo all operations",
        }
    }
}

/// Fatal errors raised before any file is touched.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Path not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Run-time switches that do not come from the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the configured `default_path`.
    pub root: Option<PathBuf>,
    /// Simulate everything, mutate nothing.
    pub preview: bool,
}

/// One completed scan plus what has been done since.
pub struct Session {
    root: PathBuf,
    destinations: DestinationFolders,
    ctx: RunContext,
    reaped: Vec<PathBuf>,
    cleaned: bool,
    undone: bool,
}

impl Session {
    /// Validates the root and runs all four passes over it.
    ///
    /// # Errors
    ///
    /// Fails only if the root does not exist or is not a directory; every
    /// per-item problem during the scan is reported and skipped.
    pub fn start(config: &MediaConfig, options: &RunOptions) -> Result<Self, SetupError> {
        let root = resolve_root(options.root.as_deref(), config)?;
        let extensions = config.extension_set();
        let destinations = DestinationFolders::under(&root);
        let mut ctx = RunContext::new(options.preview);

        if options.preview {
            OutputFormatter::dry_run_notice("Dry run mode enabled, no files will be moved.");
        }
        OutputFormatter::info(&format!("Organizing: {}", root.display()));
        info!(root = %root.display(), preview = options.preview, "Run started");

        TreeScanner::new(&root, &extensions, &destinations).run(&mut ctx);

        let session = Self {
            root,
            destinations,
            ctx,
            reaped: Vec::new(),
            cleaned: false,
            undone: false,
        };
        session.print_summary();
        Ok(session)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The ledger, registry and counters of the scan.
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn moved(&self) -> usize {
        self.ctx.counters.moved
    }

    /// Directories removed by cleanup so far, deepest first.
    pub fn reaped_dirs(&self) -> &[PathBuf] {
        &self.reaped
    }

    /// Moves into `Series` and into `Movies`, in that order.
    pub fn category_counts(&self) -> (usize, usize) {
        let records = self.ctx.ledger.records();
        let series = records
            .iter()
            .filter(|r| r.destination.starts_with(self.destinations.series_root()))
            .count();
        let movies = records
            .iter()
            .filter(|r| r.destination.starts_with(self.destinations.movies_root()))
            .count();
        (series, movies)
    }

    /// Actions that still make sense, `Exit` always first.
    ///
    /// Undo is offered only when something moved, cleanup only once.
    pub fn offered_actions(&self) -> Vec<PostRunAction> {
        let mut offered = vec![PostRunAction::Exit];
        if !self.cleaned {
            offered.push(PostRunAction::Cleanup);
        }
        if self.moved() > 0 && !self.undone {
            offered.push(PostRunAction::Undo);
        }
        offered
    }

    /// Carries out one post-run action.
    pub fn apply(&mut self, action: PostRunAction) {
        match action {
            PostRunAction::Exit => OutputFormatter::success("Exiting..."),
            PostRunAction::Cleanup => {
                self.cleanup();
            }
            PostRunAction::Undo => {
                if self.ctx.is_preview() {
                    OutputFormatter::dry_run_notice("Undo is not available in dry run mode.");
                } else if self.moved() == 0 {
                    OutputFormatter::warning("Nothing to undo.");
                } else {
                    self.undo();
                }
            }
        }
    }

    /// Removes (or, in preview, lists) directories left empty under the root.
    pub fn cleanup(&mut self) -> CleanupReport {
        OutputFormatter::header("Cleaning up empty directories");
        let report = EmptyDirReaper::reap(&self.root, self.ctx.is_preview());
        if !self.ctx.is_preview() {
            self.reaped.extend(report.removed.iter().cloned());
        }
        self.cleaned = true;

        if report.failed.is_empty() {
            OutputFormatter::success(&format!(
                "Cleanup completed: {} director{} removed.",
                report.removed.len(),
                if report.removed.len() == 1 { "y" } else { "ies" }
            ));
        } else {
            OutputFormatter::warning(&format!(
                "Cleanup completed with {} failure(s).",
                report.failed.len()
            ));
        }
        report
    }

    /// Reverses every move of the run and any cleanup done after it.
    pub fn undo(&mut self) -> UndoReport {
        OutputFormatter::header("Undoing all moves");
        let report = UndoManager::undo(&self.ctx.ledger, &self.reaped);
        self.undone = true;
        self.reaped.clear();
        print_undo_report(&report);
        report
    }

    fn print_summary(&self) {
        let (series, movies) = self.category_counts();
        OutputFormatter::summary_table(
            &[(SERIES_DIR_NAME, series), (MOVIES_DIR_NAME, movies)],
            self.moved(),
            self.ctx.is_preview(),
        );

        let counters = self.ctx.counters;
        if counters.skipped > 0 {
            OutputFormatter::warning(&format!(
                "{} item(s) skipped because the destination exists.",
                counters.skipped
            ));
        }
        if counters.failed > 0 {
            OutputFormatter::warning(&format!("{} move(s) failed.", counters.failed));
        }

        let elapsed = Local::now().signed_duration_since(self.ctx.ledger.started_at);
        debug!(elapsed_ms = elapsed.num_milliseconds(), "Scan finished");
        OutputFormatter::plain(&format!(
            "Started {}, took {:.1}s",
            self.ctx.ledger.started_at.format("%Y-%m-%d %H:%M:%S"),
            elapsed.num_milliseconds() as f64 / 1000.0
        ));
    }
}

/// Picks the explicit root or the configured default and canonicalizes it.
pub fn resolve_root(explicit: Option<&Path>, config: &MediaConfig) -> Result<PathBuf, SetupError> {
    let root = explicit.unwrap_or(config.default_path.as_path());

    let meta = fs::metadata(root).map_err(|_| SetupError::RootNotFound(root.to_path_buf()))?;
    if !meta.is_dir() {
        return Err(SetupError::RootNotADirectory(root.to_path_buf()));
    }

    fs::canonicalize(root).map_err(|_| SetupError::RootNotFound(root.to_path_buf()))
}

/// Asks what to do next until the run is finished.
///
/// Cleanup returns to the menu so that undo can still follow it; any other
/// choice ends the run. Unrecognized input asks again, end of input counts as
/// "do nothing".
pub fn post_run_menu<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    out: &mut W,
) -> Result<(), SetupError> {
    if session.moved() == 0 {
        OutputFormatter::info("No files were moved.");
    }

    loop {
        let offered = session.offered_actions();
        if offered.len() <= 1 {
            return Ok(());
        }

        writeln!(out, "\nChoose an option:")?;
        for action in &offered {
            writeln!(out, "{} → {}", action.number(), action.menu_label())?;
        }
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            OutputFormatter::warning("Operation cancelled.");
            return Ok(());
        }

        let picked = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| offered.iter().copied().find(|a| a.number() == n));

        match picked {
            Some(action) => {
                debug!(?action, "Menu choice");
                session.apply(action);
                if action != PostRunAction::Cleanup {
                    return Ok(());
                }
            }
            None => {
                let numbers: Vec<String> =
                    offered.iter().map(|a| a.number().to_string()).collect();
                OutputFormatter::error(&format!(
                    "Invalid choice. Enter one of: {}.",
                    numbers.join(", ")
                ));
            }
        }
    }
}

/// Runs the application for parsed arguments, reading menu input from stdin.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use mediabot::cli::{run_cli, Args};
///
/// let args = Args::parse_from(["mediabot", "--dry-run", "/srv/downloads"]);
/// if let Err(e) = run_cli(&args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<(), SetupError> {
    let config = MediaConfig::load(args.config.as_deref())?;
    let options = RunOptions {
        root: args.path.clone(),
        preview: args.dry_run,
    };
    let mut session = Session::start(&config, &options)?;

    if let Some(action) = args.action {
        session.apply(action);
    } else if !options.preview {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut out = io::stdout();
        post_run_menu(&mut session, &mut input, &mut out)?;
    }

    if options.preview {
        OutputFormatter::dry_run_notice("Dry run completed. No changes were made.");
    }
    Ok(())
}

fn print_undo_report(report: &UndoReport) {
    OutputFormatter::success(&format!(
        "Undo completed. {} item(s) restored.",
        report.restored_files
    ));

    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("  - {}: {}", path.display(), reason));
        }
    }

    if !report.failed_restores.is_empty() {
        OutputFormatter::error(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::error(&format!("  - {}: {}", path.display(), reason));
        }
    }
}
