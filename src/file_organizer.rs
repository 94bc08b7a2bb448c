/// Move execution and the in-memory move ledger.
///
/// Every relocation of a run goes through [`FileOrganizer::execute`], which
/// either performs the move or (in preview mode) only simulates it. Both paths
/// append the same [`MoveRecord`] to the ledger so that counters, reporting
/// and undo behave identically downstream.
///
/// The ledger lives only as long as the process. A crash forfeits undo.
use crate::output::OutputFormatter;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// A single executed (or simulated) relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Where the item lives after the move.
    pub destination: PathBuf,
    /// Where the item lived before the move.
    pub source: PathBuf,
}

/// Chronological list of moves plus the directories created for them.
#[derive(Debug, Clone)]
pub struct MoveLedger {
    /// When the run started.
    pub started_at: DateTime<Local>,
    records: Vec<MoveRecord>,
    created_dirs: Vec<PathBuf>,
}

impl MoveLedger {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            records: Vec::new(),
            created_dirs: Vec::new(),
        }
    }

    /// Appends a record. Order of calls is the chronological move order.
    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    /// Records in chronological order.
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// Records most recent first, the order undo must use.
    pub fn most_recent_first(&self) -> impl Iterator<Item = &MoveRecord> {
        self.records.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if an earlier move already targets `destination`.
    pub fn claims_destination(&self, destination: &Path) -> bool {
        self.records.iter().any(|r| r.destination == destination)
    }

    /// Remembers a directory the run created, in creation order.
    pub fn record_created_dir(&mut self, dir: PathBuf) {
        self.created_dirs.push(dir);
    }

    /// Directories created by the run, in creation order.
    pub fn created_dirs(&self) -> &[PathBuf] {
        &self.created_dirs
    }
}

impl Default for MoveLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical paths already claimed by an earlier pass or move.
///
/// Once a path is claimed it is never processed again. Claiming a directory
/// claims everything below it.
#[derive(Debug, Clone, Default)]
pub struct ProcessedRegistry {
    paths: HashSet<PathBuf>,
}

impl ProcessedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `path`. Call before the path is moved away so it still
    /// resolves.
    pub fn claim(&mut self, path: &Path) {
        self.paths.insert(canonical_or_self(path));
    }

    /// Claims a path already passed through [`ProcessedRegistry::resolve`].
    pub fn claim_resolved(&mut self, resolved: PathBuf) {
        self.paths.insert(resolved);
    }

    /// Canonical form of `path`, or `path` itself when it does not resolve.
    pub fn resolve(path: &Path) -> PathBuf {
        canonical_or_self(path)
    }

    /// True if `path` or one of its ancestors was claimed.
    pub fn is_claimed(&self, path: &Path) -> bool {
        let resolved = canonical_or_self(path);
        resolved
            .ancestors()
            .chain(path.ancestors())
            .any(|candidate| self.paths.contains(candidate))
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Outcome counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Successful (or simulated) moves.
    pub moved: usize,
    /// Moves not attempted because the destination was taken.
    pub skipped: usize,
    /// Moves attempted that failed.
    pub failed: usize,
}

/// Mutable state threaded through every pass of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    preview: bool,
    pub ledger: MoveLedger,
    pub processed: ProcessedRegistry,
    pub counters: RunCounters,
}

impl RunContext {
    pub fn new(preview: bool) -> Self {
        Self {
            preview,
            ledger: MoveLedger::new(),
            processed: ProcessedRegistry::new(),
            counters: RunCounters::default(),
        }
    }

    /// True when no filesystem mutation may happen.
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// True if a move to `destination` must not be attempted.
    ///
    /// Something on disk (even a dangling symlink) or an earlier simulated
    /// move into the same place both count as taken.
    pub fn destination_taken(&self, destination: &Path) -> bool {
        destination.symlink_metadata().is_ok() || self.ledger.claims_destination(destination)
    }

    /// Reports a collision and counts the skip.
    pub fn skip_existing(&mut self, what: &str, destination: &Path) {
        self.counters.skipped += 1;
        warn!(destination = %destination.display(), "Destination exists, skipping");
        OutputFormatter::warning(&format!("{} exists, skipping: {}", what, destination.display()));
    }
}

/// Errors that can occur while relocating a single item.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rename itself failed.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for single-move operations.
pub type MoveResult<T> = Result<T, MoveError>;

/// Performs or simulates relocations and keeps the ledger.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves `source` to `destination` and records the move.
    ///
    /// In preview mode nothing is touched, but the record is appended, the
    /// counter is incremented and a "would move" notice is printed exactly as
    /// a successful real move would be.
    ///
    /// The destination's parent directory is created first if needed; the
    /// caller has already checked that `destination` itself is free.
    ///
    /// Failures are reported and turned into `false`; they never abort the
    /// calling pass.
    pub fn execute(ctx: &mut RunContext, source: &Path, destination: &Path) -> bool {
        if ctx.is_preview() {
            OutputFormatter::dry_run_notice(&format!(
                "Would move: {} → {}",
                source.display(),
                destination.display()
            ));
            Self::record(ctx, source, destination);
            return true;
        }

        match Self::move_with_parents(ctx, source, destination) {
            Ok(()) => {
                debug!(from = %source.display(), to = %destination.display(), "Moved");
                OutputFormatter::success(&format!(
                    "Moved: {} → {}",
                    source.display(),
                    destination.display()
                ));
                Self::record(ctx, source, destination);
                true
            }
            Err(e) => {
                warn!(error = %e, "Move failed");
                OutputFormatter::error(&e.to_string());
                ctx.counters.failed += 1;
                false
            }
        }
    }

    fn record(ctx: &mut RunContext, source: &Path, destination: &Path) {
        ctx.ledger.push(MoveRecord {
            destination: destination.to_path_buf(),
            source: source.to_path_buf(),
        });
        ctx.counters.moved += 1;
    }

    fn move_with_parents(ctx: &mut RunContext, source: &Path, destination: &Path) -> MoveResult<()> {
        if let Some(parent) = destination.parent() {
            Self::ensure_dir(ctx, parent)?;
        }

        fs::rename(source, destination).map_err(|e| MoveError::MoveFailed {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        })
    }

    /// Creates `dir` and any missing ancestors, recording each one created.
    ///
    /// A no-op in preview mode.
    pub fn ensure_dir(ctx: &mut RunContext, dir: &Path) -> MoveResult<()> {
        if ctx.is_preview() || dir.is_dir() {
            return Ok(());
        }

        let mut missing: Vec<&Path> = dir.ancestors().take_while(|p| !p.exists()).collect();
        missing.reverse();

        for path in missing {
            fs::create_dir(path).map_err(|e| MoveError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            debug!(path = %path.display(), "Created directory");
            ctx.ledger.record_created_dir(path.to_path_buf());
        }

        Ok(())
    }
}
