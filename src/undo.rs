/// Undo of a run's moves, from the in-memory ledger.
///
/// Undo walks the ledger most recent first so that a folder moved late is
/// put back before anything that was moved out of it earlier is restored
/// into it. Directories reaped by cleanup are recreated up front; directories
/// the run created are removed at the end if they ended up empty.
use crate::file_organizer::{MoveLedger, MoveRecord};
use crate::output::OutputFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of items moved back to their source.
    pub restored_files: usize,
    /// Number of reaped directories recreated.
    pub recreated_dirs: usize,
    /// Number of run-created directories removed again.
    pub removed_dirs: usize,
    /// Items whose restore was attempted and failed.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Items skipped because they were no longer at their destination.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns the total number of ledger records processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

enum RestoreError {
    Missing(PathBuf),
    Failed(PathBuf, String),
}

/// Reverses the moves of the current run.
pub struct UndoManager;

impl UndoManager {
    /// Restores every move in `ledger`, most recent first.
    ///
    /// `reaped_dirs` are the directories removed by cleanup in this run; they
    /// are recreated before any item is moved back so the sources have a
    /// parent to land in.
    ///
    /// # Edge Cases Handled
    ///
    /// * **Item gone from destination**: skipped and reported
    /// * **Something at the original location**: removed, recursively for a
    ///   directory, then replaced by the restored item
    /// * **Rename failure**: recorded as a failure; the rest continues
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediabot::file_organizer::MoveLedger;
    /// use mediabot::undo::UndoManager;
    ///
    /// let ledger = MoveLedger::new();
    /// let report = UndoManager::undo(&ledger, &[]);
    /// println!("Restored {} items", report.restored_files);
    /// ```
    pub fn undo(ledger: &MoveLedger, reaped_dirs: &[PathBuf]) -> UndoReport {
        let mut report = UndoReport::default();

        for dir in reaped_dirs.iter().rev() {
            match fs::create_dir_all(dir) {
                Ok(()) => {
                    debug!(dir = %dir.display(), "Recreated directory");
                    report.recreated_dirs += 1;
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Could not recreate directory");
                    OutputFormatter::error(&format!(
                        "Could not recreate {}: {}",
                        dir.display(),
                        e
                    ));
                }
            }
        }

        let pb = OutputFormatter::create_progress_bar(ledger.len() as u64);
        for record in ledger.most_recent_first() {
            match Self::restore(record) {
                Ok(()) => {
                    report.restored_files += 1;
                    pb.suspend(|| {
                        OutputFormatter::success(&format!(
                            "Undone: {} → {}",
                            record.destination.display(),
                            record.source.display()
                        ))
                    });
                }
                Err(RestoreError::Missing(path)) => {
                    pb.suspend(|| {
                        OutputFormatter::warning(&format!(
                            "Not found, skipping: {}",
                            path.display()
                        ))
                    });
                    report
                        .skipped_files
                        .push((path, "Not found at destination".to_string()));
                }
                Err(RestoreError::Failed(path, reason)) => {
                    warn!(path = %path.display(), %reason, "Undo failed");
                    pb.suspend(|| {
                        OutputFormatter::error(&format!("{}: {}", path.display(), reason))
                    });
                    report.failed_restores.push((path, reason));
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        for dir in ledger.created_dirs().iter().rev() {
            if Self::remove_if_empty(dir) {
                report.removed_dirs += 1;
            }
        }

        info!(
            restored = report.restored_files,
            skipped = report.skipped_files.len(),
            failed = report.failed_restores.len(),
            "Undo finished"
        );
        report
    }

    fn restore(record: &MoveRecord) -> Result<(), RestoreError> {
        if record.destination.symlink_metadata().is_err() {
            return Err(RestoreError::Missing(record.destination.clone()));
        }

        if let Ok(meta) = record.source.symlink_metadata() {
            let cleared = if meta.is_dir() {
                fs::remove_dir_all(&record.source)
            } else {
                fs::remove_file(&record.source)
            };
            cleared.map_err(|e| {
                RestoreError::Failed(
                    record.source.clone(),
                    format!("Could not clear original location: {}", e),
                )
            })?;
        }

        if let Some(parent) = record.source.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RestoreError::Failed(
                    parent.to_path_buf(),
                    format!("Could not recreate parent directory: {}", e),
                )
            })?;
        }

        fs::rename(&record.destination, &record.source).map_err(|e| {
            RestoreError::Failed(
                record.destination.clone(),
                format!("Failed to restore: {}", e),
            )
        })
    }

    fn remove_if_empty(dir: &Path) -> bool {
        let empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        empty && fs::remove_dir(dir).is_ok()
    }
}
