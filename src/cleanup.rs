//! Removal of directories left empty by a run.

use crate::output::OutputFormatter;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// What the reaper removed (or would remove, in preview mode).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Removed directories, deepest first.
    pub removed: Vec<PathBuf>,
    /// Directories that were empty but could not be removed.
    pub failed: Vec<(PathBuf, String)>,
}

/// Deletes empty directories below a root, bottom-up.
pub struct EmptyDirReaper;

impl EmptyDirReaper {
    /// Removes every empty directory strictly below `root`.
    ///
    /// Children are handled before their parent, so a parent emptied by the
    /// removal of its last child goes in the same call. The root itself is
    /// never removed. In preview mode nothing is deleted; a directory counts
    /// as empty when all its entries were reported as removed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediabot::cleanup::EmptyDirReaper;
    /// use std::path::Path;
    ///
    /// let report = EmptyDirReaper::reap(Path::new("/srv/downloads"), false);
    /// println!("removed {} directories", report.removed.len());
    /// ```
    pub fn reap(root: &Path, preview: bool) -> CleanupReport {
        let mut report = CleanupReport::default();
        let mut gone: HashSet<PathBuf> = HashSet::new();

        let mut dirs: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();
        dirs.reverse();

        for dir in dirs {
            if !Self::is_effectively_empty(&dir, &gone) {
                continue;
            }

            if preview {
                OutputFormatter::dry_run_notice(&format!(
                    "Would remove empty directory: {}",
                    dir.display()
                ));
            } else if let Err(e) = fs::remove_dir(&dir) {
                warn!(dir = %dir.display(), error = %e, "Could not remove directory");
                OutputFormatter::error(&format!(
                    "Failed to remove {}: {}",
                    dir.display(),
                    e
                ));
                report.failed.push((dir, e.to_string()));
                continue;
            } else {
                debug!(dir = %dir.display(), "Removed empty directory");
                OutputFormatter::success(&format!("Removed empty directory: {}", dir.display()));
            }

            gone.insert(dir.clone());
            report.removed.push(dir);
        }

        report
    }

    fn is_effectively_empty(dir: &Path, gone: &HashSet<PathBuf>) -> bool {
        match fs::read_dir(dir) {
            Ok(mut entries) => entries.all(|entry| {
                entry
                    .map(|e| gone.contains(&e.path()))
                    .unwrap_or(false)
            }),
            Err(e) => {
                trace!(dir = %dir.display(), error = %e, "Cannot list directory");
                false
            }
        }
    }
}
