//! Destination folders and target resolution.
//!
//! Two fixed folders are created lazily under the scanned root:
//! `Series/<Show Name>/...` and `Movies/...`. Anything already inside either
//! of them is never treated as a source again.

use crate::pattern::Classification;
use std::fs;
use std::path::{Path, PathBuf};

/// Folder name for series content under the scanned root.
pub const SERIES_DIR_NAME: &str = "Series";
/// Folder name for movie content under the scanned root.
pub const MOVIES_DIR_NAME: &str = "Movies";

/// The two destination roots of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFolders {
    series_root: PathBuf,
    movies_root: PathBuf,
}

impl DestinationFolders {
    /// Destination roots as siblings of the scanned content under `root`.
    ///
    /// `root` should already be canonical; nothing is created here.
    pub fn under(root: &Path) -> Self {
        Self {
            series_root: root.join(SERIES_DIR_NAME),
            movies_root: root.join(MOVIES_DIR_NAME),
        }
    }

    pub fn series_root(&self) -> &Path {
        &self.series_root
    }

    pub fn movies_root(&self) -> &Path {
        &self.movies_root
    }

    /// Computes the target directory for a classified item.
    ///
    /// Series content goes to `<Series>/<Show Name>`, everything else goes
    /// flat into `<Movies>`. Pure: the filesystem is not consulted.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediabot::destination::DestinationFolders;
    /// use mediabot::pattern::classify;
    /// use std::path::Path;
    ///
    /// let dest = DestinationFolders::under(Path::new("/media"));
    /// assert_eq!(
    ///     dest.resolve(&classify("Show.Name.S01E02.mkv")),
    ///     Path::new("/media/Series/Show Name")
    /// );
    /// assert_eq!(
    ///     dest.resolve(&classify("Inception.2010.mkv")),
    ///     Path::new("/media/Movies")
    /// );
    /// ```
    pub fn resolve(&self, classification: &Classification) -> PathBuf {
        match classification {
            Classification::SeriesMatch { show_title } => self.series_root.join(show_title),
            Classification::NoMatch => self.movies_root.clone(),
        }
    }

    /// True if `path` is one of the destination roots or lies inside one.
    ///
    /// Symlinks are resolved when the path exists, so a link pointing into
    /// `Series/` is excluded as well.
    pub fn contains(&self, path: &Path) -> bool {
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        [&self.series_root, &self.movies_root]
            .into_iter()
            .any(|dest| resolved.starts_with(dest) || path.starts_with(dest))
    }
}
