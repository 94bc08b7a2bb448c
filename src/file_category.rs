/// Media file recognition by filename suffix.
///
/// The run works with two disjoint sets of lower-cased suffixes (video and
/// subtitle). Their union is the "recognized media" set that decides whether
/// a file takes part in a pass at all.
use std::collections::BTreeSet;
use std::path::Path;

/// The kind of media a recognized file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Video container files (mkv, mp4, ...).
    Video,
    /// Subtitle files (srt, ass, ...).
    Subtitle,
}

impl Category {
    /// Returns a short human-readable label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Video => "video",
            Category::Subtitle => "subtitle",
        }
    }
}

/// Immutable set of recognized video and subtitle suffixes.
///
/// Suffixes include the leading dot and are matched case-insensitively
/// against the end of a filename, so `".mkv"` matches `Show.S01E01.MKV`.
#[derive(Debug, Clone, Default)]
pub struct ExtensionSet {
    video: BTreeSet<String>,
    subtitle: BTreeSet<String>,
}

impl ExtensionSet {
    /// Builds a set from already normalized suffixes.
    ///
    /// Entries are lower-cased here as well, so callers that skip config
    /// validation still get case-insensitive matching.
    pub fn new<V, S>(video: V, subtitle: S) -> Self
    where
        V: IntoIterator,
        V::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            video: video
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
            subtitle: subtitle
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Returns the category of a filename, or `None` if it is not media.
    ///
    /// Video wins if a name ends with suffixes from both sets.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediabot::file_category::{Category, ExtensionSet};
    ///
    /// let set = ExtensionSet::new([".mkv"], [".srt"]);
    /// assert_eq!(set.categorize("Show.S01E01.MKV"), Some(Category::Video));
    /// assert_eq!(set.categorize("Show.S01E01.en.srt"), Some(Category::Subtitle));
    /// assert_eq!(set.categorize("notes.txt"), None);
    /// ```
    pub fn categorize(&self, file_name: &str) -> Option<Category> {
        let lower = file_name.to_lowercase();
        if self.video.iter().any(|ext| lower.ends_with(ext.as_str())) {
            Some(Category::Video)
        } else if self.subtitle.iter().any(|ext| lower.ends_with(ext.as_str())) {
            Some(Category::Subtitle)
        } else {
            None
        }
    }

    /// True if the filename carries any recognized media suffix.
    pub fn is_media(&self, file_name: &str) -> bool {
        self.categorize(file_name).is_some()
    }

    /// True if the filename carries a recognized subtitle suffix.
    pub fn is_subtitle(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.subtitle.iter().any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Convenience wrapper over [`ExtensionSet::is_media`] for paths.
    pub fn is_media_path(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.is_media(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}
