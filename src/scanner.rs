//! Four-pass classification of a source tree.
//!
//! Passes run strictly in order and each one re-lists the tree from disk,
//! because an earlier pass may already have relocated directories or files
//! that a later pass must not see again:
//!
//! 1. episode folders (whole directories)
//! 2. loose subtitles inside an episode-named folder
//! 3. loose media whose own name is an episode
//! 4. everything else recognized goes to Movies
//!
//! Within a pass the listing is bottom-up (children before their parent) and
//! never descends into the destination folders.

use crate::destination::DestinationFolders;
use crate::file_category::ExtensionSet;
use crate::file_organizer::{FileOrganizer, ProcessedRegistry, RunContext};
use crate::output::OutputFormatter;
use crate::pattern::{classify, Classification};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// The scan passes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPass {
    EpisodeFolders,
    LooseSubtitles,
    LooseMedia,
    MovieFallback,
}

impl ScanPass {
    pub const ALL: [ScanPass; 4] = [
        ScanPass::EpisodeFolders,
        ScanPass::LooseSubtitles,
        ScanPass::LooseMedia,
        ScanPass::MovieFallback,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            ScanPass::EpisodeFolders => "Scanning for episode folders",
            ScanPass::LooseSubtitles => "Scanning for loose subtitles in episode folders",
            ScanPass::LooseMedia => "Scanning for episode files",
            ScanPass::MovieFallback => "Moving remaining media to Movies",
        }
    }
}

/// Walks one source root and hands every decided move to the executor.
pub struct TreeScanner<'a> {
    root: &'a Path,
    extensions: &'a ExtensionSet,
    destinations: &'a DestinationFolders,
}

impl<'a> TreeScanner<'a> {
    /// `root` should be canonical so destination checks compare like with like.
    pub fn new(
        root: &'a Path,
        extensions: &'a ExtensionSet,
        destinations: &'a DestinationFolders,
    ) -> Self {
        Self {
            root,
            extensions,
            destinations,
        }
    }

    /// Runs all four passes in order.
    pub fn run(&self, ctx: &mut RunContext) {
        for pass in ScanPass::ALL {
            self.run_pass(pass, ctx);
        }
    }

    /// Runs a single pass over a fresh listing of the tree.
    pub fn run_pass(&self, pass: ScanPass, ctx: &mut RunContext) {
        OutputFormatter::info(&format!("{}...", pass.description()));
        let moved_before = ctx.counters.moved;

        match pass {
            ScanPass::EpisodeFolders => self.episode_folder_pass(ctx),
            ScanPass::LooseSubtitles => self.loose_subtitle_pass(ctx),
            ScanPass::LooseMedia => self.loose_media_pass(ctx),
            ScanPass::MovieFallback => self.movie_fallback_pass(ctx),
        }

        info!(
            pass = ?pass,
            moved = ctx.counters.moved - moved_before,
            "Pass complete"
        );
    }

    /// Bottom-up listing of everything under the root, minus the root itself
    /// and anything inside a destination folder.
    fn listing(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkDir::new(self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.destinations.contains(entry.path()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.into_path()),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .collect();

        // Reversed pre-order puts every child before its parent.
        paths.reverse();
        paths
    }

    /// Files eligible for the loose passes: present, not hidden, recognized,
    /// and not claimed earlier. Listed fresh from disk.
    fn unclaimed_media(&self, ctx: &RunContext) -> Vec<Named> {
        self.listing()
            .into_iter()
            .filter_map(|path| {
                if !path.is_file() {
                    return None;
                }
                let item = Named::of(path)?;
                if item.name.starts_with('.') || !self.extensions.is_media(&item.name) {
                    return None;
                }
                if ctx.processed.is_claimed(&item.path) {
                    trace!(path = %item.path.display(), "Already processed");
                    return None;
                }
                Some(item)
            })
            .collect()
    }

    /// Pass 1: move whole episode folders that directly hold media.
    ///
    /// Target is `<Series>/<Show>/<original folder name>`; folders are never
    /// merged into an existing target.
    fn episode_folder_pass(&self, ctx: &mut RunContext) {
        for dir in self.listing() {
            if !dir.is_dir() || ctx.processed.is_claimed(&dir) {
                continue;
            }
            let Some(dir) = Named::of(dir) else {
                continue;
            };

            let classification = classify(&dir.name);
            let Some(show) = classification.show_title() else {
                continue;
            };

            if !self.holds_media(&dir.path) {
                trace!(dir = %dir.path.display(), "Episode-like folder without media");
                continue;
            }

            OutputFormatter::plain(&format!("📁 Episode folder: {} → {}", dir.name, show));
            let destination = self.destinations.resolve(&classification).join(&dir.leaf);
            self.relocate(ctx, "Folder", &dir.path, destination);
        }
    }

    /// Pass 2: subtitles whose parent folder name is an episode name.
    ///
    /// Flattened into `<Series>/<Show>/<file>`.
    fn loose_subtitle_pass(&self, ctx: &mut RunContext) {
        let candidates: Vec<Named> = self
            .unclaimed_media(ctx)
            .into_iter()
            .filter(|item| self.extensions.is_subtitle(&item.name))
            .collect();

        for item in candidates {
            if ctx.processed.is_claimed(&item.path) {
                continue;
            }
            let Some(parent_name) = item
                .path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };

            let classification = classify(&parent_name);
            let Some(show) = classification.show_title() else {
                continue;
            };

            OutputFormatter::plain(&format!("📄 Subtitle: {} → {}", item.name, show));
            let destination = self.destinations.resolve(&classification).join(&item.leaf);
            self.relocate(ctx, "File", &item.path, destination);
        }
    }

    /// Pass 3: media files whose own name is an episode name.
    fn loose_media_pass(&self, ctx: &mut RunContext) {
        for item in self.unclaimed_media(ctx) {
            if ctx.processed.is_claimed(&item.path) {
                continue;
            }
            let classification = classify(&item.name);
            let Some(show) = classification.show_title() else {
                debug!(file = %item.name, "No episode indicator");
                continue;
            };

            let kind = self
                .extensions
                .categorize(&item.name)
                .map_or("media", |category| category.label());
            OutputFormatter::plain(&format!("📺 Episode {}: {} → {}", kind, item.name, show));
            let destination = self.destinations.resolve(&classification).join(&item.leaf);
            self.relocate(ctx, "File", &item.path, destination);
        }
    }

    /// Pass 4: everything recognized and still unclaimed goes flat into Movies.
    fn movie_fallback_pass(&self, ctx: &mut RunContext) {
        for item in self.unclaimed_media(ctx) {
            if ctx.processed.is_claimed(&item.path) {
                continue;
            }

            OutputFormatter::plain(&format!("🎞  Movie: {}", item.name));
            let destination = self
                .destinations
                .resolve(&Classification::NoMatch)
                .join(&item.leaf);
            self.relocate(ctx, "File", &item.path, destination);
        }
    }

    /// True if `dir` directly contains at least one recognized media file.
    fn holds_media(&self, dir: &Path) -> bool {
        match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .any(|entry| entry.path().is_file() && self.extensions.is_media_path(&entry.path())),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot list folder");
                false
            }
        }
    }

    /// Checks for a collision, then moves and claims `source`.
    fn relocate(&self, ctx: &mut RunContext, what: &str, source: &Path, destination: PathBuf) -> bool {
        if ctx.destination_taken(&destination) {
            ctx.skip_existing(what, &destination);
            return false;
        }

        let resolved = ProcessedRegistry::resolve(source);
        let moved = FileOrganizer::execute(ctx, source, &destination);
        if moved {
            ctx.processed.claim_resolved(resolved);
        }
        moved
    }
}

/// A listed path with its raw final component and a lossy copy of it.
///
/// Destinations are always built from `leaf` so a move never renames;
/// `name` is only for matching and messages.
struct Named {
    path: PathBuf,
    leaf: OsString,
    name: String,
}

impl Named {
    fn of(path: PathBuf) -> Option<Self> {
        let leaf = path.file_name()?.to_os_string();
        let name = leaf.to_string_lossy().into_owned();
        Some(Self { path, leaf, name })
    }
}
