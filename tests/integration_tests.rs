/// Integration tests for mediabot
///
/// These tests run whole sessions against temporary trees:
/// 1. The basic series/movies split and cleanup
/// 2. Dry-run non-mutation
/// 3. Undo round-trips
/// 4. Collision safety and at-most-once moves
/// 5. Configuration and root validation
use clap::Parser;
use mediabot::cli::{Args, RunOptions, Session, SetupError, run_cli};
use mediabot::config::{ConfigError, MediaConfig};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary source root with helpers to build and inspect a tree.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file, creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &str) {
        let path = self.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    fn create_dir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create directory");
    }

    fn config(&self) -> MediaConfig {
        MediaConfig {
            default_path: self.path().to_path_buf(),
            video_extensions: vec![".mkv".to_string(), ".mp4".to_string()],
            subtitle_extensions: vec![".srt".to_string()],
        }
    }

    /// Write a TOML config next to the tree and return its path.
    fn write_config(&self) -> PathBuf {
        let path = self.path().join("mediabot.toml");
        let content = format!(
            "default_path = \"{}\"\nvideo_extensions = [\"mkv\", \".MP4\"]\nsubtitle_extensions = [\".srt\"]\n",
            self.path().display()
        );
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    fn start(&self, preview: bool) -> Session {
        let options = RunOptions {
            root: None,
            preview,
        };
        Session::start(&self.config(), &options).expect("Session should start")
    }

    /// Every path under the root with file contents, for exact comparisons.
    fn snapshot(&self) -> BTreeMap<PathBuf, Option<String>> {
        WalkDir::new(self.path())
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|entry| {
                let rel = entry
                    .path()
                    .strip_prefix(self.path())
                    .expect("Entry under root")
                    .to_path_buf();
                let content = if entry.file_type().is_file() {
                    Some(fs::read_to_string(entry.path()).expect("Readable file"))
                } else {
                    None
                };
                (rel, content)
            })
            .collect()
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }
}

// ============================================================================
// Organization
// ============================================================================

#[test]
fn test_example_scenario_with_cleanup() {
    let fixture = TestFixture::new();
    fixture.create_file("Movies_Raw/Show.Name.S01E02.mkv", "episode");
    fixture.create_file("Movies_Raw/Random.Movie.2019.mp4", "movie");

    let mut session = fixture.start(false);
    assert_eq!(session.moved(), 2);

    let report = session.cleanup();

    fixture.assert_file_exists("Series/Show Name/Show.Name.S01E02.mkv");
    fixture.assert_file_exists("Movies/Random.Movie.2019.mp4");
    fixture.assert_not_exists("Movies_Raw");
    assert_eq!(report.removed.len(), 1);
}

#[test]
fn test_separator_variants_share_one_show_folder() {
    let fixture = TestFixture::new();
    fixture.create_file("a/Show.Name.S01E02.mkv", "1");
    fixture.create_file("b/Show_Name_S01E03.mkv", "2");
    fixture.create_file("c/show name s01e04.mkv", "3");

    let session = fixture.start(false);

    assert_eq!(session.moved(), 3);
    fixture.assert_file_exists("Series/Show Name/Show.Name.S01E02.mkv");
    fixture.assert_file_exists("Series/Show Name/Show_Name_S01E03.mkv");
    fixture.assert_file_exists("Series/Show Name/show name s01e04.mkv");
    let shows: Vec<_> = fs::read_dir(fixture.path().join("Series"))
        .unwrap()
        .collect();
    assert_eq!(shows.len(), 1);
}

#[test]
fn test_episode_folder_moves_whole() {
    let fixture = TestFixture::new();
    fixture.create_file("The.Wire.S02E05/the.wire.mkv", "ep");
    fixture.create_file("The.Wire.S02E05/the.wire.srt", "sub");
    fixture.create_file("The.Wire.S02E05/Extras/notes.txt", "notes");

    let session = fixture.start(false);

    assert_eq!(session.moved(), 1);
    fixture.assert_file_exists("Series/The Wire/The.Wire.S02E05/the.wire.mkv");
    fixture.assert_file_exists("Series/The Wire/The.Wire.S02E05/the.wire.srt");
    fixture.assert_file_exists("Series/The Wire/The.Wire.S02E05/Extras/notes.txt");
    fixture.assert_not_exists("The.Wire.S02E05");
}

#[test]
fn test_unrecognized_files_stay_put() {
    let fixture = TestFixture::new();
    fixture.create_file("docs/readme.txt", "hello");
    fixture.create_file("Show.S01E01.nfo", "info");

    let session = fixture.start(false);

    assert_eq!(session.moved(), 0);
    fixture.assert_file_exists("docs/readme.txt");
    fixture.assert_file_exists("Show.S01E01.nfo");
    fixture.assert_not_exists("Series");
    fixture.assert_not_exists("Movies");
}

#[test]
fn test_already_organized_content_is_not_reprocessed() {
    let fixture = TestFixture::new();
    fixture.create_file("Series/Show/Show.S01E01.mkv", "ep");
    fixture.create_file("Movies/Film.2001.mkv", "film");

    let session = fixture.start(false);

    assert_eq!(session.moved(), 0);
    fixture.assert_file_exists("Series/Show/Show.S01E01.mkv");
    fixture.assert_file_exists("Movies/Film.2001.mkv");
}

#[test]
fn test_cleanup_keeps_directories_with_other_files() {
    let fixture = TestFixture::new();
    fixture.create_file("Downloads/Film.2019.mkv", "film");
    fixture.create_file("Downloads/readme.txt", "keep me");
    fixture.create_dir("Downloads/Empty/Deeper");

    let mut session = fixture.start(false);
    session.cleanup();

    fixture.assert_file_exists("Downloads/readme.txt");
    fixture.assert_not_exists("Downloads/Empty");
    fixture.assert_file_exists("Movies/Film.2019.mkv");
}

// ============================================================================
// Safety properties
// ============================================================================

#[test]
fn test_collision_preserves_existing_destination() {
    let fixture = TestFixture::new();
    fixture.create_file("Movies/Film.2019.mkv", "already here");
    fixture.create_file("Downloads/Film.2019.mkv", "incoming");

    let session = fixture.start(false);

    assert_eq!(session.moved(), 0);
    assert_eq!(session.context().counters.skipped, 1);
    assert_eq!(fixture.read("Movies/Film.2019.mkv"), "already here");
    assert_eq!(fixture.read("Downloads/Film.2019.mkv"), "incoming");
}

#[test]
fn test_each_source_appears_once_in_ledger() {
    for preview in [false, true] {
        let fixture = TestFixture::new();
        fixture.create_file("Show.S01E01/Show.S01E01.mkv", "ep");
        fixture.create_file("Show.S01E01/Show.S01E01.srt", "sub");
        fixture.create_file("Show.S01E01/Sub/Show.S01E01.en.srt", "nested sub");
        fixture.create_file("Other.S01E02.mkv", "loose");
        fixture.create_file("Film.2019.mp4", "film");

        let session = fixture.start(preview);
        let records = session.context().ledger.records();
        let sources: HashSet<_> = records.iter().map(|r| r.source.clone()).collect();

        assert_eq!(sources.len(), records.len(), "preview = {}", preview);
        assert_eq!(records.len(), 3, "preview = {}", preview);
    }
}

#[test]
fn test_dry_run_leaves_tree_identical() {
    let fixture = TestFixture::new();
    fixture.create_file("Movies_Raw/Show.Name.S01E02.mkv", "episode");
    fixture.create_file("Movies_Raw/Random.Movie.2019.mp4", "movie");
    fixture.create_file("Show.S03E04/ep.mkv", "folder ep");
    fixture.create_dir("Empty");
    let before = fixture.snapshot();

    let mut session = fixture.start(true);
    let report = session.cleanup();

    assert_eq!(fixture.snapshot(), before);
    assert_eq!(session.moved(), 3);
    assert_eq!(session.context().ledger.len(), 3);
    assert!(report.removed.contains(&session.root().join("Empty")));
}

#[test]
fn test_undo_restores_original_tree() {
    let fixture = TestFixture::new();
    fixture.create_file("Show.Name.S01E01/ep.mkv", "ep");
    fixture.create_file("Show.Name.S01E01/ep.srt", "sub");
    fixture.create_file("Downloads/Other.Show.2x03.mp4", "other");
    fixture.create_file("Downloads/Film.2019.mkv", "film");
    fixture.create_file("Downloads/readme.nfo", "info");
    fixture.create_file("notes.txt", "notes");
    let before = fixture.snapshot();

    let mut session = fixture.start(false);
    let moved = session.moved();
    assert_eq!(moved, 3);
    fixture.assert_file_exists("Series/Other Show/Other.Show.2x03.mp4");

    let report = session.undo();

    assert_eq!(report.restored_files, moved);
    assert!(report.is_complete_success());
    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_undo_after_cleanup_restores_reaped_dirs() {
    let fixture = TestFixture::new();
    fixture.create_file("Movies_Raw/Show.Name.S01E02.mkv", "episode");
    fixture.create_file("Movies_Raw/Random.Movie.2019.mp4", "movie");
    fixture.create_dir("Leftover/Empty");
    let before = fixture.snapshot();

    let mut session = fixture.start(false);
    session.cleanup();
    fixture.assert_not_exists("Movies_Raw");
    fixture.assert_not_exists("Leftover");

    let report = session.undo();

    assert_eq!(report.restored_files, 2);
    assert_eq!(report.recreated_dirs, 3);
    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_undo_skips_items_removed_after_run() {
    let fixture = TestFixture::new();
    fixture.create_file("a/Film.One.mkv", "one");
    fixture.create_file("a/Film.Two.mkv", "two");

    let mut session = fixture.start(false);
    fs::remove_file(fixture.path().join("Movies/Film.One.mkv")).unwrap();

    let report = session.undo();

    assert_eq!(report.restored_files, 1);
    assert_eq!(report.skipped_files.len(), 1);
    fixture.assert_file_exists("a/Film.Two.mkv");
}

// ============================================================================
// Configuration and CLI
// ============================================================================

#[test]
fn test_run_cli_with_toml_config() {
    let fixture = TestFixture::new();
    fixture.create_file("Raw/Show.S01E01.MP4", "ep");
    let config = fixture.write_config();

    let args = Args::parse_from([
        "mediabot",
        "--config",
        config.to_str().unwrap(),
        "--action",
        "cleanup",
    ]);
    run_cli(&args).expect("Run should succeed");

    fixture.assert_file_exists("Series/Show/Show.S01E01.MP4");
    fixture.assert_not_exists("Raw");
    fixture.assert_file_exists("mediabot.toml");
}

#[test]
fn test_run_cli_with_json_config_and_explicit_root() {
    let fixture = TestFixture::new();
    fixture.create_file("media/Film.2019.mkv", "film");
    let config = fixture.path().join("config.json");
    fs::write(
        &config,
        r#"{"default_path": "/nonexistent/default", "video_extensions": [".mkv"], "subtitle_extensions": [".srt"]}"#,
    )
    .unwrap();
    let root = fixture.path().join("media");

    let args = Args::parse_from([
        "mediabot",
        "-c",
        config.to_str().unwrap(),
        "-a",
        "none",
        root.to_str().unwrap(),
    ]);
    run_cli(&args).expect("Run should succeed");

    fixture.assert_file_exists("media/Movies/Film.2019.mkv");
}

#[test]
fn test_dry_run_via_cli_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("Raw/Show.S01E01.mkv", "ep");
    let config = fixture.write_config();
    let before = fixture.snapshot();

    let args = Args::parse_from(["mediabot", "-n", "-c", config.to_str().unwrap()]);
    run_cli(&args).expect("Dry run should succeed");

    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_missing_config_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_file("Film.2019.mkv", "film");
    let missing = fixture.path().join("missing.toml");

    let args = Args::parse_from(["mediabot", "-c", missing.to_str().unwrap()]);
    let err = run_cli(&args).unwrap_err();

    assert!(matches!(
        err,
        SetupError::Config(ConfigError::ConfigNotFound(_))
    ));
    fixture.assert_file_exists("Film.2019.mkv");
}

#[test]
fn test_malformed_config_is_fatal() {
    let fixture = TestFixture::new();
    let config = fixture.path().join("bad.toml");
    fs::write(&config, "default_path = \n").unwrap();

    let args = Args::parse_from(["mediabot", "-c", config.to_str().unwrap()]);
    let err = run_cli(&args).unwrap_err();

    assert!(matches!(err, SetupError::Config(_)));
}

#[test]
fn test_nonexistent_root_is_fatal() {
    let fixture = TestFixture::new();
    let options = RunOptions {
        root: Some(fixture.path().join("nowhere")),
        preview: false,
    };

    let err = Session::start(&fixture.config(), &options).err();

    assert!(matches!(err, Some(SetupError::RootNotFound(_))));
    fixture.assert_not_exists("Series");
    fixture.assert_not_exists("Movies");
}
