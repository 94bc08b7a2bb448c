//! mediabot - sorts downloaded media into `Series/<Show>` and `Movies/`
//!
//! This library classifies video and subtitle files by their names, moves
//! them into the two destination folders in four ordered passes, and can
//! clean up the directories left empty or undo the whole run while the
//! process is still alive.

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod destination;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod pattern;
pub mod scanner;
pub mod undo;

pub use cleanup::{CleanupReport, EmptyDirReaper};
pub use config::{ConfigError, MediaConfig};
pub use destination::DestinationFolders;
pub use file_category::{Category, ExtensionSet};
pub use file_organizer::{FileOrganizer, MoveLedger, MoveRecord, RunContext};
pub use pattern::{Classification, classify};
pub use scanner::{ScanPass, TreeScanner};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Args, PostRunAction, RunOptions, Session, SetupError, run_cli};
