//! Playlist Rotator Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod clients;
pub mod config;
pub mod rotation;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig, StorageBackend};
pub use rotation::{
    Entry, EntryStore, FileEntryStore, RotationEngine, RotationList, RotationMode,
    RotationOutcome, RotationStatus, SqliteEntryStore,
};
