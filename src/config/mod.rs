//! Configuration module for the sequence builder
//!
//! This module handles application configuration including:
//! - Application state persistence (recent sequences, last opened sequence)
//! - Editor settings used while building and running sequences
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.birdbrain.sequence-builder/`
//! - **macOS**: `~/Library/Application Support/dev.birdbrain.sequence-builder/`
//! - **Windows**: `%APPDATA%\dev.birdbrain.sequence-builder\`
//!
//! # Files
//!
//! - `app_state.json` - Recent sequences list and preferences
//! - `sequences/` - Default library of saved sequences
//!
//! # Example
//!
//! ```ignore
//! use sequence_builder::config::AppState;
//!
//! let mut state = AppState::load_or_default();
//! if let Some(path) = state.last_sequence() {
//!     let doc = SequenceDocument::load(path)?;
//! }
//! state.add_recent_sequence("wave.json", "Wave");
//! state.save()?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, SequenceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.birdbrain.sequence-builder";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Directory (under the app data dir) holding saved sequences by default
pub const SEQUENCE_LIBRARY_DIR: &str = "sequences";

/// Maximum number of recent sequences to remember
pub const MAX_RECENT_SEQUENCES: usize = 10;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        SequenceError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            SequenceError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

/// Default saved-sequence library directory
pub fn default_library_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(SEQUENCE_LIBRARY_DIR))
}

// ==================== Recent Sequence Entry ====================

/// Information about a recently opened sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSequence {
    /// Path to the sequence file
    pub path: PathBuf,

    /// Sequence name (from the document)
    pub name: String,

    /// Last opened
    pub last_opened: DateTime<Utc>,
}

impl RecentSequence {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            last_opened: Utc::now(),
        }
    }

    /// Update the last opened timestamp
    pub fn touch(&mut self) {
        self.last_opened = Utc::now();
    }

    /// Check if the sequence file still exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

// ==================== App State ====================

/// Persistent application state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// Recently opened sequences, most recent first
    #[serde(default)]
    pub recent_sequences: Vec<RecentSequence>,

    /// Path to the last opened sequence
    #[serde(default)]
    pub last_sequence_path: Option<PathBuf>,

}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            recent_sequences: Vec::new(),
            last_sequence_path: None,
        }
    }
}

impl AppState {
    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path().ok_or_else(|| {
            SequenceError::Config("Could not determine app state path".to_string())
        })?;
        Self::load_from(path)
    }

    /// Load app state from a specific file; a missing file yields defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SequenceError::Config(format!("Failed to read app state: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| SequenceError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(APP_STATE_FILE))
    }

    /// Save app state to a specific file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SequenceError::Config(format!("Failed to serialize app state: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SequenceError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Add or update a recent sequence and make it the last opened one
    pub fn add_recent_sequence(&mut self, path: impl AsRef<Path>, name: &str) {
        let path = path.as_ref().to_path_buf();

        self.recent_sequences.retain(|s| s.path != path);
        self.recent_sequences
            .insert(0, RecentSequence::new(path.clone(), name));
        self.recent_sequences.truncate(MAX_RECENT_SEQUENCES);

        self.last_sequence_path = Some(path);
    }

    /// Remove a sequence from recents (e.g., if the file was deleted)
    pub fn remove_recent_sequence(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.recent_sequences.retain(|s| s.path != path);

        if self.last_sequence_path.as_deref() == Some(path) {
            self.last_sequence_path = None;
        }
    }

    /// Clean up recent sequences that no longer exist
    pub fn cleanup_missing_sequences(&mut self) {
        self.recent_sequences.retain(|s| s.exists());

        if let Some(ref last) = self.last_sequence_path {
            if !last.exists() {
                self.last_sequence_path = None;
            }
        }
    }

    /// Get the most recent sequence path if it exists
    pub fn last_sequence(&self) -> Option<&Path> {
        self.last_sequence_path
            .as_ref()
            .filter(|p| p.exists())
            .map(|p| p.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_recent_sequences_are_bounded_and_deduplicated() {
        let mut state = AppState::default();
        for i in 0..(MAX_RECENT_SEQUENCES + 3) {
            state.add_recent_sequence(format!("seq{i}.json"), &format!("Seq {i}"));
        }
        state.add_recent_sequence("seq5.json", "Seq 5");

        assert_eq!(state.recent_sequences.len(), MAX_RECENT_SEQUENCES);
        assert_eq!(state.recent_sequences[0].path, PathBuf::from("seq5.json"));
        assert_eq!(
            state
                .recent_sequences
                .iter()
                .filter(|s| s.path == Path::new("seq5.json"))
                .count(),
            1
        );
        assert_eq!(state.last_sequence_path, Some(PathBuf::from("seq5.json")));
    }

    #[test]
    fn test_remove_recent_clears_last() {
        let mut state = AppState::default();
        state.add_recent_sequence("a.json", "A");
        state.remove_recent_sequence("a.json");
        assert!(state.recent_sequences.is_empty());
        assert!(state.last_sequence_path.is_none());
    }

    #[test]
    fn test_cleanup_and_last_sequence() {
        let dir = TempDir::new().unwrap();
        let kept = dir.path().join("kept.json");
        std::fs::write(&kept, "{}").unwrap();

        let mut state = AppState::default();
        state.add_recent_sequence(&kept, "Kept");
        assert_eq!(state.last_sequence(), Some(kept.as_path()));

        state.add_recent_sequence(dir.path().join("gone.json"), "Gone");
        assert!(state.last_sequence().is_none());

        state.cleanup_missing_sequences();
        assert_eq!(state.recent_sequences.len(), 1);
        assert!(state.last_sequence_path.is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APP_STATE_FILE);

        let mut state = AppState::default();
        state.add_recent_sequence("wave.json", "Wave");
        state.save_to(&path).unwrap();

        let loaded = AppState::load_from(&path).unwrap();
        assert_eq!(loaded.last_sequence_path, Some(PathBuf::from("wave.json")));
        assert_eq!(loaded.recent_sequences[0].name, "Wave");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let state: AppState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.version, 1);

        // Fields written by older versions are ignored
        let state: AppState =
            serde_json::from_str(r#"{"version":1,"ui_preferences":{"show_comments":false}}"#)
                .unwrap();
        assert!(state.recent_sequences.is_empty());

        let dir = TempDir::new().unwrap();
        let loaded = AppState::load_from(dir.path().join("absent.json")).unwrap();
        assert!(loaded.recent_sequences.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APP_STATE_FILE);
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AppState::load_from(&path),
            Err(SequenceError::Config(_))
        ));
    }
}
