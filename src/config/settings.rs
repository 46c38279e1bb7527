//! Editor settings used while building and running sequences
//!
//! These settings shape the behavior of an editing session rather than its
//! contents: how many threads apply drops, which side of an element a drop
//! lands on, and where saved sequences are looked up during playback.

use crate::transfer::InsertPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of import worker threads
pub const DEFAULT_IMPORT_WORKERS: usize = 2;

/// Default limit on nested saved-sequence invocations
pub const DEFAULT_MAX_CALL_DEPTH: usize = 16;

/// Settings for one editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Threads applying validated drops to the program
    pub import_workers: usize,

    /// How element drop targets choose before/after
    pub element_insert_policy: InsertPolicy,

    /// Maximum nesting of saved sequences and links during playback
    pub max_call_depth: usize,

    /// Directory holding saved sequences (`None` = app data default)
    pub library_dir: Option<PathBuf>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            import_workers: DEFAULT_IMPORT_WORKERS,
            element_insert_policy: InsertPolicy::Geometric,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            library_dir: None,
        }
    }
}

impl EditorSettings {
    /// Library directory, falling back to the app data default
    pub fn resolved_library_dir(&self) -> Option<PathBuf> {
        self.library_dir
            .clone()
            .or_else(super::default_library_dir)
    }

    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }
}
