//! Lookup of saved sequences by name.
//!
//! Links and saved-sequence elements refer to other sequences by name; the
//! executor resolves those names through a [`SequenceLibrary`].

use crate::error::{Result, SequenceError};
use crate::persistence::{SequenceDocument, SEQUENCE_FILE_EXTENSION};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Source of saved sequences
pub trait SequenceLibrary: Send + Sync {
    /// Load the sequence called `name`
    fn load(&self, name: &str) -> Result<SequenceDocument>;

    /// Names of every available sequence, sorted
    fn names(&self) -> Vec<String>;
}

/// Library backed by a directory of `<name>.json` files
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    dir: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a sequence called `name` lives in
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file = Path::new(name);
        if file.extension().is_some_and(|e| e == SEQUENCE_FILE_EXTENSION) {
            self.dir.join(file)
        } else {
            self.dir.join(format!("{name}.{SEQUENCE_FILE_EXTENSION}"))
        }
    }

    /// Save `doc` under its own name
    pub fn store(&self, doc: &SequenceDocument) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&doc.name);
        doc.save(&path)?;
        Ok(path)
    }
}

impl SequenceLibrary for DirectoryLibrary {
    fn load(&self, name: &str) -> Result<SequenceDocument> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(SequenceError::UnknownSequence(name.to_string()));
        }
        SequenceDocument::load(&path)
    }

    fn names(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == SEQUENCE_FILE_EXTENSION))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }
}

/// Library held in memory
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    sequences: RwLock<HashMap<String, SequenceDocument>>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, doc: SequenceDocument) -> Self {
        self.insert(doc);
        self
    }

    pub fn insert(&self, doc: SequenceDocument) {
        self.sequences
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(doc.name.clone(), doc);
    }
}

impl SequenceLibrary for InMemoryLibrary {
    fn load(&self, name: &str) -> Result<SequenceDocument> {
        self.sequences
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| SequenceError::UnknownSequence(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sequences
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
