//! Structured documents for saved sequences.
//!
//! [`SequenceDocument`] is the persisted form of a program: a versioned,
//! self-contained tree of [`ElementDocument`]s with no element ids. The same
//! element documents are used as drag payloads, which makes every dragged
//! element a full deep copy of its source.
//!
//! Documents are stored as pretty-printed JSON.

use crate::error::{Result, SequenceError};
use crate::types::{Condition, DeviceServiceSnapshot, ElementKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current sequence document format version
pub const SEQUENCE_FORMAT_VERSION: u32 = 1;

/// Sequence file extension
pub const SEQUENCE_FILE_EXTENSION: &str = "json";

/// Fields shared by every element kind
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementHeader {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub comment_visible: bool,
}

impl ElementHeader {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Deep, id-free description of one program element and its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementDocument {
    Expression {
        header: ElementHeader,
        snapshot: DeviceServiceSnapshot,
        #[serde(default)]
        delay_ms: u64,
    },
    CounterLoop {
        header: ElementHeader,
        iterations: u32,
        #[serde(default)]
        children: Vec<ElementDocument>,
    },
    LoopableConditional {
        header: ElementHeader,
        condition: Condition,
        #[serde(default)]
        children: Vec<ElementDocument>,
    },
    Fork {
        header: ElementHeader,
        #[serde(default)]
        left: Vec<ElementDocument>,
        #[serde(default)]
        right: Vec<ElementDocument>,
    },
    Link {
        header: ElementHeader,
        target: String,
    },
    SavedSequence {
        header: ElementHeader,
        file_name: String,
    },
}

impl ElementDocument {
    pub fn expression(name: impl Into<String>, snapshot: DeviceServiceSnapshot) -> Self {
        ElementDocument::Expression {
            header: ElementHeader::named(name),
            snapshot,
            delay_ms: 0,
        }
    }

    pub fn counter_loop(
        name: impl Into<String>,
        iterations: u32,
        children: Vec<ElementDocument>,
    ) -> Self {
        ElementDocument::CounterLoop {
            header: ElementHeader::named(name),
            iterations,
            children,
        }
    }

    pub fn conditional(
        name: impl Into<String>,
        condition: Condition,
        children: Vec<ElementDocument>,
    ) -> Self {
        ElementDocument::LoopableConditional {
            header: ElementHeader::named(name),
            condition,
            children,
        }
    }

    pub fn fork(
        name: impl Into<String>,
        left: Vec<ElementDocument>,
        right: Vec<ElementDocument>,
    ) -> Self {
        ElementDocument::Fork {
            header: ElementHeader::named(name),
            left,
            right,
        }
    }

    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        ElementDocument::Link {
            header: ElementHeader::named(name),
            target: target.into(),
        }
    }

    pub fn saved_sequence(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        ElementDocument::SavedSequence {
            header: ElementHeader::named(name),
            file_name: file_name.into(),
        }
    }

    pub fn header(&self) -> &ElementHeader {
        match self {
            ElementDocument::Expression { header, .. }
            | ElementDocument::CounterLoop { header, .. }
            | ElementDocument::LoopableConditional { header, .. }
            | ElementDocument::Fork { header, .. }
            | ElementDocument::Link { header, .. }
            | ElementDocument::SavedSequence { header, .. } => header,
        }
    }

    pub fn header_mut(&mut self) -> &mut ElementHeader {
        match self {
            ElementDocument::Expression { header, .. }
            | ElementDocument::CounterLoop { header, .. }
            | ElementDocument::LoopableConditional { header, .. }
            | ElementDocument::Fork { header, .. }
            | ElementDocument::Link { header, .. }
            | ElementDocument::SavedSequence { header, .. } => header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    /// Attach a comment (builder style)
    pub fn with_comment(mut self, comment: impl Into<String>, visible: bool) -> Self {
        let header = self.header_mut();
        header.comment = comment.into();
        header.comment_visible = visible;
        self
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementDocument::Expression { .. } => ElementKind::Expression,
            ElementDocument::CounterLoop { .. } => ElementKind::CounterLoop,
            ElementDocument::LoopableConditional { .. } => ElementKind::LoopableConditional,
            ElementDocument::Fork { .. } => ElementKind::Fork,
            ElementDocument::Link { .. } => ElementKind::Link,
            ElementDocument::SavedSequence { .. } => ElementKind::SavedSequence,
        }
    }

    /// Number of elements in this document, itself included.
    pub fn element_count(&self) -> usize {
        let nested = |docs: &[ElementDocument]| docs.iter().map(Self::element_count).sum::<usize>();
        1 + match self {
            ElementDocument::CounterLoop { children, .. }
            | ElementDocument::LoopableConditional { children, .. } => nested(children),
            ElementDocument::Fork { left, right, .. } => nested(left) + nested(right),
            _ => 0,
        }
    }
}

/// Persisted form of a complete sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDocument {
    /// Format version for future compatibility
    #[serde(default = "default_sequence_version")]
    pub version: u32,

    /// Sequence name
    #[serde(default)]
    pub name: String,

    /// When the document was produced
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,

    /// Top-level elements in program order
    #[serde(default)]
    pub elements: Vec<ElementDocument>,
}

fn default_sequence_version() -> u32 {
    SEQUENCE_FORMAT_VERSION
}

impl Default for SequenceDocument {
    fn default() -> Self {
        Self::new("Untitled Sequence", Vec::new())
    }
}

impl SequenceDocument {
    pub fn new(name: impl Into<String>, elements: Vec<ElementDocument>) -> Self {
        Self {
            version: SEQUENCE_FORMAT_VERSION,
            name: name.into(),
            saved_at: Utc::now(),
            elements,
        }
    }

    /// Number of elements at every nesting level
    pub fn element_count(&self) -> usize {
        self.elements.iter().map(ElementDocument::element_count).sum()
    }

    /// Parse a document from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let doc: SequenceDocument = serde_json::from_str(content)
            .map_err(|e| SequenceError::Persistence(format!("Failed to parse sequence: {}", e)))?;

        if doc.version > SEQUENCE_FORMAT_VERSION {
            return Err(SequenceError::Persistence(format!(
                "Unsupported sequence version {} (newest supported is {})",
                doc.version, SEQUENCE_FORMAT_VERSION
            )));
        }
        Ok(doc)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a sequence document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SequenceError::Persistence(format!("Failed to read sequence {:?}: {}", path, e))
        })?;
        let doc = Self::from_json(&content)
            .map_err(|e| e.with_context(format!("Loading {:?}", path)))?;
        tracing::info!(
            "Loaded sequence '{}' ({} elements) from {:?}",
            doc.name,
            doc.element_count(),
            path
        );
        Ok(doc)
    }

    /// Save the sequence document to disk as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| {
            SequenceError::Persistence(format!("Failed to write sequence {:?}: {}", path, e))
        })?;
        tracing::info!("Saved sequence '{}' to {:?}", self.name, path);
        Ok(())
    }
}
