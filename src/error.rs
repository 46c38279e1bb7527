//! Error handling for the sequence builder
//!
//! Structural editing operations (insert, remove, move) never produce errors;
//! they report `false`/`None` so interactive editing can treat them as
//! ordinary negative outcomes. This type covers everything else: I/O,
//! persistence, configuration and device playback.

use thiserror::Error;

/// Main error type for sequence builder operations
#[derive(Error, Debug)]
pub enum SequenceError {
    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to reading or writing sequence documents
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A saved sequence referenced by a link could not be found
    #[error("Unknown sequence: {0}")]
    UnknownSequence(String),

    /// Saved sequences invoked each other deeper than allowed
    #[error("Saved sequence call depth exceeded ({depth})")]
    CallDepthExceeded { depth: usize },

    /// Errors reported by the device controller during playback
    #[error("Device error: {0}")]
    Device(String),

    /// Errors raised while executing a sequence
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SequenceError>,
    },
}

impl SequenceError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SequenceError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for sequence builder operations
pub type Result<T> = std::result::Result<T, SequenceError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SequenceError::UnknownSequence("dance".to_string());
        assert_eq!(err.to_string(), "Unknown sequence: dance");
    }

    #[test]
    fn test_error_with_context() {
        let err = SequenceError::Persistence("bad version".to_string());
        let with_ctx = err.with_context("Failed to open wave.json");
        assert!(with_ctx.to_string().contains("Failed to open wave.json"));
        assert!(with_ctx.to_string().contains("bad version"));
    }

    #[test]
    fn test_call_depth_error() {
        let err = SequenceError::CallDepthExceeded { depth: 16 };
        assert!(err.to_string().contains("16"));
    }

    #[test]
    fn test_result_ext_context() {
        let res: Result<()> = Err(SequenceError::Device("port closed".to_string()));
        let err = res.context("Playing expression").unwrap_err();
        assert!(matches!(err, SequenceError::WithContext { .. }));
    }
}
