//! Core data types for the sequence builder
//!
//! This module contains the value types shared by the model, the views and
//! playback: element kinds, insert positions, device snapshots and loop
//! conditions.
//!
//! # Main Types
//!
//! - [`ElementKind`] - Closed set of program element kinds
//! - [`InsertPosition`] - Before/after placement relative to a reference element
//! - [`DeviceServiceSnapshot`] - Opaque device output state captured by an expression
//! - [`Condition`] - Sensor comparison driving a conditional loop
//!
//! # Device Snapshots
//!
//! A snapshot is a set of named services (e.g. `"led"`, `"motor"`), each
//! carrying named operations with string parameters. The sequence builder
//! only compares and copies snapshots; interpreting them is the job of a
//! [`crate::execution::DeviceController`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of program element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Snapshot of device output state
    Expression,
    /// Repeats its body a fixed number of times
    CounterLoop,
    /// Repeats its body while a condition holds
    LoopableConditional,
    /// Runs two branches concurrently
    Fork,
    /// Jumps to another saved sequence
    Link,
    /// Invokes a previously saved sequence file
    SavedSequence,
}

impl ElementKind {
    /// All element kinds in palette order
    pub fn all() -> &'static [ElementKind] {
        &[
            ElementKind::Expression,
            ElementKind::CounterLoop,
            ElementKind::LoopableConditional,
            ElementKind::Fork,
            ElementKind::Link,
            ElementKind::SavedSequence,
        ]
    }

    /// Whether elements of this kind hold child elements
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ElementKind::CounterLoop | ElementKind::LoopableConditional | ElementKind::Fork
        )
    }

    /// Display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            ElementKind::Expression => "Expression",
            ElementKind::CounterLoop => "Loop",
            ElementKind::LoopableConditional => "Loop While",
            ElementKind::Fork => "Do Both",
            ElementKind::Link => "Link",
            ElementKind::SavedSequence => "Sequence",
        }
    }

    /// Icon resource name handed to the rendering toolkit
    pub fn icon_name(&self) -> &'static str {
        match self {
            ElementKind::Expression => "expression",
            ElementKind::CounterLoop => "counter_loop",
            ElementKind::LoopableConditional => "conditional_loop",
            ElementKind::Fork => "fork",
            ElementKind::Link => "link",
            ElementKind::SavedSequence => "saved_sequence",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Where an element goes relative to a reference element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InsertPosition {
    Before,
    #[default]
    After,
}

/// Named string parameters of one device operation
pub type OperationParameters = BTreeMap<String, String>;

/// State of one device service: its operations and their parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceState {
    pub operations: BTreeMap<String, OperationParameters>,
}

/// Immutable snapshot of device output state captured by an expression
///
/// Compared and copied as a value; never interpreted by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceServiceSnapshot {
    services: BTreeMap<String, ServiceState>,
}

impl DeviceServiceSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation with parameters to a service
    pub fn with_operation<I, K, V>(
        mut self,
        service: impl Into<String>,
        operation: impl Into<String>,
        parameters: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.services
            .entry(service.into())
            .or_default()
            .operations
            .insert(operation.into(), params);
        self
    }

    /// Iterate services by name
    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceState)> {
        self.services.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up one service
    pub fn service(&self, name: &str) -> Option<&ServiceState> {
        self.services.get(name)
    }

    /// Total number of operations across all services
    pub fn operation_count(&self) -> usize {
        self.services.values().map(|s| s.operations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.operation_count() == 0
    }
}

/// Comparison applied to a sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Comparison {
    #[default]
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::LessThan => "<",
            Comparison::GreaterThan => ">",
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
        }
    }
}

/// Sensor condition evaluated by a conditional loop on each iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Device service providing the reading (e.g. `"analog_input"`)
    pub service: String,
    /// Port or channel on that service
    pub port: u32,
    pub comparison: Comparison,
    pub threshold: i32,
}

impl Condition {
    pub fn new(service: impl Into<String>, port: u32, comparison: Comparison, threshold: i32) -> Self {
        Self {
            service: service.into(),
            port,
            comparison,
            threshold,
        }
    }

    /// Whether `reading` satisfies this condition
    pub fn holds(&self, reading: i32) -> bool {
        match self.comparison {
            Comparison::LessThan => reading < self.threshold,
            Comparison::GreaterThan => reading > self.threshold,
            Comparison::Equal => reading == self.threshold,
            Comparison::NotEqual => reading != self.threshold,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] {} {}",
            self.service,
            self.port,
            self.comparison.symbol(),
            self.threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_kinds() {
        let containers: Vec<_> = ElementKind::all()
            .iter()
            .filter(|k| k.is_container())
            .collect();
        assert_eq!(containers.len(), 3);
        assert!(!ElementKind::Link.is_container());
    }

    #[test]
    fn test_snapshot_value_semantics() {
        let a = DeviceServiceSnapshot::new()
            .with_operation("led", "set", [("port", "1"), ("intensity", "255")]);
        let b = DeviceServiceSnapshot::new()
            .with_operation("led", "set", [("intensity", "255"), ("port", "1")]);
        assert_eq!(a, b);
        assert_eq!(a.operation_count(), 1);
        assert!(!a.is_empty());
        assert!(DeviceServiceSnapshot::new().is_empty());
        assert!(a.service("led").is_some());
        assert!(a.service("motor").is_none());
    }

    #[test]
    fn test_condition_holds() {
        let cond = Condition::new("distance", 0, Comparison::LessThan, 30);
        assert!(cond.holds(10));
        assert!(!cond.holds(30));
        let cond = Condition::new("light", 2, Comparison::NotEqual, 0);
        assert!(cond.holds(5));
        assert_eq!(cond.to_string(), "light[2] != 0");
    }
}
