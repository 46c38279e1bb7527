//! Unique identifiers for view instances.
//!
//! View ids are drawn from process-wide counters so that two views are never
//! equal, even when the elements they render are identical in content.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an element view instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

impl ViewId {
    pub fn next() -> Self {
        Self(NEXT_VIEW_ID.fetch_add(1, Ordering::SeqCst))
    }
}

/// Unique identifier for a container view instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerViewId(pub u64);

static NEXT_CONTAINER_VIEW_ID: AtomicU64 = AtomicU64::new(1);

impl ContainerViewId {
    pub fn next() -> Self {
        Self(NEXT_CONTAINER_VIEW_ID.fetch_add(1, Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_fresh() {
        let a = ViewId::next();
        let b = ViewId::next();
        assert_ne!(a, b);
        assert_ne!(ContainerViewId::next(), ContainerViewId::next());
    }
}
