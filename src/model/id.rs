//! Identity types for the program model.
//!
//! Ids are allocated by a [`super::ProgramTree`] from monotonically
//! increasing counters and never reused, so a stale id can never alias a
//! newer element.

use std::fmt;

/// Identity of one program element instance.
///
/// Two elements with identical content still have distinct ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identity of one container (the root sequence, a loop body or a fork branch).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

impl ContainerId {
    /// The root container of every program.
    pub const ROOT: ContainerId = ContainerId(0);

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "ContainerId(ROOT)")
        } else {
            write!(f, "ContainerId({})", self.0)
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
