//! Slot identifiers for arena-backed collections.

use std::fmt;

/// Index into `UniqueNodeLinkedList::slots`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotId(pub u32);

impl SlotId {
    pub const INVALID: SlotId = SlotId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "SlotId(INVALID)")
        } else {
            write!(f, "SlotId({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id() {
        let id = SlotId(3);
        assert!(id.is_valid());
        assert_eq!(id.index(), 3);
        assert!(!SlotId::INVALID.is_valid());
        assert_eq!(format!("{:?}", SlotId::INVALID), "SlotId(INVALID)");
    }
}
