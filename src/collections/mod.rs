//! Collections used by the program model.
//!
//! [`UniqueNodeLinkedList`] is a doubly-linked list that refuses duplicate
//! values. Nodes live in a flat slot arena and link to each other by
//! [`SlotId`], with a `HashMap` from value to slot for O(1) lookup.

pub mod id;
pub mod unique_list;

pub use id::SlotId;
pub use unique_list::{Iter, UniqueNodeLinkedList};
