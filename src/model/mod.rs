//! Program model.
//!
//! A program is a tree of containers and elements held in one
//! [`ProgramTree`]. Each [`ContainerModel`] is an ordered list of element
//! ids built on [`crate::collections::UniqueNodeLinkedList`], so an element
//! can never appear twice in the same container, and the tree makes sure it
//! belongs to exactly one container at a time.
//!
//! # Design
//!
//! - **Ids, not pointers**: elements, containers and back-references are
//!   plain ids into flat maps.
//! - **Moves are remove-then-insert**: never in-place mutation of a list
//!   position.
//! - **One lock per program**: [`SharedProgram`] guards the whole tree.

pub mod container;
pub mod element;
pub mod id;
pub mod tree;

pub use container::ContainerModel;
pub use element::{ElementBody, ProgramElement};
pub use id::{ContainerId, ElementId};
pub use tree::{lock_program, ProgramTree, SharedProgram};
