//! Program element views.
//!
//! Views are toolkit-independent adapters between the model and whatever
//! paints it. They carry only visual state (insert indicators, play-head,
//! bounds) and never mutate the model themselves.

pub mod container_view;
pub mod element_view;
pub mod geometry;
pub mod id;
pub mod view_tree;

pub use container_view::ContainerView;
pub use element_view::{
    has_execution_state, ComponentHandle, ElementView, ExecutionMark, InsertIndicator,
};
pub use geometry::{Point, Rect};
pub use id::{ContainerViewId, ViewId};
pub use view_tree::{Reachable, ViewTree};
