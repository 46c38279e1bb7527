//! UI command queue and view-wide event broadcasts.

pub mod bridge;
pub mod publisher;

pub use bridge::{UiBridge, UiCommand, UiHandle, UiQueue};
pub use publisher::ViewEventPublisher;
