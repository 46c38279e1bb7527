//! # Sequence Builder: program model and drag-and-drop core
//!
//! The editing core of a visual programmer for robotics kits. Users build a
//! program by dragging elements (expressions, loops, forks, links to saved
//! sequences) into nested containers and then play it back on a device.
//!
//! ## Architecture
//!
//! - **Collections**: [`collections::UniqueNodeLinkedList`], an ordered list
//!   with O(1) membership and neighbour queries that never holds a value twice
//! - **Model**: [`model::ProgramTree`], the arena of every element and
//!   container of one program, shared behind one lock
//! - **Views**: [`view::ViewTree`], toolkit-independent element and container
//!   views carrying insert indicators and the play-head
//! - **Transfer**: [`transfer::TransferHandler`], the hover / validate /
//!   import state machine, with drops applied on background workers
//! - **Events**: [`events::ViewEventPublisher`] and the UI command queue
//! - **Execution**: [`execution::SequenceExecutor`], playback against a
//!   [`execution::DeviceController`]
//!
//! ## Threading
//!
//! Views are only touched on the UI task, which drains the command queue in
//! [`editor::SequenceEditor::pump`]. Import workers and the executor post
//! commands from their own threads.
//!
//! ## Configuration
//!
//! Application state (recent sequences, preferences) is stored in the
//! platform-appropriate data directory under `dev.birdbrain.sequence-builder`.
//!
//! ## Example
//!
//! ```ignore
//! use sequence_builder::{
//!     config::EditorSettings,
//!     editor::SequenceEditor,
//!     model::ProgramTree,
//!     transfer::{DropTarget, TransferSupport},
//! };
//!
//! let mut editor = SequenceEditor::new(ProgramTree::new(), EditorSettings::default());
//! let payload = editor.begin_drag(source_view).unwrap();
//! let support = TransferSupport::drop(payload, DropTarget::Element(target_view), Some(point));
//! if editor.drag_over(&support) && editor.drop(&support) {
//!     editor.pump_until_import_finished(Duration::from_secs(1));
//! }
//! editor.export_done();
//! editor.pump();
//! ```

pub mod collections;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod execution;
pub mod model;
pub mod persistence;
pub mod transfer;
pub mod types;
pub mod view;

pub use error::{Result, ResultExt, SequenceError};
