//! Drag-and-drop transfer of program elements.
//!
//! - [`payload`]: what is dragged and where it is dropped
//! - [`handler`]: the hover / validate / import state machine
//! - [`worker`]: background threads applying validated drops

pub mod handler;
pub mod payload;
pub mod worker;

pub use handler::{ResolvedDrop, TransferHandler, TransferState, UiIndicator};
pub use payload::{
    DataFlavor, DragSource, DropAction, DropTarget, ElementTransfer, InsertPolicy, TransferKind,
    TransferSupport, Transferable,
};
pub use worker::{apply_import, ImportJob, ImportOutcome, ImportWorker};
