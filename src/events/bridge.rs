//! Thread boundary between background work and the UI task.
//!
//! Views are only ever mutated on the UI task. Import workers, the executor
//! and the publisher post [`UiCommand`]s through a cloneable [`UiHandle`];
//! the UI task drains the [`UiQueue`] and applies them to its view tree.
//!
//! The queue is unbounded. The UI task posts to it too (hover indicators,
//! the end-of-drag broadcast) and is also its only consumer, so a post must
//! never wait for room.

use crate::model::ElementId;
use crate::transfer::worker::ImportOutcome;
use crate::types::InsertPosition;
use crate::view::id::{ContainerViewId, ViewId};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Commands applied by the UI task to its views.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// Hide every insert indicator reachable from `root`.
    HideInsertLocations { root: ContainerViewId },

    /// Clear execution-time state on every view reachable from `root`.
    ResetViewsForSequenceExecution { root: ContainerViewId },

    /// Show one insert indicator on an element view.
    ShowInsertLocation {
        target: ViewId,
        position: InsertPosition,
    },

    /// Show the "append here" indicator of a container view.
    ShowEndInsertLocation(ContainerViewId),

    /// Move the play-head to an element.
    HighlightElement(ElementId),

    /// A drop import finished on a worker.
    ImportFinished(ImportOutcome),
}

/// Sending half, cloned into every thread that talks to the UI.
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: Sender<UiCommand>,
}

impl UiHandle {
    /// Post a command without blocking. Returns `false` when the UI task
    /// is gone.
    pub fn post(&self, command: UiCommand) -> bool {
        if self.tx.send(command).is_err() {
            tracing::trace!("UI queue closed; command dropped");
            return false;
        }
        true
    }

    pub fn hide_insert_locations(&self, root: ContainerViewId) {
        let _ = self.post(UiCommand::HideInsertLocations { root });
    }

    pub fn reset_views_for_sequence_execution(&self, root: ContainerViewId) {
        let _ = self.post(UiCommand::ResetViewsForSequenceExecution { root });
    }

    pub fn highlight(&self, element: ElementId) {
        let _ = self.post(UiCommand::HighlightElement(element));
    }
}

/// Receiving half, owned by the UI task.
#[derive(Debug)]
pub struct UiQueue {
    rx: Receiver<UiCommand>,
}

impl UiQueue {
    /// Drain all pending commands.
    pub fn drain(&self) -> Vec<UiCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    /// Try to receive a single command without blocking.
    pub fn try_recv(&self) -> Option<UiCommand> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next command.
    ///
    /// Returns `None` on timeout or when every handle is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<UiCommand> {
        match self.rx.recv_timeout(timeout) {
            Ok(command) => Some(command),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Factory for the UI command channel.
pub struct UiBridge;

impl UiBridge {
    /// Create a new `(handle, queue)` pair.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (UiHandle, UiQueue) {
        let (tx, rx) = unbounded();
        (UiHandle { tx }, UiQueue { rx })
    }
}
