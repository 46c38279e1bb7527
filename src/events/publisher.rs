//! Broadcasts of view-wide events.
//!
//! The publisher is bound to one root container view and turns a broadcast
//! into a single [`UiCommand`] naming that root. The UI task resolves the
//! root to every reachable view when it applies the command, so publishing
//! is safe from any thread and never touches a view directly.

use crate::events::bridge::{UiCommand, UiHandle};
use crate::view::id::ContainerViewId;
use std::sync::Mutex;

/// Publishes "hide insert locations" and "reset views" to every live view.
#[derive(Debug)]
pub struct ViewEventPublisher {
    ui: UiHandle,
    root: Mutex<Option<ContainerViewId>>,
}

impl ViewEventPublisher {
    /// Create an unbound publisher.
    pub fn new(ui: UiHandle) -> Self {
        Self {
            ui,
            root: Mutex::new(None),
        }
    }

    /// Create a publisher already bound to `root`.
    pub fn with_root(ui: UiHandle, root: ContainerViewId) -> Self {
        Self {
            ui,
            root: Mutex::new(Some(root)),
        }
    }

    /// Bind the root container view. The first binding wins; later ones
    /// are logged and ignored. Returns whether `root` is now the bound root.
    pub fn bind_root(&self, root: ContainerViewId) -> bool {
        let mut bound = self.root.lock().unwrap_or_else(|p| p.into_inner());
        match *bound {
            None => {
                *bound = Some(root);
                tracing::debug!("View event publisher bound to {:?}", root);
                true
            }
            Some(existing) if existing == root => true,
            Some(existing) => {
                tracing::error!(
                    "View event publisher already bound to {:?}; ignoring {:?}",
                    existing,
                    root
                );
                false
            }
        }
    }

    pub fn root(&self) -> Option<ContainerViewId> {
        *self.root.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Ask every view to hide its insert indicators.
    pub fn publish_hide_insert_locations_event(&self) -> bool {
        self.publish("hide insert locations", |root| UiCommand::HideInsertLocations { root })
    }

    /// Ask every view to clear its execution-time state.
    pub fn publish_reset_views_for_sequence_execution_event(&self) -> bool {
        self.publish("reset views for sequence execution", |root| {
            UiCommand::ResetViewsForSequenceExecution { root }
        })
    }

    fn publish(&self, event: &str, command: impl FnOnce(ContainerViewId) -> UiCommand) -> bool {
        let Some(root) = self.root() else {
            tracing::warn!("No root view bound; dropping {} event", event);
            return false;
        };
        tracing::trace!("Publishing {} event", event);
        self.ui.post(command(root))
    }
}
