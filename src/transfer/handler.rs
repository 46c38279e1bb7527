//! The drag-and-drop transfer state machine.
//!
//! ```text
//!   Idle ──can_import──▶ DragHover ──import_data──▶ DropValidated
//!    ▲                      │                            │ submit
//!    │◀─────export_done─────┘                            ▼
//!    └──────────────────on_import_finished─────────── Importing
//! ```
//!
//! Hovering only ever posts indicator commands; the model is touched by the
//! import worker once a drop has been validated. Drop targets that do not
//! accept the dragged kind pass the drop outward to the element view that
//! owns their container, so a drop on a restricted loop body lands next to
//! the loop instead.

use crate::config::settings::EditorSettings;
use crate::events::bridge::{UiCommand, UiHandle};
use crate::events::publisher::ViewEventPublisher;
use crate::model::{lock_program, ContainerId, ElementId, ProgramTree, SharedProgram};
use crate::transfer::payload::{
    DataFlavor, DragSource, DropAction, DropTarget, ElementTransfer, InsertPolicy,
    TransferSupport, Transferable,
};
use crate::transfer::worker::{ImportJob, ImportOutcome, ImportWorker};
use crate::types::{ElementKind, InsertPosition};
use crate::view::container_view::ContainerView;
use crate::view::id::{ContainerViewId, ViewId};
use crate::view::view_tree::ViewTree;
use std::sync::Arc;

/// Where the handler is in the drag-and-drop protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    #[default]
    Idle,
    DragHover,
    DropValidated,
    Importing,
}

/// A drop target resolved to a model position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDrop {
    pub container: ContainerId,
    pub reference: Option<ElementId>,
    pub position: InsertPosition,
    /// Indicator to show while hovering.
    pub indicator: UiIndicator,
}

/// The single indicator a hover shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiIndicator {
    Element(ViewId, InsertPosition),
    ContainerEnd(ContainerViewId),
}

impl UiIndicator {
    fn command(self) -> UiCommand {
        match self {
            UiIndicator::Element(target, position) => {
                UiCommand::ShowInsertLocation { target, position }
            }
            UiIndicator::ContainerEnd(cv) => UiCommand::ShowEndInsertLocation(cv),
        }
    }
}

/// Drag source and drop target logic for program element views.
pub struct TransferHandler {
    state: TransferState,
    program: SharedProgram,
    publisher: Arc<ViewEventPublisher>,
    ui: UiHandle,
    workers: ImportWorker,
    element_policy: InsertPolicy,
    next_ticket: u64,
    pending: Option<u64>,
}

impl TransferHandler {
    pub fn new(
        program: SharedProgram,
        publisher: Arc<ViewEventPublisher>,
        ui: UiHandle,
        settings: &EditorSettings,
    ) -> Self {
        let workers = ImportWorker::spawn(Arc::clone(&program), ui.clone(), settings.import_workers);
        Self {
            state: TransferState::Idle,
            program,
            publisher,
            ui,
            workers,
            element_policy: settings.element_insert_policy,
            next_ticket: 1,
            pending: None,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Ticket of the import currently running, if any.
    pub fn pending_import(&self) -> Option<u64> {
        self.pending
    }

    // ── Source side ──

    /// Drag payload for an element view: a deep copy of its element.
    pub fn create_transferable(&self, views: &ViewTree, view: ViewId) -> Option<Transferable> {
        let element = views.element_view(view)?.element();
        let tree = lock_program(&self.program);
        let document = tree.deep_copy(element)?;
        tracing::debug!("Drag started on {:?} ({})", element, document.kind());
        Some(Transferable::ProgramElement(ElementTransfer {
            document,
            source: Some(DragSource {
                epoch: tree.epoch(),
                element,
            }),
        }))
    }

    /// End of a drag on the source side, whether or not anything was
    /// dropped. Always clears every insert indicator.
    pub fn export_done(&mut self) {
        self.publisher.publish_hide_insert_locations_event();
        if self.state != TransferState::Importing {
            self.state = TransferState::Idle;
        }
    }

    // ── Target side ──

    /// Whether `support` may be dropped where it currently hovers.
    ///
    /// Posts a broadcast hiding all indicators and, when the drop is
    /// acceptable, one indicator for the resolved position.
    pub fn can_import(&mut self, views: &ViewTree, support: &TransferSupport) -> bool {
        if self.state == TransferState::Idle {
            self.state = TransferState::DragHover;
        }
        self.publisher.publish_hide_insert_locations_event();

        let resolved = {
            let tree = lock_program(&self.program);
            self.resolve(&tree, views, support)
        };
        match resolved {
            Some(drop) => {
                tracing::trace!("Hover accepted at {:?}", drop.indicator);
                self.ui.post(drop.indicator.command());
                true
            }
            None => false,
        }
    }

    /// Perform a validated drop. The mutation itself runs on an import
    /// worker; its result arrives later as [`UiCommand::ImportFinished`].
    ///
    /// Returns `false`, leaving every model untouched, when the transfer is
    /// not a drop, carries the wrong flavor or cannot be placed.
    pub fn import_data(&mut self, views: &ViewTree, support: &TransferSupport) -> bool {
        if self.state == TransferState::Importing {
            tracing::warn!("Drop ignored while import #{:?} is running", self.pending);
            return false;
        }
        let Some(transfer) = Self::element_payload(support) else {
            return false;
        };
        let resolved = {
            let tree = lock_program(&self.program);
            self.resolve(&tree, views, support)
                .map(|drop| (drop, tree.epoch()))
        };
        let Some((drop, epoch)) = resolved else {
            tracing::debug!("Drop of {} rejected", transfer.kind());
            return false;
        };
        self.state = TransferState::DropValidated;

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let job = ImportJob {
            ticket,
            epoch,
            document: transfer.document.clone(),
            container: drop.container,
            reference: drop.reference,
            position: drop.position,
            source: match support.action {
                DropAction::Move => transfer.source.map(|source| source.element),
                DropAction::Copy => None,
            },
        };
        if !self.workers.submit(job) {
            tracing::error!("Import workers unavailable; drop #{} discarded", ticket);
            self.state = TransferState::Idle;
            return false;
        }
        tracing::debug!(
            "Drop #{} queued: {} into {:?} {:?} {:?}",
            ticket,
            transfer.kind(),
            drop.container,
            drop.position,
            drop.reference
        );
        self.pending = Some(ticket);
        self.state = TransferState::Importing;
        true
    }

    /// Record the outcome of a finished import. Returns `true` when it was
    /// the import this handler was waiting for.
    pub fn on_import_finished(&mut self, outcome: &ImportOutcome) -> bool {
        if self.pending != Some(outcome.ticket) {
            return false;
        }
        self.pending = None;
        self.state = TransferState::Idle;
        if !outcome.success() {
            tracing::warn!("Import #{} changed nothing", outcome.ticket);
        }
        true
    }

    fn element_payload(support: &TransferSupport) -> Option<&ElementTransfer> {
        if !support.is_drop() {
            return None;
        }
        support.transferable.element_transfer()
    }

    /// Resolve the hovered component to a model position, chaining outward
    /// through enclosing element views when a container rejects the kind.
    pub fn resolve(
        &self,
        tree: &ProgramTree,
        views: &ViewTree,
        support: &TransferSupport,
    ) -> Option<ResolvedDrop> {
        if support.flavor() != DataFlavor::ProgramElement {
            return None;
        }
        let transfer = Self::element_payload(support)?;
        let kind = transfer.kind();
        let source = match (support.action, transfer.source) {
            (DropAction::Move, Some(source)) if source.epoch != tree.epoch() => {
                tracing::debug!(
                    "Drag of {:?} started in a program that has since been replaced",
                    source.element
                );
                return None;
            }
            (DropAction::Move, Some(source)) => Some(source.element),
            _ => None,
        };

        let policy = support.target.policy(self.element_policy);
        let mut candidate = match support.target {
            DropTarget::Element(view) => {
                let position = policy.position_for(views.element_view(view)?, support.point);
                Candidate::Element { view, position }
            }
            DropTarget::ContainerEnd(cv) => Candidate::End(cv),
        };

        loop {
            let (container_view, resolved) = match candidate {
                Candidate::Element { view, position } => {
                    let ev = views.element_view(view)?;
                    let cv = views.container_view(ev.container_view())?;
                    let drop = ResolvedDrop {
                        container: cv.container(),
                        reference: Some(ev.element()),
                        position,
                        indicator: UiIndicator::Element(view, position),
                    };
                    (cv, drop)
                }
                Candidate::End(cv_id) => {
                    let cv = views.container_view(cv_id)?;
                    let drop = ResolvedDrop {
                        container: cv.container(),
                        reference: tree.container(cv.container())?.last(),
                        position: InsertPosition::After,
                        indicator: UiIndicator::ContainerEnd(cv_id),
                    };
                    (cv, drop)
                }
            };

            if Self::accepts(container_view, kind) {
                return Self::validate(tree, resolved, source);
            }

            // Hand the drop to the element view owning this container.
            let parent = container_view.parent_view()?;
            tracing::trace!(
                "{:?} rejects {}; chaining to {:?}",
                container_view.id(),
                kind,
                parent
            );
            candidate = Candidate::Element {
                view: parent,
                position: resolved.position,
            };
        }
    }

    fn accepts(view: &ContainerView, kind: ElementKind) -> bool {
        view.supports_flavor(DataFlavor::ProgramElement) && view.accepts(kind)
    }

    /// Reject drops into the moved element's own sub-tree or onto itself.
    fn validate(
        tree: &ProgramTree,
        drop: ResolvedDrop,
        source: Option<ElementId>,
    ) -> Option<ResolvedDrop> {
        if tree.container(drop.container).is_none() {
            return None;
        }
        if let Some(src) = source {
            if drop.reference == Some(src) || tree.is_container_within(drop.container, src) {
                return None;
            }
        }
        Some(drop)
    }
}

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Element { view: ViewId, position: InsertPosition },
    End(ContainerViewId),
}
