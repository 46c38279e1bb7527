//! Editing session for one sequence.
//!
//! `SequenceEditor` lives on the UI task. It owns the view tree and the
//! receiving end of the UI command queue, shares the program with the import
//! workers, and applies queued commands in [`SequenceEditor::pump`].

use crate::config::settings::EditorSettings;
use crate::error::Result;
use crate::events::bridge::{UiBridge, UiCommand, UiHandle, UiQueue};
use crate::events::publisher::ViewEventPublisher;
use crate::execution::{DeviceController, SequenceExecutor, SequenceLibrary};
use crate::model::{lock_program, ProgramTree, SharedProgram};
use crate::persistence::SequenceDocument;
use crate::transfer::{ImportOutcome, TransferHandler, TransferState, TransferSupport, Transferable};
use crate::view::id::ViewId;
use crate::view::view_tree::ViewTree;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Name given to sequences that were never saved
pub const UNTITLED_SEQUENCE: &str = "Untitled Sequence";

/// One open sequence and everything needed to edit it.
pub struct SequenceEditor {
    program: SharedProgram,
    views: ViewTree,
    queue: UiQueue,
    handler: TransferHandler,
    ui: UiHandle,
    publisher: Arc<ViewEventPublisher>,
    settings: EditorSettings,
    name: String,
    path: Option<PathBuf>,
    last_import: Option<ImportOutcome>,
}

impl SequenceEditor {
    pub fn new(tree: ProgramTree, settings: EditorSettings) -> Self {
        let views = ViewTree::build(&tree);
        let program = tree.into_shared();
        let (ui, queue) = UiBridge::new();
        let publisher = Arc::new(ViewEventPublisher::with_root(ui.clone(), views.root()));
        let handler = TransferHandler::new(
            Arc::clone(&program),
            Arc::clone(&publisher),
            ui.clone(),
            &settings,
        );
        Self {
            program,
            views,
            queue,
            handler,
            ui,
            publisher,
            settings,
            name: UNTITLED_SEQUENCE.to_string(),
            path: None,
            last_import: None,
        }
    }

    pub fn program(&self) -> &SharedProgram {
        &self.program
    }

    pub fn views(&self) -> &ViewTree {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewTree {
        &mut self.views
    }

    pub fn publisher(&self) -> &Arc<ViewEventPublisher> {
        &self.publisher
    }

    /// Handle for posting commands to this editor from other threads.
    pub fn ui_handle(&self) -> UiHandle {
        self.ui.clone()
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn transfer_state(&self) -> TransferState {
        self.handler.state()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ── Drag and drop ──

    pub fn begin_drag(&self, view: ViewId) -> Option<Transferable> {
        self.handler.create_transferable(&self.views, view)
    }

    pub fn drag_over(&mut self, support: &TransferSupport) -> bool {
        self.handler.can_import(&self.views, support)
    }

    pub fn drop(&mut self, support: &TransferSupport) -> bool {
        self.handler.import_data(&self.views, support)
    }

    pub fn export_done(&mut self) {
        self.handler.export_done();
    }

    // ── UI command processing ──

    /// Apply every pending UI command. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let commands = self.queue.drain();
        let count = commands.len();
        for command in commands {
            self.apply(command);
        }
        count
    }

    /// Apply commands until the running import finishes or `timeout`
    /// passes. Returns the outcome of the finished import.
    pub fn pump_until_import_finished(&mut self, timeout: Duration) -> Option<ImportOutcome> {
        let deadline = Instant::now() + timeout;
        while self.handler.pending_import().is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("Timed out waiting for import to finish");
                return None;
            }
            if let Some(command) = self.queue.recv_timeout(remaining) {
                self.apply(command);
            }
        }
        self.pump();
        self.last_import.take()
    }

    fn apply(&mut self, command: UiCommand) {
        match command {
            UiCommand::HideInsertLocations { root } => {
                self.views.hide_insert_locations_from(root);
            }
            UiCommand::ResetViewsForSequenceExecution { root } => {
                self.views.reset_views_for_sequence_execution_from(root);
            }
            UiCommand::ShowInsertLocation { target, position } => {
                self.views.show_insert_location(target, position);
            }
            UiCommand::ShowEndInsertLocation(container_view) => {
                self.views.show_end_insert_location(container_view);
            }
            UiCommand::HighlightElement(element) => {
                self.views.highlight(element);
            }
            UiCommand::ImportFinished(outcome) => {
                self.handler.on_import_finished(&outcome);
                self.sync_views();
                self.last_import = Some(outcome);
            }
        }
    }

    fn sync_views(&mut self) {
        let tree = lock_program(&self.program);
        self.views.sync(&tree);
    }

    // ── Editing ──

    /// Delete the element shown by `view`, with everything inside it.
    pub fn remove_element(&mut self, view: ViewId) -> bool {
        let Some(element) = self.views.element_view(view).map(|v| v.element()) else {
            return false;
        };
        let removed = lock_program(&self.program).remove(element);
        if removed {
            self.sync_views();
        }
        removed
    }

    /// Replace the program in place, keeping the root view (and with it the
    /// publisher's binding).
    fn replace_program(&mut self, tree: ProgramTree) {
        let mut shared = lock_program(&self.program);
        *shared = tree;
        self.views.rebuild(&shared);
    }

    pub fn new_sequence(&mut self) {
        self.replace_program(ProgramTree::new());
        self.name = UNTITLED_SEQUENCE.to_string();
        self.path = None;
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let doc = SequenceDocument::load(path)?;
        self.replace_program(ProgramTree::from_document(&doc));
        self.name = doc.name;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let doc = lock_program(&self.program).to_document(&self.name);
        doc.save(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Persisted form of the current program.
    pub fn to_document(&self) -> SequenceDocument {
        lock_program(&self.program).to_document(&self.name)
    }

    // ── Playback ──

    /// Executor wired to this editor's play-head and views.
    ///
    /// Run it off the UI task and keep pumping, since playback posts a
    /// highlight for every step.
    pub fn executor(
        &self,
        device: Arc<dyn DeviceController>,
        library: Arc<dyn SequenceLibrary>,
    ) -> SequenceExecutor {
        SequenceExecutor::new(device, library, &self.settings)
            .with_ui(self.ui.clone())
            .with_publisher(Arc::clone(&self.publisher))
    }
}
