//! The program tree: arena of every element and container of one program.
//!
//! Elements and containers are stored flat, keyed by their ids. Nesting is
//! expressed by ids only: a container element's [`ElementBody`] names the
//! containers it owns, each [`ContainerModel`] names its parent element, and
//! each element names the container currently holding it.
//!
//! ```text
//! ROOT: [Arm up] [Loop x3] [Do Both]
//!                   |          |------------.
//!                 c1: [Wave]   c2: [Link]   c3: [Beep]
//! ```
//!
//! Structural operations follow list semantics: they return `false` (or
//! `None`) and leave the tree untouched when they cannot be applied.
//!
//! The whole tree sits behind one mutex ([`SharedProgram`]) so that a move
//! between two containers is applied as a single unit.
//!
//! Every tree also carries an epoch drawn from a process-wide counter. Ids
//! restart at zero in each new tree, so anything that holds ids across a
//! program swap (a queued import, a drag payload) carries the epoch too and
//! is refused by a tree with a different one.

use crate::model::container::ContainerModel;
use crate::model::element::{ElementBody, ProgramElement};
use crate::model::id::{ContainerId, ElementId};
use crate::persistence::{ElementDocument, ElementHeader, SequenceDocument};
use crate::types::InsertPosition;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static NEXT_PROGRAM_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Program tree shared between the UI task and the import workers.
pub type SharedProgram = Arc<Mutex<ProgramTree>>;

/// Lock a shared program, recovering the guard if a holder panicked.
pub fn lock_program(program: &SharedProgram) -> MutexGuard<'_, ProgramTree> {
    program.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Program lock was poisoned; continuing with last state");
        poisoned.into_inner()
    })
}

/// Every element and container of one program.
#[derive(Debug, Clone)]
pub struct ProgramTree {
    elements: HashMap<ElementId, ProgramElement>,
    containers: HashMap<ContainerId, ContainerModel>,
    next_element_id: u32,
    next_container_id: u32,
    epoch: u64,
    /// Incremented on every structural change.
    generation: u64,
}

impl Default for ProgramTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramTree {
    /// Create an empty program containing only the root container.
    pub fn new() -> Self {
        let mut containers = HashMap::new();
        containers.insert(ContainerId::ROOT, ContainerModel::new(ContainerId::ROOT, None));
        Self {
            elements: HashMap::new(),
            containers,
            next_element_id: 0,
            next_container_id: ContainerId::ROOT.0 + 1,
            epoch: NEXT_PROGRAM_EPOCH.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    /// Wrap the tree for sharing with worker threads.
    pub fn into_shared(self) -> SharedProgram {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> ContainerId {
        ContainerId::ROOT
    }

    /// Identity of this program instance. Ids from a tree with another
    /// epoch must not be used here.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of live elements, attached or detached.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn element(&self, id: ElementId) -> Option<&ProgramElement> {
        self.elements.get(&id)
    }

    /// Mutable access for name and comment edits.
    #[inline]
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ProgramElement> {
        self.elements.get_mut(&id)
    }

    #[inline]
    pub fn container(&self, id: ContainerId) -> Option<&ContainerModel> {
        self.containers.get(&id)
    }

    /// Children of `container` in program order (empty if it does not exist).
    pub fn children(&self, container: ContainerId) -> Vec<ElementId> {
        self.containers
            .get(&container)
            .map(ContainerModel::elements)
            .unwrap_or_default()
    }

    pub fn is_empty(&self, container: ContainerId) -> bool {
        self.containers
            .get(&container)
            .map_or(true, ContainerModel::is_empty)
    }

    pub fn contains(&self, container: ContainerId, element: ElementId) -> bool {
        self.containers
            .get(&container)
            .is_some_and(|c| c.contains(element))
    }

    /// Whether `container` lies anywhere inside the sub-tree of `ancestor`.
    pub fn is_container_within(&self, container: ContainerId, ancestor: ElementId) -> bool {
        let mut current = container;
        loop {
            let Some(parent) = self.containers.get(&current).and_then(|c| c.parent()) else {
                return false;
            };
            if parent == ancestor {
                return true;
            }
            match self.elements.get(&parent).and_then(|e| e.owner()) {
                Some(owner) => current = owner,
                None => return false,
            }
        }
    }

    /// Whether `element` is `ancestor` itself or nested anywhere inside it.
    pub fn is_descendant_or_self(&self, element: ElementId, ancestor: ElementId) -> bool {
        if element == ancestor {
            return true;
        }
        self.elements
            .get(&element)
            .and_then(|e| e.owner())
            .is_some_and(|owner| self.is_container_within(owner, ancestor))
    }

    // ── Creation ──

    /// Create a detached element (with its whole sub-tree) from a document.
    ///
    /// The new element gets fresh ids throughout and shares nothing with
    /// any existing element.
    pub fn instantiate(&mut self, doc: &ElementDocument) -> ElementId {
        let id = ElementId(self.next_element_id);
        self.next_element_id += 1;

        let body = match doc {
            ElementDocument::Expression {
                snapshot, delay_ms, ..
            } => ElementBody::Expression {
                snapshot: snapshot.clone(),
                delay_ms: *delay_ms,
            },
            ElementDocument::CounterLoop {
                iterations,
                children,
                ..
            } => {
                let body = self.alloc_container(id);
                self.fill(body, children);
                ElementBody::CounterLoop {
                    iterations: *iterations,
                    body,
                }
            }
            ElementDocument::LoopableConditional {
                condition,
                children,
                ..
            } => {
                let body = self.alloc_container(id);
                self.fill(body, children);
                ElementBody::LoopableConditional {
                    condition: condition.clone(),
                    body,
                }
            }
            ElementDocument::Fork { left, right, .. } => {
                let left_id = self.alloc_container(id);
                self.fill(left_id, left);
                let right_id = self.alloc_container(id);
                self.fill(right_id, right);
                ElementBody::Fork {
                    left: left_id,
                    right: right_id,
                }
            }
            ElementDocument::Link { target, .. } => ElementBody::Link {
                target: target.clone(),
            },
            ElementDocument::SavedSequence { file_name, .. } => ElementBody::SavedSequence {
                file_name: file_name.clone(),
            },
        };

        let header = doc.header();
        let mut element = ProgramElement::new(id, header.name.clone(), body);
        element.set_comment(Some(&header.comment));
        element.set_comment_visible(header.comment_visible);
        self.elements.insert(id, element);
        id
    }

    fn alloc_container(&mut self, parent: ElementId) -> ContainerId {
        let id = ContainerId(self.next_container_id);
        self.next_container_id += 1;
        self.containers.insert(id, ContainerModel::new(id, Some(parent)));
        id
    }

    fn fill(&mut self, container: ContainerId, docs: &[ElementDocument]) {
        for doc in docs {
            let child = self.instantiate(doc);
            self.append(container, child);
        }
    }

    // ── Structural operations ──

    /// A detached, existing element may be attached to an existing container
    /// that is not part of the element's own sub-tree.
    fn can_attach(&self, container: ContainerId, element: ElementId) -> bool {
        let Some(e) = self.elements.get(&element) else {
            return false;
        };
        e.owner().is_none()
            && self.containers.contains_key(&container)
            && !self.is_container_within(container, element)
    }

    fn attached(&mut self, container: ContainerId, element: ElementId) {
        if let Some(e) = self.elements.get_mut(&element) {
            e.set_owner(Some(container));
        }
        self.generation += 1;
    }

    /// Insert a detached element before `reference` in `container`.
    pub fn insert_before(
        &mut self,
        container: ContainerId,
        element: ElementId,
        reference: ElementId,
    ) -> bool {
        if !self.can_attach(container, element) {
            return false;
        }
        let inserted = self
            .containers
            .get_mut(&container)
            .is_some_and(|c| c.insert_before(element, reference));
        if inserted {
            self.attached(container, element);
        }
        inserted
    }

    /// Insert a detached element after `reference` in `container`.
    pub fn insert_after(
        &mut self,
        container: ContainerId,
        element: ElementId,
        reference: ElementId,
    ) -> bool {
        if !self.can_attach(container, element) {
            return false;
        }
        let inserted = self
            .containers
            .get_mut(&container)
            .is_some_and(|c| c.insert_after(element, reference));
        if inserted {
            self.attached(container, element);
        }
        inserted
    }

    /// Append a detached element to the end of `container`.
    pub fn append(&mut self, container: ContainerId, element: ElementId) -> bool {
        if !self.can_attach(container, element) {
            return false;
        }
        let inserted = self
            .containers
            .get_mut(&container)
            .is_some_and(|c| c.append(element));
        if inserted {
            self.attached(container, element);
        }
        inserted
    }

    /// Insert a detached element at position `index` of `container`.
    pub fn insert_at_index(&mut self, container: ContainerId, element: ElementId, index: usize) -> bool {
        if !self.can_attach(container, element) {
            return false;
        }
        let inserted = self
            .containers
            .get_mut(&container)
            .is_some_and(|c| c.insert_at_index(element, index));
        if inserted {
            self.attached(container, element);
        }
        inserted
    }

    /// Insert relative to `reference`, or at an end of `container` when
    /// there is no reference (`Before` → front, `After` → back).
    pub fn insert(
        &mut self,
        container: ContainerId,
        element: ElementId,
        reference: Option<ElementId>,
        position: InsertPosition,
    ) -> bool {
        match (reference, position) {
            (Some(r), InsertPosition::Before) => self.insert_before(container, element, r),
            (Some(r), InsertPosition::After) => self.insert_after(container, element, r),
            (None, InsertPosition::Before) => self.insert_at_index(container, element, 0),
            (None, InsertPosition::After) => self.append(container, element),
        }
    }

    /// Take an element out of its container without deleting it.
    pub fn detach(&mut self, element: ElementId) -> bool {
        let Some(owner) = self.elements.get(&element).and_then(|e| e.owner()) else {
            return false;
        };
        let removed = self
            .containers
            .get_mut(&owner)
            .is_some_and(|c| c.remove(element));
        if let Some(e) = self.elements.get_mut(&element) {
            e.set_owner(None);
        }
        if removed {
            self.generation += 1;
        }
        removed
    }

    /// Delete an element and, for container elements, its whole sub-tree.
    pub fn remove(&mut self, element: ElementId) -> bool {
        if !self.elements.contains_key(&element) {
            return false;
        }
        self.detach(element);
        let purged = self.purge(element);
        self.generation += 1;
        tracing::debug!("Removed {:?} ({} elements deleted)", element, purged);
        true
    }

    /// Delete every element of `container`. Returns how many elements
    /// (at any depth) were deleted.
    pub fn remove_all(&mut self, container: ContainerId) -> usize {
        let Some(children) = self.containers.get_mut(&container).map(ContainerModel::take_all)
        else {
            return 0;
        };
        let purged = children.into_iter().map(|child| self.purge(child)).sum();
        self.generation += 1;
        purged
    }

    /// Delete an element's sub-tree from the arena. Returns the number of
    /// elements deleted.
    fn purge(&mut self, element: ElementId) -> usize {
        let Some(removed) = self.elements.remove(&element) else {
            return 0;
        };
        let mut count = 1;
        for container in removed.child_containers() {
            if let Some(mut model) = self.containers.remove(&container) {
                for child in model.take_all() {
                    count += self.purge(child);
                }
            }
        }
        count
    }

    /// Validate that `element` could be placed into `container` relative to
    /// `reference` once it is taken out of its current position.
    fn can_relocate(
        &self,
        element: ElementId,
        container: ContainerId,
        reference: Option<ElementId>,
    ) -> bool {
        let Some(e) = self.elements.get(&element) else {
            return false;
        };
        if e.owner().is_none() || !self.containers.contains_key(&container) {
            return false;
        }
        if let Some(r) = reference {
            if r == element || !self.contains(container, r) {
                return false;
            }
        }
        !self.is_container_within(container, element)
    }

    /// Move an attached element to a new position as one operation.
    ///
    /// Nothing changes unless the destination is valid: the reference must
    /// be in `container` and differ from `element`, and `container` must not
    /// be inside the moved element.
    pub fn move_element(
        &mut self,
        element: ElementId,
        container: ContainerId,
        reference: Option<ElementId>,
        position: InsertPosition,
    ) -> bool {
        if !self.can_relocate(element, container, reference) {
            return false;
        }
        let Some(origin) = self.elements.get(&element).and_then(|e| e.owner()) else {
            return false;
        };
        let origin_index = self
            .containers
            .get(&origin)
            .and_then(|c| c.position(element))
            .unwrap_or(0);

        self.detach(element);
        if self.insert(container, element, reference, position) {
            return true;
        }

        // Validation makes this unreachable; restore the original spot anyway.
        tracing::warn!("Move of {:?} failed after validation; restoring", element);
        self.insert_at_index(origin, element, origin_index);
        false
    }

    /// Insert a fresh instance of `doc`, optionally replacing `source`.
    ///
    /// With a `source`, this is the drop half of a move: the original element
    /// is deleted and the copy inserted under the same borrow, so no caller
    /// can observe one step without the other. Returns the new element id, or
    /// `None` (with no changes) when the destination is invalid.
    pub fn import(
        &mut self,
        doc: &ElementDocument,
        container: ContainerId,
        reference: Option<ElementId>,
        position: InsertPosition,
        source: Option<ElementId>,
    ) -> Option<ElementId> {
        if !self.containers.contains_key(&container) {
            return None;
        }
        if let Some(r) = reference {
            if !self.contains(container, r) {
                return None;
            }
        }
        if let Some(src) = source {
            if !self.can_relocate(src, container, reference) {
                return None;
            }
        }

        if let Some(src) = source {
            self.remove(src);
        }
        let id = self.instantiate(doc);
        if self.insert(container, id, reference, position) {
            Some(id)
        } else {
            self.purge(id);
            None
        }
    }

    /// Change the repeat count of a counter loop.
    pub fn set_loop_iterations(&mut self, element: ElementId, iterations: u32) -> bool {
        match self.elements.get_mut(&element).map(ProgramElement::body_mut) {
            Some(ElementBody::CounterLoop { iterations: n, .. }) => {
                *n = iterations;
                true
            }
            _ => false,
        }
    }

    // ── Copying and persistence ──

    /// Deep copy of an element and everything inside it.
    pub fn deep_copy(&self, element: ElementId) -> Option<ElementDocument> {
        let e = self.elements.get(&element)?;
        let header = ElementHeader {
            name: e.name().to_string(),
            comment: e.comment().to_string(),
            comment_visible: e.is_comment_visible(),
        };
        Some(match e.body() {
            ElementBody::Expression { snapshot, delay_ms } => ElementDocument::Expression {
                header,
                snapshot: snapshot.clone(),
                delay_ms: *delay_ms,
            },
            ElementBody::CounterLoop { iterations, body } => ElementDocument::CounterLoop {
                header,
                iterations: *iterations,
                children: self.to_persistable_form(*body),
            },
            ElementBody::LoopableConditional { condition, body } => {
                ElementDocument::LoopableConditional {
                    header,
                    condition: condition.clone(),
                    children: self.to_persistable_form(*body),
                }
            }
            ElementBody::Fork { left, right } => ElementDocument::Fork {
                header,
                left: self.to_persistable_form(*left),
                right: self.to_persistable_form(*right),
            },
            ElementBody::Link { target } => ElementDocument::Link {
                header,
                target: target.clone(),
            },
            ElementBody::SavedSequence { file_name } => ElementDocument::SavedSequence {
                header,
                file_name: file_name.clone(),
            },
        })
    }

    /// Documents for the children of `container`, in order.
    pub fn to_persistable_form(&self, container: ContainerId) -> Vec<ElementDocument> {
        self.children(container)
            .into_iter()
            .filter_map(|child| self.deep_copy(child))
            .collect()
    }

    /// Persisted form of the whole program.
    pub fn to_document(&self, name: impl Into<String>) -> SequenceDocument {
        SequenceDocument::new(name, self.to_persistable_form(ContainerId::ROOT))
    }

    /// Rebuild a program from its persisted form.
    pub fn from_document(doc: &SequenceDocument) -> Self {
        let mut tree = Self::new();
        tree.fill(ContainerId::ROOT, &doc.elements);
        tree
    }

    /// Indented, human-readable listing of the program.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.outline_container(ContainerId::ROOT, 0, &mut out);
        out
    }

    fn outline_container(&self, container: ContainerId, depth: usize, out: &mut String) {
        for child in self.children(container) {
            let Some(e) = self.elements.get(&child) else {
                continue;
            };
            let _ = write!(out, "{:indent$}{} \"{}\"", "", e.kind(), e.name(), indent = depth * 2);
            match e.body() {
                ElementBody::CounterLoop { iterations, .. } => {
                    let _ = write!(out, " x{}", iterations);
                }
                ElementBody::LoopableConditional { condition, .. } => {
                    let _ = write!(out, " while {}", condition);
                }
                ElementBody::Link { target } => {
                    let _ = write!(out, " -> {}", target);
                }
                ElementBody::SavedSequence { file_name } => {
                    let _ = write!(out, " ({})", file_name);
                }
                _ => {}
            }
            if e.has_comment() && e.is_comment_visible() {
                let _ = write!(out, "  # {}", e.comment());
            }
            out.push('\n');
            for nested in e.child_containers() {
                self.outline_container(nested, depth + 1, out);
            }
        }
    }
}
