//! The live view hierarchy of one program.
//!
//! `ViewTree` mirrors a [`ProgramTree`]: one [`ContainerView`] per container
//! and one [`ElementView`] per element. Views are looked up by their own ids
//! or by the model ids they render. [`ViewTree::sync`] reconciles the views
//! with the model after structural changes; views of surviving elements keep
//! their ids, views of deleted elements are dropped.

use crate::model::{ContainerId, ElementId, ProgramTree};
use crate::types::InsertPosition;
use crate::view::container_view::ContainerView;
use crate::view::element_view::{ElementView, ExecutionMark, InsertIndicator};
use crate::view::id::{ContainerViewId, ViewId};
use std::collections::{HashMap, HashSet};

/// Views reachable from one container view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reachable {
    pub element_views: Vec<ViewId>,
    pub container_views: Vec<ContainerViewId>,
}

/// All live views of one program.
#[derive(Debug)]
pub struct ViewTree {
    root: ContainerViewId,
    element_views: HashMap<ViewId, ElementView>,
    container_views: HashMap<ContainerViewId, ContainerView>,
    by_element: HashMap<ElementId, ViewId>,
    by_container: HashMap<ContainerId, ContainerViewId>,
    /// Program generation the views were last reconciled with.
    synced_generation: Option<u64>,
}

impl ViewTree {
    /// Create views for every element and container of `tree`.
    pub fn build(tree: &ProgramTree) -> Self {
        let root_view = ContainerView::new(tree.root(), None);
        let root = root_view.id();
        let mut views = Self {
            root,
            element_views: HashMap::new(),
            container_views: HashMap::from([(root, root_view)]),
            by_element: HashMap::new(),
            by_container: HashMap::from([(tree.root(), root)]),
            synced_generation: None,
        };
        views.sync(tree);
        views
    }

    /// Reconcile views with the current model. Returns `false` when the
    /// model had not changed since the last sync.
    pub fn sync(&mut self, tree: &ProgramTree) -> bool {
        if self.synced_generation == Some(tree.generation()) {
            return false;
        }

        let mut seen_elements = HashSet::new();
        let mut seen_containers = HashSet::new();
        let root = self.sync_container(
            tree,
            tree.root(),
            None,
            &mut seen_elements,
            &mut seen_containers,
        );
        self.root = root;

        let before = self.element_views.len();
        self.element_views.retain(|id, _| seen_elements.contains(id));
        self.container_views.retain(|id, _| seen_containers.contains(id));
        let element_views = &self.element_views;
        let container_views = &self.container_views;
        self.by_element.retain(|_, v| element_views.contains_key(v));
        self.by_container.retain(|_, v| container_views.contains_key(v));

        tracing::trace!(
            "Synced views to generation {}: {} element views ({} dropped)",
            tree.generation(),
            self.element_views.len(),
            before.saturating_sub(seen_elements.len())
        );
        self.synced_generation = Some(tree.generation());
        true
    }

    /// Drop every view except the root container view and rebuild from
    /// `tree`. Used when the whole program is replaced, since element ids
    /// of the new program may collide with those of the old one.
    pub fn rebuild(&mut self, tree: &ProgramTree) {
        let root = self.root;
        self.element_views.clear();
        self.by_element.clear();
        self.container_views.retain(|id, _| *id == root);
        if let Some(view) = self.container_views.get_mut(&root) {
            view.set_element_views(Vec::new());
            view.hide_insert_locations();
        }
        self.by_container.clear();
        self.by_container.insert(tree.root(), root);
        self.synced_generation = None;
        self.sync(tree);
    }

    fn sync_container(
        &mut self,
        tree: &ProgramTree,
        container: ContainerId,
        parent_view: Option<ViewId>,
        seen_elements: &mut HashSet<ViewId>,
        seen_containers: &mut HashSet<ContainerViewId>,
    ) -> ContainerViewId {
        let cv_id = match self.by_container.get(&container) {
            Some(id) if self.container_views.contains_key(id) => *id,
            _ => {
                let view = ContainerView::new(container, parent_view);
                let id = view.id();
                self.container_views.insert(id, view);
                self.by_container.insert(container, id);
                id
            }
        };
        seen_containers.insert(cv_id);

        let mut children = Vec::new();
        for child in tree.children(container) {
            let Some(element) = tree.element(child) else {
                continue;
            };
            let view_id = match self.by_element.get(&child) {
                Some(id) if self.element_views.contains_key(id) => *id,
                _ => {
                    let view = ElementView::new(child, element.kind(), cv_id);
                    let id = view.id();
                    self.element_views.insert(id, view);
                    self.by_element.insert(child, id);
                    id
                }
            };
            seen_elements.insert(view_id);

            let nested: Vec<ContainerViewId> = element
                .child_containers()
                .into_iter()
                .map(|c| self.sync_container(tree, c, Some(view_id), seen_elements, seen_containers))
                .collect();
            if let Some(view) = self.element_views.get_mut(&view_id) {
                view.set_container_view(cv_id);
                view.set_child_views(nested);
            }
            children.push(view_id);
        }

        if let Some(view) = self.container_views.get_mut(&cv_id) {
            view.set_parent_view(parent_view);
            view.set_element_views(children);
        }
        cv_id
    }

    // ── Lookups ──

    /// View of the program's root container.
    pub fn root(&self) -> ContainerViewId {
        self.root
    }

    pub fn element_view(&self, id: ViewId) -> Option<&ElementView> {
        self.element_views.get(&id)
    }

    pub fn element_view_mut(&mut self, id: ViewId) -> Option<&mut ElementView> {
        self.element_views.get_mut(&id)
    }

    pub fn container_view(&self, id: ContainerViewId) -> Option<&ContainerView> {
        self.container_views.get(&id)
    }

    pub fn container_view_mut(&mut self, id: ContainerViewId) -> Option<&mut ContainerView> {
        self.container_views.get_mut(&id)
    }

    pub fn view_for_element(&self, element: ElementId) -> Option<ViewId> {
        self.by_element.get(&element).copied()
    }

    pub fn container_view_for(&self, container: ContainerId) -> Option<ContainerViewId> {
        self.by_container.get(&container).copied()
    }

    /// Container view holding an element view.
    pub fn owning_container_view(&self, view: ViewId) -> Option<&ContainerView> {
        self.element_views
            .get(&view)
            .and_then(|v| self.container_views.get(&v.container_view()))
    }

    pub fn element_view_count(&self) -> usize {
        self.element_views.len()
    }

    pub fn container_view_count(&self) -> usize {
        self.container_views.len()
    }

    pub fn element_views(&self) -> impl Iterator<Item = &ElementView> {
        self.element_views.values()
    }

    // ── Broadcast targets ──

    /// Every view reachable from `root`, in pre-order: each element view is
    /// followed by the views nested inside it before its next sibling.
    pub fn reachable_from(&self, root: ContainerViewId) -> Reachable {
        let mut reachable = Reachable::default();
        self.collect_reachable(root, &mut reachable);
        reachable
    }

    fn collect_reachable(&self, container_view: ContainerViewId, out: &mut Reachable) {
        let Some(cv) = self.container_views.get(&container_view) else {
            return;
        };
        out.container_views.push(container_view);
        for view_id in cv.element_views() {
            let Some(view) = self.element_views.get(view_id) else {
                continue;
            };
            out.element_views.push(*view_id);
            for child in view.child_views() {
                self.collect_reachable(*child, out);
            }
        }
    }

    /// Hide every insert indicator under `root`. Returns how many were shown.
    pub fn hide_insert_locations_from(&mut self, root: ContainerViewId) -> usize {
        let reachable = self.reachable_from(root);
        let mut cleared = 0;
        for id in &reachable.container_views {
            if let Some(cv) = self.container_views.get_mut(id) {
                cleared += usize::from(cv.has_end_indicator());
                cv.hide_insert_locations();
            }
        }
        for id in &reachable.element_views {
            if let Some(view) = self.element_views.get_mut(id) {
                cleared += usize::from(view.insert_indicator() != InsertIndicator::Hidden);
                view.hide_insert_locations();
            }
        }
        cleared
    }

    /// Clear the play-head on every view under `root`.
    pub fn reset_views_for_sequence_execution_from(&mut self, root: ContainerViewId) -> usize {
        let reachable = self.reachable_from(root);
        for id in &reachable.element_views {
            if let Some(view) = self.element_views.get_mut(id) {
                view.reset_view_for_sequence_execution();
            }
        }
        reachable.element_views.len()
    }

    pub fn show_insert_location(&mut self, view: ViewId, position: InsertPosition) -> bool {
        match self.element_views.get_mut(&view) {
            Some(v) => {
                v.show_insert_position(position);
                true
            }
            None => false,
        }
    }

    pub fn show_end_insert_location(&mut self, container_view: ContainerViewId) -> bool {
        match self.container_views.get_mut(&container_view) {
            Some(cv) => {
                cv.show_end_insert_location();
                true
            }
            None => false,
        }
    }

    /// Move the play-head to `element`, clearing it on the element's
    /// siblings.
    pub fn highlight(&mut self, element: ElementId) -> bool {
        let Some(view_id) = self.view_for_element(element) else {
            return false;
        };
        let siblings: Vec<ViewId> = self
            .owning_container_view(view_id)
            .map(|cv| cv.element_views().to_vec())
            .unwrap_or_default();
        for sibling in siblings {
            if let Some(view) = self.element_views.get_mut(&sibling) {
                view.reset_view_for_sequence_execution();
            }
        }
        self.element_views
            .get_mut(&view_id)
            .is_some_and(ElementView::set_executing)
    }

    /// Number of insert indicators currently shown anywhere.
    pub fn active_insert_indicators(&self) -> usize {
        let on_elements = self
            .element_views
            .values()
            .filter(|v| v.insert_indicator() != InsertIndicator::Hidden)
            .count();
        let on_containers = self
            .container_views
            .values()
            .filter(|cv| cv.has_end_indicator())
            .count();
        on_elements + on_containers
    }

    /// Elements currently marked as executing.
    pub fn executing_elements(&self) -> Vec<ElementId> {
        self.element_views
            .values()
            .filter(|v| v.execution_mark() == ExecutionMark::Active)
            .map(ElementView::element)
            .collect()
    }
}
