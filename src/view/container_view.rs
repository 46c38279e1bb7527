//! Container views: the visual counterpart of a container model.

use crate::model::ContainerId;
use crate::transfer::DataFlavor;
use crate::types::ElementKind;
use crate::view::geometry::Rect;
use crate::view::id::{ContainerViewId, ViewId};
use std::collections::HashSet;

/// Visual list of the elements of one container.
#[derive(Debug, Clone)]
pub struct ContainerView {
    id: ContainerViewId,
    container: ContainerId,
    /// Element view owning this container (`None` for the root).
    parent_view: Option<ViewId>,
    accepted_kinds: HashSet<ElementKind>,
    flavors: Vec<DataFlavor>,
    /// Indicator drawn in the append area after the last element.
    end_indicator: bool,
    element_views: Vec<ViewId>,
    bounds: Rect,
}

impl ContainerView {
    pub fn new(container: ContainerId, parent_view: Option<ViewId>) -> Self {
        Self {
            id: ContainerViewId::next(),
            container,
            parent_view,
            accepted_kinds: ElementKind::all().iter().copied().collect(),
            flavors: vec![DataFlavor::ProgramElement],
            end_indicator: false,
            element_views: Vec::new(),
            bounds: Rect::default(),
        }
    }

    pub fn id(&self) -> ContainerViewId {
        self.id
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// Element view this container belongs to, for chaining drops outward.
    pub fn parent_view(&self) -> Option<ViewId> {
        self.parent_view
    }

    pub(crate) fn set_parent_view(&mut self, parent_view: Option<ViewId>) {
        self.parent_view = parent_view;
    }

    pub fn accepts(&self, kind: ElementKind) -> bool {
        self.accepted_kinds.contains(&kind)
    }

    /// Restrict which element kinds may be dropped here.
    pub fn set_accepted_kinds(&mut self, kinds: impl IntoIterator<Item = ElementKind>) {
        self.accepted_kinds = kinds.into_iter().collect();
    }

    pub fn supported_flavors(&self) -> &[DataFlavor] {
        &self.flavors
    }

    pub fn supports_flavor(&self, flavor: DataFlavor) -> bool {
        self.flavors.contains(&flavor)
    }

    /// Element views in program order.
    pub fn element_views(&self) -> &[ViewId] {
        &self.element_views
    }

    pub(crate) fn set_element_views(&mut self, views: Vec<ViewId>) {
        self.element_views = views;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn has_end_indicator(&self) -> bool {
        self.end_indicator
    }

    pub fn show_end_insert_location(&mut self) {
        self.end_indicator = true;
    }

    pub fn hide_insert_locations(&mut self) {
        self.end_indicator = false;
    }
}
