//! Element views: one per live program element.
//!
//! A view renders one element and takes part in the drop protocol. Its
//! identity is its [`ViewId`], never the element's content, so two
//! identical expressions remain distinct drop targets.

use crate::model::{ElementId, ProgramTree};
use crate::types::{ElementKind, InsertPosition};
use crate::view::geometry::{Point, Rect};
use crate::view::id::{ContainerViewId, ViewId};
use std::hash::{Hash, Hasher};

/// Insert indicator currently drawn on a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertIndicator {
    #[default]
    Hidden,
    Before,
    After,
}

/// Execution-time state of a view (play-head highlight)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMark {
    #[default]
    Idle,
    Active,
}

/// Toolkit-opaque handle of the widget painting a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle(pub u64);

/// Whether views of `kind` show a play-head during execution.
///
/// Forks have no state of their own; their branches highlight instead.
pub fn has_execution_state(kind: ElementKind) -> bool {
    !matches!(kind, ElementKind::Fork)
}

/// Visual adapter for one program element.
#[derive(Debug, Clone)]
pub struct ElementView {
    id: ViewId,
    element: ElementId,
    kind: ElementKind,
    container_view: ContainerViewId,
    /// Container views nested inside this one (loop body, fork branches).
    child_views: Vec<ContainerViewId>,
    bounds: Rect,
    indicator: InsertIndicator,
    execution: ExecutionMark,
    component: ComponentHandle,
}

impl ElementView {
    pub fn new(element: ElementId, kind: ElementKind, container_view: ContainerViewId) -> Self {
        let id = ViewId::next();
        Self {
            id,
            element,
            kind,
            container_view,
            child_views: Vec::new(),
            bounds: Rect::default(),
            indicator: InsertIndicator::Hidden,
            execution: ExecutionMark::Idle,
            component: ComponentHandle(id.0),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn container_view(&self) -> ContainerViewId {
        self.container_view
    }

    pub(crate) fn set_container_view(&mut self, container_view: ContainerViewId) {
        self.container_view = container_view;
    }

    pub fn child_views(&self) -> &[ContainerViewId] {
        &self.child_views
    }

    pub(crate) fn set_child_views(&mut self, child_views: Vec<ContainerViewId>) {
        self.child_views = child_views;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn component(&self) -> ComponentHandle {
        self.component
    }

    /// Let the host toolkit bind its own widget handle.
    pub fn set_component(&mut self, component: ComponentHandle) {
        self.component = component;
    }

    pub fn icon_name(&self) -> &'static str {
        self.kind.icon_name()
    }

    pub fn name<'a>(&self, tree: &'a ProgramTree) -> Option<&'a str> {
        tree.element(self.element).map(|e| e.name())
    }

    /// The element's comment; empty when it has none.
    pub fn comment<'a>(&self, tree: &'a ProgramTree) -> Option<&'a str> {
        tree.element(self.element).map(|e| e.comment())
    }

    pub fn is_comment_visible(&self, tree: &ProgramTree) -> bool {
        tree.element(self.element)
            .is_some_and(|e| e.has_comment() && e.is_comment_visible())
    }

    // ── Insert indicators ──

    pub fn insert_indicator(&self) -> InsertIndicator {
        self.indicator
    }

    pub fn show_insert_location_before(&mut self) {
        self.indicator = InsertIndicator::Before;
    }

    pub fn show_insert_location_after(&mut self) {
        self.indicator = InsertIndicator::After;
    }

    pub fn show_insert_position(&mut self, position: InsertPosition) {
        match position {
            InsertPosition::Before => self.show_insert_location_before(),
            InsertPosition::After => self.show_insert_location_after(),
        }
    }

    /// Show the indicator on the side of the view nearest to `point`.
    pub fn show_insert_location(&mut self, point: Option<Point>) {
        let position = self.insert_position_for(point);
        self.show_insert_position(position);
    }

    pub fn hide_insert_locations(&mut self) {
        self.indicator = InsertIndicator::Hidden;
    }

    /// Upper half of the view means "before"; a missing point never does.
    pub fn is_insert_location_before(&self, point: Option<Point>) -> bool {
        point.is_some_and(|p| self.bounds.is_upper_half(p))
    }

    pub fn insert_position_for(&self, point: Option<Point>) -> InsertPosition {
        if self.is_insert_location_before(point) {
            InsertPosition::Before
        } else {
            InsertPosition::After
        }
    }

    // ── Execution state ──

    pub fn execution_mark(&self) -> ExecutionMark {
        self.execution
    }

    /// Mark this view as the play-head. Returns `false` for kinds without
    /// execution state.
    pub fn set_executing(&mut self) -> bool {
        if has_execution_state(self.kind) {
            self.execution = ExecutionMark::Active;
            true
        } else {
            false
        }
    }

    pub fn reset_view_for_sequence_execution(&mut self) {
        if has_execution_state(self.kind) {
            self.execution = ExecutionMark::Idle;
        }
    }
}

impl PartialEq for ElementView {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ElementView {}

impl Hash for ElementView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
