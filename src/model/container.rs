//! Container model: an ordered, duplicate-free list of element ids.
//!
//! The container only manages list membership. Ownership back-references and
//! cascading removal of nested containers are handled by
//! [`super::ProgramTree`], which owns both the containers and the elements.

use crate::collections::UniqueNodeLinkedList;
use crate::model::id::{ContainerId, ElementId};

/// Ordered children of the root sequence, a loop body or a fork branch.
#[derive(Debug, Clone)]
pub struct ContainerModel {
    id: ContainerId,
    /// Element owning this container (`None` for the root).
    parent: Option<ElementId>,
    elements: UniqueNodeLinkedList<ElementId>,
}

impl ContainerModel {
    pub(crate) fn new(id: ContainerId, parent: Option<ElementId>) -> Self {
        Self {
            id,
            parent,
            elements: UniqueNodeLinkedList::new(),
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.elements.contains(&element)
    }

    pub fn first(&self) -> Option<ElementId> {
        self.elements.head().copied()
    }

    pub fn last(&self) -> Option<ElementId> {
        self.elements.tail().copied()
    }

    pub fn previous(&self, element: ElementId) -> Option<ElementId> {
        self.elements.previous(&element).copied()
    }

    pub fn next(&self, element: ElementId) -> Option<ElementId> {
        self.elements.next(&element).copied()
    }

    pub fn position(&self, element: ElementId) -> Option<usize> {
        self.elements.position(&element)
    }

    /// Children in program order.
    pub fn elements(&self) -> Vec<ElementId> {
        self.elements.as_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().copied()
    }

    pub(crate) fn insert_before(&mut self, element: ElementId, reference: ElementId) -> bool {
        self.elements.insert_before(element, &reference)
    }

    pub(crate) fn insert_after(&mut self, element: ElementId, reference: ElementId) -> bool {
        self.elements.insert_after(element, &reference)
    }

    pub(crate) fn append(&mut self, element: ElementId) -> bool {
        self.elements.add(element)
    }

    pub(crate) fn insert_at_index(&mut self, element: ElementId, index: usize) -> bool {
        self.elements.insert_at_index(element, index)
    }

    pub(crate) fn remove(&mut self, element: ElementId) -> bool {
        self.elements.remove(&element)
    }

    /// Empty the container, returning the detached children in order.
    pub(crate) fn take_all(&mut self) -> Vec<ElementId> {
        let children = self.elements.as_vec();
        self.elements.clear();
        children
    }
}
