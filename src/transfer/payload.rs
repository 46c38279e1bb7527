//! Drag payloads and drop descriptions.

use crate::model::ElementId;
use crate::persistence::ElementDocument;
use crate::types::{ElementKind, InsertPosition};
use crate::view::element_view::ElementView;
use crate::view::geometry::Point;
use crate::view::id::{ContainerViewId, ViewId};
use serde::{Deserialize, Serialize};

/// Data flavors a transfer can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFlavor {
    /// A program element (the only flavor the sequence builder imports)
    ProgramElement,
    /// Plain text, e.g. from the system clipboard
    PlainText,
}

/// How a transfer was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Drag-and-drop gesture
    Drop,
    /// Clipboard paste
    Paste,
}

/// What happens to the source when a drop completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropAction {
    /// Source stays; the destination gets a new element (palette drags)
    Copy,
    /// Source is removed and the destination gets the element
    #[default]
    Move,
}

/// The element a drag started on, within the program it was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSource {
    /// [`crate::model::ProgramTree::epoch`] of the source program
    pub epoch: u64,
    pub element: ElementId,
}

/// A dragged program element
///
/// `document` is a deep copy taken when the drag started; `source` names
/// the original when the drag came from the sequence itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTransfer {
    pub document: ElementDocument,
    pub source: Option<DragSource>,
}

impl ElementTransfer {
    /// Payload for a new element dragged in from a palette or file list
    pub fn from_palette(document: ElementDocument) -> Self {
        Self {
            document,
            source: None,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.document.kind()
    }
}

/// Payload of a transfer
#[derive(Debug, Clone, PartialEq)]
pub enum Transferable {
    ProgramElement(ElementTransfer),
    PlainText(String),
}

impl Transferable {
    pub fn flavor(&self) -> DataFlavor {
        match self {
            Transferable::ProgramElement(_) => DataFlavor::ProgramElement,
            Transferable::PlainText(_) => DataFlavor::PlainText,
        }
    }

    /// Extract the element payload, if this transfer carries one
    pub fn element_transfer(&self) -> Option<&ElementTransfer> {
        match self {
            Transferable::ProgramElement(t) => Some(t),
            Transferable::PlainText(_) => None,
        }
    }
}

/// How a drop target picks before/after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPolicy {
    /// Upper half → before, lower half → after
    #[default]
    Geometric,
    /// Always after (append areas)
    AlwaysAfter,
}

impl InsertPolicy {
    /// Position a drop at `point` over `view` resolves to
    pub fn position_for(self, view: &ElementView, point: Option<Point>) -> InsertPosition {
        match self {
            InsertPolicy::Geometric => view.insert_position_for(point),
            InsertPolicy::AlwaysAfter => InsertPosition::After,
        }
    }
}

/// Component under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropTarget {
    /// An element view
    Element(ViewId),
    /// The empty area after the last element of a container
    ContainerEnd(ContainerViewId),
}

impl DropTarget {
    /// Policy for this target; element targets follow `element_policy`
    pub fn policy(&self, element_policy: InsertPolicy) -> InsertPolicy {
        match self {
            DropTarget::Element(_) => element_policy,
            DropTarget::ContainerEnd(_) => InsertPolicy::AlwaysAfter,
        }
    }
}

/// Everything the handler knows about one hover or drop event
#[derive(Debug, Clone)]
pub struct TransferSupport {
    pub kind: TransferKind,
    pub transferable: Transferable,
    pub target: DropTarget,
    /// Pointer location in the target's local coordinates
    pub point: Option<Point>,
    pub action: DropAction,
}

impl TransferSupport {
    /// A drag-and-drop event over `target`
    pub fn drop(transferable: Transferable, target: DropTarget, point: Option<Point>) -> Self {
        Self {
            kind: TransferKind::Drop,
            transferable,
            target,
            point,
            action: DropAction::Move,
        }
    }

    /// A clipboard paste onto `target`
    pub fn paste(transferable: Transferable, target: DropTarget) -> Self {
        Self {
            kind: TransferKind::Paste,
            transferable,
            target,
            point: None,
            action: DropAction::Copy,
        }
    }

    pub fn with_action(mut self, action: DropAction) -> Self {
        self.action = action;
        self
    }

    pub fn is_drop(&self) -> bool {
        self.kind == TransferKind::Drop
    }

    pub fn flavor(&self) -> DataFlavor {
        self.transferable.flavor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceServiceSnapshot;

    #[test]
    fn test_flavors() {
        let text = Transferable::PlainText("hello".to_string());
        assert_eq!(text.flavor(), DataFlavor::PlainText);
        assert!(text.element_transfer().is_none());

        let element = Transferable::ProgramElement(ElementTransfer::from_palette(
            ElementDocument::expression("a", DeviceServiceSnapshot::new()),
        ));
        assert_eq!(element.flavor(), DataFlavor::ProgramElement);
        assert_eq!(element.element_transfer().unwrap().kind(), ElementKind::Expression);
    }

    #[test]
    fn test_target_policy() {
        let element = DropTarget::Element(ViewId(1));
        let end = DropTarget::ContainerEnd(ContainerViewId(1));
        assert_eq!(element.policy(InsertPolicy::Geometric), InsertPolicy::Geometric);
        assert_eq!(element.policy(InsertPolicy::AlwaysAfter), InsertPolicy::AlwaysAfter);
        assert_eq!(end.policy(InsertPolicy::Geometric), InsertPolicy::AlwaysAfter);
    }

    #[test]
    fn test_paste_is_not_a_drop() {
        let support = TransferSupport::paste(
            Transferable::PlainText(String::new()),
            DropTarget::ContainerEnd(ContainerViewId(1)),
        );
        assert!(!support.is_drop());
    }
}
