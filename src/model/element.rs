//! Program elements.
//!
//! A [`ProgramElement`] is one node of a user program. Its kind-specific data
//! lives in [`ElementBody`]; container kinds refer to the child containers
//! they own by [`ContainerId`].

use crate::model::id::{ContainerId, ElementId};
use crate::types::{Condition, DeviceServiceSnapshot, ElementKind};

/// Kind-specific data of a program element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementBody {
    Expression {
        snapshot: DeviceServiceSnapshot,
        /// How long the expression is held before the next step (ms).
        delay_ms: u64,
    },
    CounterLoop {
        iterations: u32,
        body: ContainerId,
    },
    LoopableConditional {
        condition: Condition,
        body: ContainerId,
    },
    Fork {
        left: ContainerId,
        right: ContainerId,
    },
    Link {
        target: String,
    },
    SavedSequence {
        file_name: String,
    },
}

impl ElementBody {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementBody::Expression { .. } => ElementKind::Expression,
            ElementBody::CounterLoop { .. } => ElementKind::CounterLoop,
            ElementBody::LoopableConditional { .. } => ElementKind::LoopableConditional,
            ElementBody::Fork { .. } => ElementKind::Fork,
            ElementBody::Link { .. } => ElementKind::Link,
            ElementBody::SavedSequence { .. } => ElementKind::SavedSequence,
        }
    }

    /// Containers owned by this element, in display order.
    pub fn child_containers(&self) -> Vec<ContainerId> {
        match self {
            ElementBody::CounterLoop { body, .. } | ElementBody::LoopableConditional { body, .. } => {
                vec![*body]
            }
            ElementBody::Fork { left, right } => vec![*left, *right],
            _ => Vec::new(),
        }
    }
}

/// One element of a program.
#[derive(Debug, Clone)]
pub struct ProgramElement {
    id: ElementId,
    name: String,
    /// Empty when the element has no comment.
    comment: String,
    comment_visible: bool,
    body: ElementBody,
    /// Container currently holding this element (`None` while detached).
    owner: Option<ContainerId>,
}

impl ProgramElement {
    pub(crate) fn new(id: ElementId, name: String, body: ElementBody) -> Self {
        Self {
            id,
            name,
            comment: String::new(),
            comment_visible: false,
            body,
            owner: None,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }

    /// Set or clear the comment. `None` stores the empty string.
    pub fn set_comment(&mut self, comment: Option<&str>) {
        self.comment = comment.unwrap_or_default().to_string();
    }

    pub fn is_comment_visible(&self) -> bool {
        self.comment_visible
    }

    pub fn set_comment_visible(&mut self, visible: bool) {
        self.comment_visible = visible;
    }

    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    pub fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    pub fn child_containers(&self) -> Vec<ContainerId> {
        self.body.child_containers()
    }

    pub fn owner(&self) -> Option<ContainerId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ContainerId>) {
        self.owner = owner;
    }

    pub(crate) fn body_mut(&mut self) -> &mut ElementBody {
        &mut self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_defaults_to_empty() {
        let mut element = ProgramElement::new(
            ElementId(1),
            "Go".to_string(),
            ElementBody::Link {
                target: "dance".to_string(),
            },
        );
        assert_eq!(element.comment(), "");
        assert!(!element.has_comment());

        element.set_comment(Some("jump to dance"));
        assert!(element.has_comment());
        element.set_comment(None);
        assert_eq!(element.comment(), "");
    }

    #[test]
    fn test_child_containers() {
        let fork = ElementBody::Fork {
            left: ContainerId(3),
            right: ContainerId(4),
        };
        assert_eq!(fork.child_containers(), vec![ContainerId(3), ContainerId(4)]);
        assert_eq!(fork.kind(), ElementKind::Fork);

        let leaf = ElementBody::SavedSequence {
            file_name: "wave".to_string(),
        };
        assert!(leaf.child_containers().is_empty());
    }
}
