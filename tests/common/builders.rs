//! Test data builders for creating programs

use sequence_builder::model::ProgramTree;
use sequence_builder::persistence::{ElementDocument, SequenceDocument};
use sequence_builder::types::{Condition, DeviceServiceSnapshot};

/// Builder for creating test expressions
pub struct ExpressionBuilder {
    name: String,
    snapshot: DeviceServiceSnapshot,
    delay_ms: u64,
    comment: Option<(String, bool)>,
}

impl ExpressionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            snapshot: DeviceServiceSnapshot::new(),
            delay_ms: 0,
            comment: None,
        }
    }

    pub fn led(mut self, port: u32, intensity: u32) -> Self {
        self.snapshot = self.snapshot.with_operation(
            format!("led{port}"),
            "set",
            [("intensity", intensity.to_string())],
        );
        self
    }

    pub fn motor(mut self, port: u32, velocity: i32) -> Self {
        self.snapshot = self.snapshot.with_operation(
            format!("motor{port}"),
            "set",
            [("velocity", velocity.to_string())],
        );
        self
    }

    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn comment(mut self, comment: &str, visible: bool) -> Self {
        self.comment = Some((comment.to_string(), visible));
        self
    }

    pub fn build(self) -> ElementDocument {
        let mut doc = ElementDocument::expression(self.name, self.snapshot);
        if let ElementDocument::Expression { delay_ms, .. } = &mut doc {
            *delay_ms = self.delay_ms;
        }
        match self.comment {
            Some((comment, visible)) => doc.with_comment(comment, visible),
            None => doc,
        }
    }
}

/// Builder for whole programs, with closures describing nested bodies
#[derive(Default)]
pub struct ProgramBuilder {
    name: String,
    elements: Vec<ElementDocument>,
}

impl ProgramBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            elements: Vec::new(),
        }
    }

    fn nested(body: impl FnOnce(ProgramBuilder) -> ProgramBuilder) -> Vec<ElementDocument> {
        body(ProgramBuilder::default()).elements
    }

    pub fn element(mut self, doc: ElementDocument) -> Self {
        self.elements.push(doc);
        self
    }

    pub fn expression(self, name: &str) -> Self {
        self.element(ExpressionBuilder::new(name).build())
    }

    pub fn counter_loop(
        self,
        name: &str,
        iterations: u32,
        body: impl FnOnce(ProgramBuilder) -> ProgramBuilder,
    ) -> Self {
        let children = Self::nested(body);
        self.element(ElementDocument::counter_loop(name, iterations, children))
    }

    pub fn conditional(
        self,
        name: &str,
        condition: Condition,
        body: impl FnOnce(ProgramBuilder) -> ProgramBuilder,
    ) -> Self {
        let children = Self::nested(body);
        self.element(ElementDocument::conditional(name, condition, children))
    }

    pub fn fork(
        self,
        name: &str,
        left: impl FnOnce(ProgramBuilder) -> ProgramBuilder,
        right: impl FnOnce(ProgramBuilder) -> ProgramBuilder,
    ) -> Self {
        let left = Self::nested(left);
        let right = Self::nested(right);
        self.element(ElementDocument::fork(name, left, right))
    }

    pub fn link(self, name: &str, target: &str) -> Self {
        self.element(ElementDocument::link(name, target))
    }

    pub fn saved_sequence(self, name: &str, file_name: &str) -> Self {
        self.element(ElementDocument::saved_sequence(name, file_name))
    }

    pub fn build_document(self) -> SequenceDocument {
        SequenceDocument::new(self.name, self.elements)
    }

    pub fn build_tree(self) -> ProgramTree {
        ProgramTree::from_document(&self.build_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequence_builder::types::ElementKind;

    #[test]
    fn test_expression_builder() {
        let doc = ExpressionBuilder::new("wave")
            .led(1, 100)
            .motor(2, -50)
            .delay_ms(250)
            .comment("say hi", true)
            .build();

        match &doc {
            ElementDocument::Expression {
                header,
                snapshot,
                delay_ms,
            } => {
                assert_eq!(header.name, "wave");
                assert_eq!(header.comment, "say hi");
                assert_eq!(snapshot.operation_count(), 2);
                assert_eq!(*delay_ms, 250);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_program_builder_nesting() {
        let doc = ProgramBuilder::new("main")
            .expression("a")
            .counter_loop("loop", 2, |b| b.expression("b").expression("c"))
            .fork("both", |l| l.expression("l"), |r| r)
            .build_document();

        assert_eq!(doc.elements.len(), 3);
        assert_eq!(doc.element_count(), 6);
        assert_eq!(doc.elements[2].kind(), ElementKind::Fork);
    }
}
