//! Editor construction and drag-and-drop helpers

use super::test_timeout;
use sequence_builder::config::EditorSettings;
use sequence_builder::editor::SequenceEditor;
use sequence_builder::model::{lock_program, ContainerId, ElementId, ProgramTree};
use sequence_builder::persistence::SequenceDocument;
use sequence_builder::transfer::{DropTarget, ImportOutcome, TransferSupport};
use sequence_builder::view::{Point, Rect, ViewId};

/// Editor over a copy of `doc`, with uniform view bounds for hit testing
pub fn editor_for(doc: &SequenceDocument) -> SequenceEditor {
    let mut editor = SequenceEditor::new(
        ProgramTree::from_document(doc),
        EditorSettings::default(),
    );
    layout(&mut editor);
    editor
}

/// Give every element view 100x40 bounds
pub fn layout(editor: &mut SequenceEditor) {
    let ids: Vec<ViewId> = editor.views().element_views().map(|v| v.id()).collect();
    for id in ids {
        if let Some(view) = editor.views_mut().element_view_mut(id) {
            view.set_bounds(Rect::new(0.0, 0.0, 100.0, 40.0));
        }
    }
}

/// Point in the upper half of a laid-out view
pub fn upper_half() -> Option<Point> {
    Some(Point::new(10.0, 5.0))
}

/// Point in the lower half of a laid-out view
pub fn lower_half() -> Option<Point> {
    Some(Point::new(10.0, 35.0))
}

/// Depth-first search for the first element called `name`
pub fn element_named(tree: &ProgramTree, name: &str) -> Option<ElementId> {
    fn search(tree: &ProgramTree, container: ContainerId, name: &str) -> Option<ElementId> {
        for child in tree.children(container) {
            let element = tree.element(child)?;
            if element.name() == name {
                return Some(child);
            }
            for nested in element.child_containers() {
                if let Some(found) = search(tree, nested, name) {
                    return Some(found);
                }
            }
        }
        None
    }
    search(tree, tree.root(), name)
}

pub fn element_in(editor: &SequenceEditor, name: &str) -> ElementId {
    let tree = lock_program(editor.program());
    element_named(&tree, name).unwrap_or_else(|| panic!("no element named {name}"))
}

pub fn view_named(editor: &SequenceEditor, name: &str) -> ViewId {
    let element = element_in(editor, name);
    editor
        .views()
        .view_for_element(element)
        .unwrap_or_else(|| panic!("no view for {name}"))
}

/// `index`-th child container of the container element called `name`
pub fn container_of(editor: &SequenceEditor, name: &str, index: usize) -> ContainerId {
    let element = element_in(editor, name);
    lock_program(editor.program())
        .element(element)
        .map(|e| e.child_containers()[index])
        .unwrap_or_else(|| panic!("{name} is not a container"))
}

/// Names of the elements of `container`, in order
pub fn names_in(editor: &SequenceEditor, container: ContainerId) -> Vec<String> {
    let tree = lock_program(editor.program());
    tree.children(container)
        .into_iter()
        .filter_map(|id| tree.element(id).map(|e| e.name().to_string()))
        .collect()
}

/// Full gesture: drag the element called `source`, hover and drop on
/// `target`, then end the drag. Returns the import outcome when the drop
/// was accepted.
pub fn drag_and_drop(
    editor: &mut SequenceEditor,
    source: &str,
    target: DropTarget,
    point: Option<Point>,
) -> Option<ImportOutcome> {
    let payload = editor.begin_drag(view_named(editor, source))?;
    let support = TransferSupport::drop(payload, target, point);

    let outcome = if editor.drag_over(&support) {
        editor.pump();
        if editor.drop(&support) {
            editor.pump_until_import_finished(test_timeout())
        } else {
            None
        }
    } else {
        None
    };
    editor.export_done();
    editor.pump();
    layout(editor);
    outcome
}
