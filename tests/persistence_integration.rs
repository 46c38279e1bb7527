//! Saving and reopening sequences through the editor

mod common;

use common::builders::{ExpressionBuilder, ProgramBuilder};
use common::editor_helpers::*;
use sequence_builder::config::AppState;
use sequence_builder::editor::UNTITLED_SEQUENCE;
use sequence_builder::model::ContainerId;
use sequence_builder::persistence::{SequenceDocument, SEQUENCE_FORMAT_VERSION};
use sequence_builder::transfer::DropTarget;
use sequence_builder::types::{Comparison, Condition};
use tempfile::TempDir;

fn showcase() -> SequenceDocument {
    ProgramBuilder::new("showcase")
        .element(
            ExpressionBuilder::new("wave")
                .led(1, 200)
                .motor(2, -40)
                .delay_ms(500)
                .comment("hello", true)
                .build(),
        )
        .counter_loop("repeat", 4, |b| b.expression("step"))
        .conditional(
            "until near",
            Condition::new("distance", 1, Comparison::GreaterThan, 20),
            |b| b.expression("forward"),
        )
        .fork("both", |l| l.expression("left"), |r| r.saved_sequence("r", "dance"))
        .link("next", "finale")
        .build_document()
}

#[test]
fn test_save_and_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("showcase.json");

    let mut editor = editor_for(&showcase());
    editor.set_name("showcase");
    editor.save(&path).unwrap();
    assert_eq!(editor.path(), Some(path.as_path()));

    let mut reopened = editor_for(&SequenceDocument::default());
    reopened.open(&path).unwrap();
    assert_eq!(reopened.name(), "showcase");
    assert_eq!(reopened.to_document().elements, showcase().elements);
    assert_eq!(reopened.views().element_view_count(), 9);
}

#[test]
fn test_open_keeps_publisher_binding() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("showcase.json");
    showcase().save(&path).unwrap();

    let mut editor = editor_for(&ProgramBuilder::new("small").expression("x").build_document());
    let root = editor.views().root();
    editor.open(&path).unwrap();
    layout(&mut editor);

    assert_eq!(editor.views().root(), root);
    assert_eq!(editor.publisher().root(), Some(root));

    // Editing still works after the program was swapped
    let target = DropTarget::ContainerEnd(editor.views().root());
    drag_and_drop(
        &mut editor,
        "wave",
        target,
        None,
    )
    .expect("drop accepted");
    let names = names_in(&editor, ContainerId::ROOT);
    assert_eq!(names.first().map(String::as_str), Some("repeat"));
    assert_eq!(names.last().map(String::as_str), Some("wave"));
}

#[test]
fn test_edit_then_save_persists_new_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("order.json");
    let mut editor = editor_for(
        &ProgramBuilder::new("order")
            .expression("a")
            .expression("b")
            .expression("c")
            .build_document(),
    );

    let target = DropTarget::Element(view_named(&editor, "a"));
    drag_and_drop(
        &mut editor,
        "c",
        target,
        upper_half(),
    )
    .expect("drop accepted");
    editor.save(&path).unwrap();

    let saved = SequenceDocument::load(&path).unwrap();
    let names: Vec<&str> = saved.elements.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn test_newer_version_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("future.json");
    let mut doc = showcase();
    doc.version = SEQUENCE_FORMAT_VERSION + 1;
    std::fs::write(&path, doc.to_json().unwrap()).unwrap();

    let mut editor = editor_for(&ProgramBuilder::new("kept").expression("x").build_document());
    assert!(editor.open(&path).is_err());
    assert_eq!(names_in(&editor, ContainerId::ROOT), vec!["x"]);
    assert!(editor.path().is_none());
}

#[test]
fn test_new_sequence_clears_program() {
    let mut editor = editor_for(&showcase());
    editor.new_sequence();

    assert_eq!(editor.name(), UNTITLED_SEQUENCE);
    assert!(names_in(&editor, ContainerId::ROOT).is_empty());
    assert_eq!(editor.views().element_view_count(), 0);
}

#[test]
fn test_recent_sequences_round_trip() {
    let temp = TempDir::new().unwrap();
    let sequence = temp.path().join("showcase.json");
    showcase().save(&sequence).unwrap();
    let state_path = temp.path().join("app_state.json");

    let mut state = AppState::default();
    state.add_recent_sequence(&sequence, "showcase");
    state.save_to(&state_path).unwrap();

    let mut loaded = AppState::load_from(&state_path).unwrap();
    loaded.cleanup_missing_sequences();
    assert_eq!(loaded.last_sequence(), Some(sequence.as_path()));

    std::fs::remove_file(&sequence).unwrap();
    loaded.cleanup_missing_sequences();
    assert!(loaded.recent_sequences.is_empty());
}
