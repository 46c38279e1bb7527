//! Sequence Builder - Main Entry Point
//!
//! Opens a sequence (the one named on the command line, or the last one
//! used), prints its outline and optionally plays it on a simulated device.
//!
//! ```text
//! sequence-builder [PATH] [--run]
//! ```

use sequence_builder::{
    config::{AppState, EditorSettings},
    editor::SequenceEditor,
    execution::{DirectoryLibrary, SimulatedDevice},
    model::{lock_program, ProgramTree},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> sequence_builder::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sequence_builder=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sequence Builder");

    let mut run = false;
    let mut requested: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--run" => run = true,
            _ => requested = Some(PathBuf::from(arg)),
        }
    }

    let mut app_state = AppState::load_or_default();
    app_state.cleanup_missing_sequences();

    let path = requested.or_else(|| app_state.last_sequence().map(|p| p.to_path_buf()));
    let settings = EditorSettings::default();
    let mut editor = SequenceEditor::new(ProgramTree::new(), settings.clone());

    if let Some(path) = &path {
        tracing::info!("Opening {:?}", path);
        match editor.open(path) {
            Ok(()) => app_state.add_recent_sequence(path, editor.name()),
            Err(e) => {
                tracing::warn!("Failed to open sequence: {}", e);
                app_state.remove_recent_sequence(path);
            }
        }
    }

    let outline = lock_program(editor.program()).outline();
    println!("{}", editor.name());
    if outline.is_empty() {
        println!("  (empty)");
    } else {
        print!("{}", outline);
    }

    if run {
        let library_dir = settings
            .resolved_library_dir()
            .unwrap_or_else(|| PathBuf::from("."));
        let executor = editor.executor(
            Arc::new(SimulatedDevice::new()),
            Arc::new(DirectoryLibrary::new(library_dir)),
        );
        let plan = sequence_builder::execution::Plan::from_program(&lock_program(editor.program()));

        let report = std::thread::scope(|scope| {
            let playback = scope.spawn(|| executor.run(&plan));
            while !playback.is_finished() {
                editor.pump();
                std::thread::sleep(std::time::Duration::from_millis(16));
            }
            playback.join()
        });
        editor.pump();

        match report {
            Ok(Ok(report)) => println!(
                "Played {} expressions{}",
                report.expressions_applied,
                if report.stopped { " (stopped)" } else { "" }
            ),
            Ok(Err(e)) => tracing::error!("Playback failed: {}", e),
            Err(_) => tracing::error!("Playback thread panicked"),
        }
    }

    if let Err(e) = app_state.save() {
        tracing::warn!("Failed to save app state: {}", e);
    }

    tracing::info!("Sequence Builder exiting");
    Ok(())
}
