//! Background import workers.
//!
//! A validated drop is turned into an [`ImportJob`] and applied to the
//! shared program on a worker thread, so the UI task never waits on the
//! program lock while the user is dragging. Each job runs entirely under one
//! lock guard; its outcome travels back to the UI task as
//! [`UiCommand::ImportFinished`].

use crate::events::bridge::{UiCommand, UiHandle};
use crate::model::{lock_program, ContainerId, ElementId, SharedProgram};
use crate::persistence::ElementDocument;
use crate::types::InsertPosition;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One structural mutation requested by a drop.
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub ticket: u64,
    /// Epoch of the program the drop was resolved against.
    pub epoch: u64,
    pub document: ElementDocument,
    pub container: ContainerId,
    pub reference: Option<ElementId>,
    pub position: InsertPosition,
    /// Element to delete as part of the same mutation (moves only).
    pub source: Option<ElementId>,
}

/// Result of one import job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub ticket: u64,
    /// The freshly inserted element, `None` when the drop was rejected.
    pub inserted: Option<ElementId>,
    /// The moved-away original, when one was removed.
    pub removed: Option<ElementId>,
}

impl ImportOutcome {
    pub fn success(&self) -> bool {
        self.inserted.is_some()
    }
}

/// Apply one job to the program. Nothing changes when it is rejected,
/// including when the program was replaced after the drop was resolved.
pub fn apply_import(program: &SharedProgram, job: &ImportJob) -> ImportOutcome {
    let mut tree = lock_program(program);
    if tree.epoch() != job.epoch {
        tracing::warn!(
            "Import #{} was resolved against a replaced program; discarded",
            job.ticket
        );
        return ImportOutcome {
            ticket: job.ticket,
            inserted: None,
            removed: None,
        };
    }
    let inserted = tree.import(
        &job.document,
        job.container,
        job.reference,
        job.position,
        job.source,
    );
    let outcome = ImportOutcome {
        ticket: job.ticket,
        inserted,
        removed: inserted.and(job.source),
    };
    match inserted {
        Some(id) => tracing::debug!(
            "Import #{} placed {:?} in {:?} ({} elements total)",
            job.ticket,
            id,
            job.container,
            tree.element_count()
        ),
        None => tracing::warn!(
            "Import #{} into {:?} rejected; program unchanged",
            job.ticket,
            job.container
        ),
    }
    outcome
}

/// Pool of import worker threads.
pub struct ImportWorker {
    job_tx: Option<Sender<ImportJob>>,
    threads: Vec<JoinHandle<()>>,
}

impl ImportWorker {
    /// Start `workers` threads (at least one) applying jobs to `program`.
    pub fn spawn(program: SharedProgram, ui: UiHandle, workers: usize) -> Self {
        let (job_tx, job_rx) = unbounded::<ImportJob>();

        let threads = (0..workers.max(1))
            .filter_map(|index| {
                let program = Arc::clone(&program);
                let ui = ui.clone();
                let rx = job_rx.clone();
                std::thread::Builder::new()
                    .name(format!("import-worker-{index}"))
                    .spawn(move || run_worker(index, program, ui, rx))
                    .map_err(|e| tracing::error!("Failed to start import worker {}: {}", index, e))
                    .ok()
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            threads,
        }
    }

    /// Queue a job. Returns `false` once the pool is shutting down.
    pub fn submit(&self, job: ImportJob) -> bool {
        match &self.job_tx {
            Some(tx) if !self.threads.is_empty() => tx.send(job).is_ok(),
            _ => false,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.threads.len()
    }

    /// Stop accepting jobs, let workers drain what is queued, and join them.
    pub fn shutdown(&mut self) {
        if self.job_tx.take().is_none() {
            return;
        }
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Import worker panicked");
            }
        }
    }
}

impl Drop for ImportWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    index: usize,
    program: SharedProgram,
    ui: UiHandle,
    jobs: Receiver<ImportJob>,
) {
    tracing::info!("Import worker {} started", index);

    // Ends once the pool drops the sending half and the queue is drained
    for job in jobs.iter() {
        let outcome = apply_import(&program, &job);
        if !ui.post(UiCommand::ImportFinished(outcome)) {
            tracing::debug!("UI gone; import #{} outcome dropped", job.ticket);
        }
    }

    tracing::info!("Import worker {} stopped", index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::bridge::UiBridge;
    use crate::model::ProgramTree;
    use crate::types::DeviceServiceSnapshot;

    fn expr(name: &str) -> ElementDocument {
        ElementDocument::expression(name, DeviceServiceSnapshot::new())
    }

    fn job(
        program: &SharedProgram,
        ticket: u64,
        doc: ElementDocument,
        source: Option<ElementId>,
    ) -> ImportJob {
        ImportJob {
            ticket,
            epoch: lock_program(program).epoch(),
            document: doc,
            container: ContainerId::ROOT,
            reference: None,
            position: InsertPosition::After,
            source,
        }
    }

    #[test]
    fn test_apply_import_copy() {
        let program = ProgramTree::new().into_shared();
        let outcome = apply_import(&program, &job(&program, 1, expr("a"), None));
        assert!(outcome.success());
        assert!(outcome.removed.is_none());
        assert_eq!(lock_program(&program).children(ContainerId::ROOT).len(), 1);
    }

    #[test]
    fn test_apply_import_rejects_missing_reference() {
        let program = ProgramTree::new().into_shared();
        let mut j = job(&program, 2, expr("a"), None);
        j.reference = Some(ElementId(99));
        let outcome = apply_import(&program, &j);
        assert!(!outcome.success());
        assert_eq!(lock_program(&program).element_count(), 0);
    }

    #[test]
    fn test_pool_posts_outcomes_and_drains_on_shutdown() {
        let program = ProgramTree::new().into_shared();
        let (ui, queue) = UiBridge::new();
        let mut pool = ImportWorker::spawn(Arc::clone(&program), ui, 2);
        assert_eq!(pool.worker_count(), 2);

        for ticket in 0..5 {
            assert!(pool.submit(job(&program, ticket, expr("x"), None)));
        }
        pool.shutdown();
        assert_eq!(pool.worker_count(), 0);
        assert!(!pool.submit(job(&program, 9, expr("late"), None)));

        let finished = queue
            .drain()
            .into_iter()
            .filter(|c| matches!(c, UiCommand::ImportFinished(o) if o.success()))
            .count();
        assert_eq!(finished, 5);
        assert_eq!(lock_program(&program).children(ContainerId::ROOT).len(), 5);
    }

    #[test]
    fn test_move_job_removes_source() {
        let program = ProgramTree::new().into_shared();
        let source = {
            let mut tree = lock_program(&program);
            let a = tree.instantiate(&expr("a"));
            tree.append(ContainerId::ROOT, a);
            let b = tree.instantiate(&expr("b"));
            tree.append(ContainerId::ROOT, b);
            a
        };
        let outcome = apply_import(&program, &job(&program, 3, expr("a"), Some(source)));
        assert_eq!(outcome.removed, Some(source));

        let tree = lock_program(&program);
        let names: Vec<_> = tree
            .children(ContainerId::ROOT)
            .into_iter()
            .map(|id| tree.element(id).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_job_for_replaced_program_is_discarded() {
        let doc = crate::persistence::SequenceDocument::new(
            "seq",
            vec![expr("a"), expr("b"), expr("c")],
        );
        let program = ProgramTree::from_document(&doc).into_shared();
        // Move "a" to the end, resolved against the first program
        let (a, c) = {
            let tree = lock_program(&program);
            let children = tree.children(ContainerId::ROOT);
            (children[0], children[2])
        };
        let mut stale = job(&program, 4, expr("a"), Some(a));
        stale.reference = Some(c);

        // Same shape, same ids, different program
        let replacement = crate::persistence::SequenceDocument::new(
            "other",
            vec![expr("x"), expr("y"), expr("z")],
        );
        *lock_program(&program) = ProgramTree::from_document(&replacement);

        let outcome = apply_import(&program, &stale);
        assert_eq!(outcome.inserted, None);
        assert_eq!(outcome.removed, None);

        let tree = lock_program(&program);
        let names: Vec<_> = tree
            .children(ContainerId::ROOT)
            .into_iter()
            .map(|id| tree.element(id).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }
}
