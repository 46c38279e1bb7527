//! Sequence playback.
//!
//! A program is first flattened into a [`Plan`] (so the program lock is
//! released before anything runs), then walked step by step:
//!
//! - **Expression**: apply the snapshot, then hold for its delay
//! - **Counter loop**: run the body N times
//! - **Conditional loop**: run the body while the condition holds
//! - **Fork**: run both branches on scoped threads and join them
//! - **Saved sequence**: run the named sequence inline, then continue
//! - **Link**: run the named sequence, then end the current one
//!
//! A shared stop flag is checked between steps. Nested saved sequences and
//! links are bounded by a maximum call depth.

use crate::config::settings::EditorSettings;
use crate::error::{Result, ResultExt, SequenceError};
use crate::events::bridge::UiHandle;
use crate::events::publisher::ViewEventPublisher;
use crate::execution::device::DeviceController;
use crate::execution::library::SequenceLibrary;
use crate::model::{ContainerId, ElementBody, ElementId, ProgramTree};
use crate::persistence::{ElementDocument, SequenceDocument};
use crate::types::{Condition, DeviceServiceSnapshot};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of interruptible waits.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One executable step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Expression {
        element: Option<ElementId>,
        name: String,
        snapshot: DeviceServiceSnapshot,
        delay_ms: u64,
    },
    CounterLoop {
        element: Option<ElementId>,
        iterations: u32,
        body: Vec<Step>,
    },
    Conditional {
        element: Option<ElementId>,
        condition: Condition,
        body: Vec<Step>,
    },
    Fork {
        element: Option<ElementId>,
        left: Vec<Step>,
        right: Vec<Step>,
    },
    Link {
        element: Option<ElementId>,
        target: String,
    },
    SavedSequence {
        element: Option<ElementId>,
        file_name: String,
    },
}

impl Step {
    fn element(&self) -> Option<ElementId> {
        match self {
            Step::Expression { element, .. }
            | Step::CounterLoop { element, .. }
            | Step::Conditional { element, .. }
            | Step::Fork { element, .. }
            | Step::Link { element, .. }
            | Step::SavedSequence { element, .. } => *element,
        }
    }

    fn from_document(doc: &ElementDocument) -> Self {
        let steps = |docs: &[ElementDocument]| -> Vec<Step> {
            docs.iter().map(Step::from_document).collect()
        };
        match doc {
            ElementDocument::Expression {
                header,
                snapshot,
                delay_ms,
            } => Step::Expression {
                element: None,
                name: header.name.clone(),
                snapshot: snapshot.clone(),
                delay_ms: *delay_ms,
            },
            ElementDocument::CounterLoop {
                iterations,
                children,
                ..
            } => Step::CounterLoop {
                element: None,
                iterations: *iterations,
                body: steps(children),
            },
            ElementDocument::LoopableConditional {
                condition,
                children,
                ..
            } => Step::Conditional {
                element: None,
                condition: condition.clone(),
                body: steps(children),
            },
            ElementDocument::Fork { left, right, .. } => Step::Fork {
                element: None,
                left: steps(left),
                right: steps(right),
            },
            ElementDocument::Link { target, .. } => Step::Link {
                element: None,
                target: target.clone(),
            },
            ElementDocument::SavedSequence { file_name, .. } => Step::SavedSequence {
                element: None,
                file_name: file_name.clone(),
            },
        }
    }
}

/// Steps of one program, detached from the program they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    /// Snapshot a live program. Steps remember their element ids so the
    /// play-head can follow them.
    pub fn from_program(tree: &ProgramTree) -> Self {
        Self {
            steps: Self::container_steps(tree, tree.root()),
        }
    }

    fn container_steps(tree: &ProgramTree, container: ContainerId) -> Vec<Step> {
        tree.children(container)
            .into_iter()
            .filter_map(|id| {
                let e = tree.element(id)?;
                let element = Some(id);
                Some(match e.body() {
                    ElementBody::Expression { snapshot, delay_ms } => Step::Expression {
                        element,
                        name: e.name().to_string(),
                        snapshot: snapshot.clone(),
                        delay_ms: *delay_ms,
                    },
                    ElementBody::CounterLoop { iterations, body } => Step::CounterLoop {
                        element,
                        iterations: *iterations,
                        body: Self::container_steps(tree, *body),
                    },
                    ElementBody::LoopableConditional { condition, body } => Step::Conditional {
                        element,
                        condition: condition.clone(),
                        body: Self::container_steps(tree, *body),
                    },
                    ElementBody::Fork { left, right } => Step::Fork {
                        element,
                        left: Self::container_steps(tree, *left),
                        right: Self::container_steps(tree, *right),
                    },
                    ElementBody::Link { target } => Step::Link {
                        element,
                        target: target.clone(),
                    },
                    ElementBody::SavedSequence { file_name } => Step::SavedSequence {
                        element,
                        file_name: file_name.clone(),
                    },
                })
            })
            .collect()
    }

    /// Plan for a saved document (no play-head).
    pub fn from_document(doc: &SequenceDocument) -> Self {
        Self {
            steps: doc.elements.iter().map(Step::from_document).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// How a list of steps ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// A link ran; the enclosing sequence ends here.
    Jumped,
    Stopped,
}

/// Summary of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Expressions applied to the device.
    pub expressions_applied: usize,
    /// Whether the run was cut short by the stop flag.
    pub stopped: bool,
}

/// Plays sequences on a device.
pub struct SequenceExecutor {
    device: Arc<dyn DeviceController>,
    library: Arc<dyn SequenceLibrary>,
    ui: Option<UiHandle>,
    publisher: Option<Arc<ViewEventPublisher>>,
    stop: AtomicBool,
    max_call_depth: usize,
    applied: AtomicUsize,
}

impl SequenceExecutor {
    pub fn new(
        device: Arc<dyn DeviceController>,
        library: Arc<dyn SequenceLibrary>,
        settings: &EditorSettings,
    ) -> Self {
        Self {
            device,
            library,
            ui: None,
            publisher: None,
            stop: AtomicBool::new(false),
            max_call_depth: settings.max_call_depth,
            applied: AtomicUsize::new(0),
        }
    }

    /// Post play-head highlights to the UI task.
    pub fn with_ui(mut self, ui: UiHandle) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Reset views through `publisher` when a run starts and ends.
    pub fn with_publisher(mut self, publisher: Arc<ViewEventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Stop the running plan, or the next one if none is running yet.
    /// Safe to call from any thread.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Run a live program.
    pub fn run_program(&self, tree: &ProgramTree) -> Result<RunReport> {
        self.run(&Plan::from_program(tree))
    }

    /// Run a saved document.
    pub fn run_document(&self, doc: &SequenceDocument) -> Result<RunReport> {
        tracing::info!("Running sequence '{}'", doc.name);
        self.run(&Plan::from_document(doc))
    }

    /// Run a plan to completion, until stopped or until the first error.
    ///
    /// A stop requested before the run starts ends it before the first
    /// step. The stop flag is cleared when the run returns.
    pub fn run(&self, plan: &Plan) -> Result<RunReport> {
        self.applied.store(0, Ordering::SeqCst);
        self.reset_views();

        let started = Instant::now();
        let result = self.run_steps(&plan.steps, 0);
        self.stop.store(false, Ordering::SeqCst);
        self.reset_views();

        let flow = result?;
        let report = RunReport {
            expressions_applied: self.applied.load(Ordering::SeqCst),
            stopped: flow == Flow::Stopped,
        };
        tracing::info!(
            "Sequence finished in {:?}: {} expressions applied{}",
            started.elapsed(),
            report.expressions_applied,
            if report.stopped { " (stopped)" } else { "" }
        );
        Ok(report)
    }

    fn reset_views(&self) {
        if let Some(publisher) = &self.publisher {
            publisher.publish_reset_views_for_sequence_execution_event();
        }
    }

    fn highlight(&self, step: &Step) {
        if let (Some(ui), Some(element)) = (&self.ui, step.element()) {
            ui.highlight(element);
        }
    }

    fn run_steps(&self, steps: &[Step], depth: usize) -> Result<Flow> {
        for step in steps {
            if self.is_stopped() {
                return Ok(Flow::Stopped);
            }
            match self.run_step(step, depth)? {
                Flow::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Continue)
    }

    fn run_step(&self, step: &Step, depth: usize) -> Result<Flow> {
        self.highlight(step);
        match step {
            Step::Expression {
                name,
                snapshot,
                delay_ms,
                ..
            } => {
                tracing::trace!("Applying expression '{}'", name);
                self.device
                    .apply_expression(snapshot)
                    .with_context(|| format!("Expression '{}'", name))?;
                self.applied.fetch_add(1, Ordering::SeqCst);
                Ok(self.hold(Duration::from_millis(*delay_ms)))
            }
            Step::CounterLoop {
                iterations, body, ..
            } => {
                for _ in 0..*iterations {
                    match self.run_steps(body, depth)? {
                        Flow::Continue => {}
                        other => return Ok(other),
                    }
                }
                Ok(Flow::Continue)
            }
            Step::Conditional {
                condition, body, ..
            } => {
                while !self.is_stopped() && self.device.evaluate_condition(condition)? {
                    match self.run_steps(body, depth)? {
                        Flow::Continue => {}
                        other => return Ok(other),
                    }
                }
                Ok(if self.is_stopped() {
                    Flow::Stopped
                } else {
                    Flow::Continue
                })
            }
            Step::Fork { left, right, .. } => self.run_fork(left, right, depth),
            Step::SavedSequence { file_name, .. } => {
                Ok(match self.run_named(file_name, depth)? {
                    Flow::Stopped => Flow::Stopped,
                    _ => Flow::Continue,
                })
            }
            Step::Link { target, .. } => Ok(match self.run_named(target, depth)? {
                Flow::Stopped => Flow::Stopped,
                _ => Flow::Jumped,
            }),
        }
    }

    /// Both branches run concurrently; a link ends only its own branch.
    fn run_fork(&self, left: &[Step], right: &[Step], depth: usize) -> Result<Flow> {
        let (left_result, right_result) = std::thread::scope(|scope| {
            let handle = scope.spawn(|| self.run_steps(left, depth));
            let right_result = self.run_steps(right, depth);
            let left_result = handle
                .join()
                .unwrap_or_else(|_| Err(SequenceError::Execution("Fork branch panicked".into())));
            (left_result, right_result)
        });
        let flows = [left_result?, right_result?];
        Ok(if flows.contains(&Flow::Stopped) {
            Flow::Stopped
        } else {
            Flow::Continue
        })
    }

    /// Run another saved sequence one call level deeper.
    fn run_named(&self, name: &str, depth: usize) -> Result<Flow> {
        let depth = depth + 1;
        if depth > self.max_call_depth {
            return Err(SequenceError::CallDepthExceeded { depth });
        }
        let doc = self
            .library
            .load(name)
            .with_context(|| format!("Resolving saved sequence '{}'", name))?;
        tracing::debug!("Entering '{}' at depth {}", name, depth);
        self.run_steps(&Plan::from_document(&doc).steps, depth)
    }

    /// Wait out an expression's hold time, waking early when stopped.
    fn hold(&self, duration: Duration) -> Flow {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return Flow::Stopped;
            }
            let now = Instant::now();
            if now >= deadline {
                return Flow::Continue;
            }
            std::thread::sleep(STOP_POLL_INTERVAL.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::bridge::{UiBridge, UiCommand};
    use crate::execution::device::MockDeviceController;
    use crate::execution::library::InMemoryLibrary;
    use crate::types::Comparison;
    use mockall::Sequence;

    fn led(port: &str) -> DeviceServiceSnapshot {
        DeviceServiceSnapshot::new().with_operation("led", "on", [("port", port)])
    }

    fn expr(name: &str, port: &str) -> ElementDocument {
        ElementDocument::expression(name, led(port))
    }

    fn executor(device: MockDeviceController, library: InMemoryLibrary) -> SequenceExecutor {
        SequenceExecutor::new(Arc::new(device), Arc::new(library), &EditorSettings::default())
    }

    #[test]
    fn test_counter_loop_repeats_body() {
        let mut device = MockDeviceController::new();
        device
            .expect_apply_expression()
            .times(6)
            .returning(|_| Ok(()));

        let doc = SequenceDocument::new(
            "loop",
            vec![ElementDocument::counter_loop(
                "x3",
                3,
                vec![expr("a", "1"), expr("b", "2")],
            )],
        );
        let report = executor(device, InMemoryLibrary::new())
            .run_document(&doc)
            .unwrap();
        assert_eq!(report.expressions_applied, 6);
        assert!(!report.stopped);
    }

    #[test]
    fn test_conditional_runs_while_condition_holds() {
        let mut seq = Sequence::new();
        let mut device = MockDeviceController::new();
        for holds in [true, true, false] {
            device
                .expect_evaluate_condition()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(holds));
        }
        device
            .expect_apply_expression()
            .times(2)
            .returning(|_| Ok(()));

        let condition = Condition::new("distance", 1, Comparison::GreaterThan, 20);
        let doc = SequenceDocument::new(
            "cond",
            vec![ElementDocument::conditional("while far", condition, vec![expr("go", "1")])],
        );
        let report = executor(device, InMemoryLibrary::new())
            .run_document(&doc)
            .unwrap();
        assert_eq!(report.expressions_applied, 2);
    }

    #[test]
    fn test_saved_sequence_runs_inline_and_link_jumps() {
        let mut device = MockDeviceController::new();
        let mut seq = Sequence::new();
        for port in ["1", "9", "2", "9"] {
            let expected = led(port);
            device
                .expect_apply_expression()
                .withf(move |s| *s == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        let library = InMemoryLibrary::new().with(SequenceDocument::new(
            "blink",
            vec![expr("nine", "9")],
        ));

        let doc = SequenceDocument::new(
            "main",
            vec![
                expr("one", "1"),
                ElementDocument::saved_sequence("call", "blink"),
                expr("two", "2"),
                ElementDocument::link("jump", "blink"),
                expr("never", "3"),
            ],
        );
        let report = executor(device, library).run_document(&doc).unwrap();
        assert_eq!(report.expressions_applied, 4);
    }

    #[test]
    fn test_recursive_sequences_hit_depth_limit() {
        let device = MockDeviceController::new();
        let library = InMemoryLibrary::new().with(SequenceDocument::new(
            "again",
            vec![ElementDocument::saved_sequence("self", "again")],
        ));
        let doc = SequenceDocument::new(
            "main",
            vec![ElementDocument::saved_sequence("start", "again")],
        );
        let err = executor(device, library).run_document(&doc).unwrap_err();
        let mut current = &err;
        while let SequenceError::WithContext { source, .. } = current {
            current = source;
        }
        assert!(matches!(
            current,
            SequenceError::CallDepthExceeded { depth } if *depth == DEFAULT_DEPTH + 1
        ));
    }

    const DEFAULT_DEPTH: usize = crate::config::settings::DEFAULT_MAX_CALL_DEPTH;

    #[test]
    fn test_unknown_sequence_is_error() {
        let device = MockDeviceController::new();
        let doc = SequenceDocument::new("main", vec![ElementDocument::link("jump", "nowhere")]);
        let err = executor(device, InMemoryLibrary::new())
            .run_document(&doc)
            .unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_device_error_stops_run() {
        let mut device = MockDeviceController::new();
        device
            .expect_apply_expression()
            .times(1)
            .returning(|_| Err(SequenceError::Device("port busy".into())));
        let doc = SequenceDocument::new("main", vec![expr("a", "1"), expr("b", "2")]);
        let err = executor(device, InMemoryLibrary::new())
            .run_document(&doc)
            .unwrap_err();
        assert!(err.to_string().contains("port busy"));
    }

    #[test]
    fn test_fork_runs_both_branches() {
        let mut device = MockDeviceController::new();
        device
            .expect_apply_expression()
            .times(3)
            .returning(|_| Ok(()));
        let doc = SequenceDocument::new(
            "fork",
            vec![ElementDocument::fork(
                "both",
                vec![expr("l1", "1"), expr("l2", "2")],
                vec![expr("r1", "3")],
            )],
        );
        let report = executor(device, InMemoryLibrary::new())
            .run_document(&doc)
            .unwrap();
        assert_eq!(report.expressions_applied, 3);
    }

    #[test]
    fn test_stop_flag_interrupts_hold() {
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);
        let mut device = MockDeviceController::new();
        device
            .expect_apply_expression()
            .times(1)
            .returning(move |_| {
                let _ = started_tx.try_send(());
                Ok(())
            });
        let mut long = expr("long", "1");
        if let ElementDocument::Expression { delay_ms, .. } = &mut long {
            *delay_ms = 60_000;
        }
        let doc = SequenceDocument::new("main", vec![long, expr("after", "2")]);

        let exec = executor(device, InMemoryLibrary::new());
        let report = std::thread::scope(|scope| {
            let run = scope.spawn(|| exec.run_document(&doc));
            started_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("first expression applied");
            exec.stop();
            run.join().unwrap()
        })
        .unwrap();
        assert!(report.stopped);
        assert_eq!(report.expressions_applied, 1);
    }

    #[test]
    fn test_stop_before_run_is_kept() {
        let mut device = MockDeviceController::new();
        device
            .expect_apply_expression()
            .times(1)
            .returning(|_| Ok(()));
        let doc = SequenceDocument::new("main", vec![expr("only", "1")]);
        let exec = executor(device, InMemoryLibrary::new());

        exec.stop();
        let first = exec.run_document(&doc).unwrap();
        assert!(first.stopped);
        assert_eq!(first.expressions_applied, 0);

        // The flag was consumed by the stopped run
        let second = exec.run_document(&doc).unwrap();
        assert!(!second.stopped);
        assert_eq!(second.expressions_applied, 1);
    }

    #[test]
    fn test_program_run_posts_highlights() {
        let mut tree = ProgramTree::new();
        let a = tree.instantiate(&expr("a", "1"));
        tree.append(ContainerId::ROOT, a);
        let fork = tree.instantiate(&ElementDocument::fork("f", vec![], vec![]));
        tree.append(ContainerId::ROOT, fork);

        let mut device = MockDeviceController::new();
        device
            .expect_apply_expression()
            .times(1)
            .returning(|_| Ok(()));
        let (ui, queue) = UiBridge::new();
        let exec = executor(device, InMemoryLibrary::new()).with_ui(ui);
        exec.run_program(&tree).unwrap();

        assert_eq!(
            queue.drain(),
            vec![
                UiCommand::HighlightElement(a),
                UiCommand::HighlightElement(fork)
            ]
        );
    }
}
