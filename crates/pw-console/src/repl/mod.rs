//! The REPL pane: an input line, a history of submissions and the worker
//! thread that evaluates them.
//!
//! Everything here except the evaluator itself runs on the UI thread.
//! Submissions are queued to the worker and results come back as events
//! that [`ReplPane::poll`] folds into the history.

use crossbeam_channel::RecvTimeoutError;
use eyre::Result;
use std::time::{Duration, Instant};

mod capture;
mod execution;
mod input;
mod lua;
mod transcript;
mod worker;

pub use capture::{CaptureScope, OutputCapture};
pub use execution::{Evaluation, ExecutionState, UserCodeExecution, CANCELED_OUTPUT};
pub use input::{InputHistory, InputLine};
pub use lua::LuaEvaluator;
pub use transcript::{render_entry, render_transcript, RUNNING_MARKER};
pub use worker::Evaluator;

use crate::redraw::RedrawSignal;
use worker::{ExecutionWorker, WorkItem, WorkerEvent};

/// What an interrupt request (`Ctrl-C`) ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The input line had text and was cleared.
    ClearedInput,
    /// The oldest unfinished submission was cancelled.
    Cancelled(u64),
    /// Nothing to clear or cancel.
    Idle,
}

pub struct ReplPane {
    history: Vec<UserCodeExecution>,
    input: InputLine,
    worker: ExecutionWorker,
    next_id: u64,
    transcript: String,
    redraw: RedrawSignal,
}

impl ReplPane {
    /// A pane evaluating Lua code in a fresh state.
    pub fn new(redraw: RedrawSignal) -> Result<Self> {
        Self::with_evaluator(
            || LuaEvaluator::new().map_err(|e| eyre::eyre!("Failed to create Lua state: {}", e)),
            redraw,
        )
    }

    /// A pane whose evaluator is built by `factory` on the worker thread.
    pub fn with_evaluator<E, F>(factory: F, redraw: RedrawSignal) -> Result<Self>
    where
        E: Evaluator + 'static,
        F: FnOnce() -> Result<E> + Send + 'static,
    {
        let worker = ExecutionWorker::spawn(factory, redraw.clone())?;
        Ok(Self {
            history: Vec::new(),
            input: InputLine::default(),
            worker,
            next_id: 1,
            transcript: String::new(),
            redraw,
        })
    }

    pub fn set_input_history(&mut self, history: InputHistory) {
        self.input = InputLine::new(history);
    }

    pub fn history(&self) -> &[UserCodeExecution] {
        &self.history
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputLine {
        &mut self.input
    }

    /// True while any submission is still pending or running.
    pub fn is_busy(&self) -> bool {
        self.history.iter().any(UserCodeExecution::is_running)
    }

    /// Queues `source` for evaluation and returns without waiting for it.
    /// Blank input is rejected and creates no entry.
    pub fn submit(&mut self, source: &str) -> bool {
        if source.trim().is_empty() {
            return false;
        }

        let id = self.next_id;
        self.next_id += 1;
        let entry = UserCodeExecution::new(id, source.to_string());
        let item = WorkItem {
            id,
            source: entry.input.clone(),
            cancel: entry.cancel_flag(),
        };
        self.history.push(entry);

        tracing::info!(target: "pw_console", "[LUA] START\n{}", source);

        if self.worker.work_tx.send(item).is_err() {
            tracing::error!("user-code thread is gone, submission {} dropped", id);
            if let Some(entry) = self.history.last_mut() {
                entry.complete(Evaluation {
                    result: Some("execution context unavailable".to_string()),
                    ..Default::default()
                });
            }
        }

        self.refresh();
        true
    }

    /// Submits the input line. On success the line is added to the input
    /// history and cleared; rejected input is left in place.
    pub fn submit_input(&mut self) -> bool {
        let source = self.input.text().to_string();
        if !self.submit(&source) {
            return false;
        }
        self.input.history_mut().push(&source);
        self.input.clear();
        true
    }

    pub fn interrupt(&mut self) -> Interrupt {
        if !self.input.is_empty() {
            self.input.clear();
            self.redraw.request();
            return Interrupt::ClearedInput;
        }

        let Some(entry) = self.history.iter_mut().find(|entry| entry.is_running()) else {
            return Interrupt::Idle;
        };
        let id = entry.id;
        entry.cancel();
        tracing::info!(target: "pw_console", "[LUA] CANCELED {}", id);
        self.refresh();
        Interrupt::Cancelled(id)
    }

    /// Applies every worker event received so far. Returns how many were
    /// handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.worker.events_rx.try_recv() {
            self.apply(event);
            handled += 1;
        }
        if handled > 0 {
            self.refresh();
        }
        handled
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout` for at least one
    /// event.
    pub fn poll_blocking(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let first = match self
            .worker
            .events_rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
        {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return 0,
        };
        self.apply(first);
        1 + self.poll()
    }

    fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Started { id } => {
                if let Some(entry) = self.entry_mut(id) {
                    entry.mark_running();
                }
            }
            WorkerEvent::Finished { id, evaluation } => {
                let Some(entry) = self.entry_mut(id) else {
                    return;
                };
                if entry.complete(evaluation) {
                    tracing::info!(
                        target: "pw_console",
                        "[LUA] FINISH\n{}",
                        entry.output.as_deref().unwrap_or_default()
                    );
                } else {
                    tracing::debug!("discarding result of cancelled submission {}", id);
                }
            }
            WorkerEvent::Skipped { id } => {
                tracing::debug!("submission {} cancelled before it started", id);
            }
        }
    }

    fn entry_mut(&mut self, id: u64) -> Option<&mut UserCodeExecution> {
        self.history.iter_mut().find(|entry| entry.id == id)
    }

    fn refresh(&mut self) {
        self.transcript = render_transcript(&self.history);
        self.redraw.request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Evaluator for Echo {
        fn evaluate(&mut self, source: &str) -> Evaluation {
            Evaluation {
                stdout: format!("ran {}\n", source),
                result: Some(source.to_uppercase()),
                ..Default::default()
            }
        }
    }

    fn echo_pane() -> ReplPane {
        ReplPane::with_evaluator(|| Ok(Echo), RedrawSignal::new()).unwrap()
    }

    fn wait_idle(pane: &mut ReplPane) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while pane.is_busy() && Instant::now() < deadline {
            pane.poll_blocking(Duration::from_millis(50));
        }
        assert!(!pane.is_busy(), "Pane still busy:\n{}", pane.transcript());
    }

    #[test]
    fn blank_submissions_are_rejected() {
        let mut pane = echo_pane();
        assert!(!pane.submit(""));
        assert!(!pane.submit("  \n\t"));
        assert!(pane.history().is_empty());
        assert_eq!(pane.transcript(), "");
    }

    #[test]
    fn submissions_complete_in_order() {
        let mut pane = echo_pane();
        assert!(pane.submit("a"));
        assert!(pane.submit("b"));
        assert!(pane.transcript().contains("Running..."));
        wait_idle(&mut pane);

        let ids: Vec<u64> = pane.history().iter().map(|e| e.id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(
            pane.transcript(),
            "In [1]: a\nran a\nOut[1]: A\n\nIn [2]: b\nran b\nOut[2]: B"
        );
    }

    #[test]
    fn interrupt_clears_input_before_cancelling() {
        let mut pane = echo_pane();
        assert_eq!(pane.interrupt(), Interrupt::Idle);

        pane.input_mut().set_text("half typed");
        assert_eq!(pane.interrupt(), Interrupt::ClearedInput);
        assert!(pane.input().is_empty());
        assert_eq!(pane.interrupt(), Interrupt::Idle);
    }

    #[test]
    fn submit_input_records_history() {
        let mut pane = echo_pane();
        pane.input_mut().set_text("x");
        assert!(pane.submit_input());
        assert!(pane.input().is_empty());
        assert_eq!(pane.input().history().entries(), ["x"]);

        pane.input_mut().set_text("   ");
        assert!(!pane.submit_input());
        assert_eq!(pane.input().text(), "   ");
        wait_idle(&mut pane);
    }

    #[test]
    fn failing_factory_reports_error() {
        let result = ReplPane::with_evaluator::<Echo, _>(
            || Err(eyre::eyre!("no interpreter")),
            RedrawSignal::new(),
        );
        let err = result.err().unwrap();
        assert!(format!("{:?}", err).contains("no interpreter"));
    }
}
