use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Text stored as the result of an evaluation cancelled by the user.
pub const CANCELED_OUTPUT: &str = "Canceled";

/// Lifecycle of a submitted evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Queued for the execution context, not started yet.
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl ExecutionState {
    pub fn is_done(&self) -> bool {
        matches!(self, ExecutionState::Completed | ExecutionState::Cancelled)
    }
}

/// Output gathered while evaluating one piece of user code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub stdout: String,
    pub stderr: String,
    /// Formatted value or fault text; `None` when the code produced no value.
    pub result: Option<String>,
}

/// One REPL submission and, once finished, its captured output.
#[derive(Debug, Clone)]
pub struct UserCodeExecution {
    pub id: u64,
    pub input: String,
    pub state: ExecutionState,
    pub stdout: String,
    pub stderr: String,
    pub output: Option<String>,
    cancel: Arc<AtomicBool>,
}

impl UserCodeExecution {
    pub(crate) fn new(id: u64, input: String) -> Self {
        Self {
            id,
            input,
            state: ExecutionState::Pending,
            stdout: String::new(),
            stderr: String::new(),
            output: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.state.is_done()
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub(crate) fn mark_running(&mut self) {
        if self.state == ExecutionState::Pending {
            self.state = ExecutionState::Running;
        }
    }

    /// Stores the evaluation output. Ignored once the entry is done, so a
    /// late completion can never overwrite a cancellation.
    pub(crate) fn complete(&mut self, evaluation: Evaluation) -> bool {
        if self.state.is_done() {
            return false;
        }
        self.stdout = evaluation.stdout;
        self.stderr = evaluation.stderr;
        self.output = evaluation.result;
        self.state = ExecutionState::Completed;
        true
    }

    pub(crate) fn cancel(&mut self) -> bool {
        if self.state.is_done() {
            return false;
        }
        self.cancel.store(true, Ordering::Release);
        self.output = Some(CANCELED_OUTPUT.to_string());
        self.state = ExecutionState::Cancelled;
        true
    }
}
