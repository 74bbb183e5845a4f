use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use eyre::{eyre, Result, WrapErr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::execution::Evaluation;
use crate::redraw::RedrawSignal;

/// Something that can run one submission of user code to completion.
///
/// Implementations live on the worker thread for their whole life, so they
/// need not be `Send`; faults must be reported through
/// [`Evaluation::result`] rather than returned.
pub trait Evaluator {
    fn evaluate(&mut self, source: &str) -> Evaluation;
}

/// A unit of work queued for the execution context.
#[derive(Debug)]
pub(crate) struct WorkItem {
    pub(crate) id: u64,
    pub(crate) source: String,
    pub(crate) cancel: Arc<AtomicBool>,
}

/// Messages posted back from the execution context to the UI domain.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Started { id: u64 },
    Finished { id: u64, evaluation: Evaluation },
    /// The item was cancelled before the worker picked it up.
    Skipped { id: u64 },
}

/// Handle to the long-lived thread that evaluates user code one item at a time.
pub(crate) struct ExecutionWorker {
    pub(crate) work_tx: Sender<WorkItem>,
    pub(crate) events_rx: Receiver<WorkerEvent>,
}

impl ExecutionWorker {
    /// Spawns the `user-code` thread and builds the evaluator on it. Returns
    /// once the evaluator is ready, or with the error that prevented it.
    pub(crate) fn spawn<E, F>(factory: F, redraw: RedrawSignal) -> Result<Self>
    where
        E: Evaluator + 'static,
        F: FnOnce() -> Result<E> + Send + 'static,
    {
        let (work_tx, work_rx) = unbounded::<WorkItem>();
        let (events_tx, events_rx) = unbounded::<WorkerEvent>();
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        std::thread::Builder::new()
            .name("user-code".into())
            .spawn(move || {
                let mut evaluator = match factory() {
                    Ok(evaluator) => {
                        let _ = ready_tx.send(Ok(()));
                        evaluator
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run_worker(&mut evaluator, work_rx, events_tx, redraw);
            })
            .wrap_err("Failed to spawn user-code thread")?;

        ready_rx
            .recv()
            .map_err(|_| eyre!("user-code thread exited during startup"))?
            .wrap_err("Failed to initialize evaluator")?;

        Ok(Self { work_tx, events_rx })
    }
}

fn run_worker<E: Evaluator>(
    evaluator: &mut E,
    work_rx: Receiver<WorkItem>,
    events_tx: Sender<WorkerEvent>,
    redraw: RedrawSignal,
) {
    while let Ok(item) = work_rx.recv() {
        if item.cancel.load(Ordering::Acquire) {
            let _ = events_tx.send(WorkerEvent::Skipped { id: item.id });
            redraw.request();
            continue;
        }

        let _ = events_tx.send(WorkerEvent::Started { id: item.id });
        redraw.request();

        let evaluation = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(&item.source)))
            .unwrap_or_else(|payload| Evaluation {
                result: Some(format!("evaluator panicked: {}", panic_message(payload.as_ref()))),
                ..Default::default()
            });

        if events_tx
            .send(WorkerEvent::Finished {
                id: item.id,
                evaluation,
            })
            .is_err()
        {
            // UI side is gone.
            break;
        }
        redraw.request();
    }
    tracing::debug!("user-code thread stopped");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
