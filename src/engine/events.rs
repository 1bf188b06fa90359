use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::UpsertOp;
use crate::engine::{BatchTask, RunSummary};

/// Lifecycle notifications emitted by one improvement run.
#[derive(Debug, Clone)]
pub enum ImprovementEvent {
    Start {
        method: String,
    },
    BatchProcessed {
        method: String,
        batch: BatchTask,
        operations: Arc<[UpsertOp]>,
    },
    End {
        method: String,
        summary: RunSummary,
    },
}

impl ImprovementEvent {
    pub fn method(&self) -> &str {
        match self {
            ImprovementEvent::Start { method }
            | ImprovementEvent::BatchProcessed { method, .. }
            | ImprovementEvent::End { method, .. } => method,
        }
    }
}

/// Receives lifecycle events. Implementations must not block: they are
/// called inline from batch tasks.
pub trait ImprovementObserver: Send + Sync {
    fn notify(&self, event: ImprovementEvent);
}

pub struct NoopObserver;

impl ImprovementObserver for NoopObserver {
    fn notify(&self, _event: ImprovementEvent) {}
}

/// Forwards events to a host-side channel. A dropped receiver is ignored.
impl ImprovementObserver for mpsc::UnboundedSender<ImprovementEvent> {
    fn notify(&self, event: ImprovementEvent) {
        let _ = self.send(event);
    }
}

/// Renders events as log lines tagged with the engine name.
pub struct TracingObserver {
    engine: String,
}

impl TracingObserver {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
        }
    }
}

impl ImprovementObserver for TracingObserver {
    fn notify(&self, event: ImprovementEvent) {
        match event {
            ImprovementEvent::Start { method } => {
                tracing::info!(
                    "{} Engine Improvement -> Starting using method \"{}\"...",
                    self.engine,
                    method
                );
            }
            ImprovementEvent::BatchProcessed {
                method, operations, ..
            } => {
                tracing::info!(
                    "{} Engine Improvement -> ({}): {} documents processed.",
                    self.engine,
                    method,
                    operations.len()
                );
            }
            ImprovementEvent::End { method, summary } => {
                tracing::info!(
                    "{} Engine Improvement -> Finished, method \"{}\" \
                     ({} ok, {} empty, {} failed, {} upserted).",
                    self.engine,
                    method,
                    summary.batches_succeeded,
                    summary.batches_empty,
                    summary.batches_failed,
                    summary.written.upserted
                );
            }
        }
    }
}
