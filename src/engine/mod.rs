//! Incremental batch orchestration.
//!
//! One run of [`ImprovementEngine::process_improvement`] walks
//! `ceil(total_estimate / batch_size)` batches. Each batch task asks a
//! `produce` function for candidates at its `skip` offset, maps them to
//! idempotent upserts and hands those to a `write` sink:
//!
//! ```text
//! Start → [window of batch tasks ≤ window_size] → ... → End
//!              │ each task, under the shared limiter:
//!              └ produce(task) → map(candidate)* → write(ops) → BatchProcessed
//! ```
//!
//! The batch count is fixed when the run starts. An empty page is a silent
//! no-op and does not shorten the run, since totals can shift under
//! concurrent writes. A failing batch is logged and dropped; it never aborts
//! its siblings or the run.

pub mod events;

pub use events::{ImprovementEvent, ImprovementObserver, NoopObserver, TracingObserver};

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::app::Result;
use crate::domain::{BulkWriteResult, UpsertOp};

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_WINDOW_SIZE: usize = 500;
pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Batch tasks allowed in flight at once (default: 100)
    pub concurrency: usize,

    /// Batch tasks submitted per admission window (default: 500)
    pub window_size: usize,

    /// Seeds read per batch (default: 5)
    pub batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            window_size: DEFAULT_WINDOW_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Immutable descriptor of one batch, computed up front and passed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchTask {
    pub index: usize,
    pub skip: usize,
    pub batch_size: usize,
}

/// `ceil(total_estimate / batch_size)` batches with increasing `skip`
/// offsets. A zero batch size plans nothing.
pub fn plan_batches(batch_size: usize, total_estimate: usize) -> Vec<BatchTask> {
    if batch_size == 0 {
        return Vec::new();
    }
    let total_batches = total_estimate.div_ceil(batch_size);
    (0..total_batches)
        .map(|index| BatchTask {
            index,
            skip: index * batch_size,
            batch_size,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub batches_planned: usize,
    pub batches_succeeded: usize,
    pub batches_empty: usize,
    pub batches_failed: usize,
    pub batches_cancelled: usize,
    pub written: BulkWriteResult,
}

enum BatchOutcome {
    Written(BulkWriteResult),
    Empty,
    Failed,
    Cancelled,
}

pub struct ImprovementEngine {
    limiter: Arc<Semaphore>,
    window_size: usize,
    observer: Arc<dyn ImprovementObserver>,
    cancel: CancellationToken,
}

impl ImprovementEngine {
    pub fn new(config: &EngineConfig, observer: Arc<dyn ImprovementObserver>) -> Self {
        Self {
            limiter: Arc::new(Semaphore::new(config.concurrency.max(1))),
            window_size: config.window_size.max(1),
            observer,
            cancel: CancellationToken::new(),
        }
    }

    /// Batch tasks check `token` before starting; in-flight fetches are not
    /// interrupted.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs one improvement pass. Never fails: batch errors (and panics) are
    /// logged, counted in the summary and skipped.
    pub async fn process_improvement<T, P, PF, M, W, WF>(
        &self,
        method: &str,
        batch_size: usize,
        total_estimate: usize,
        produce: P,
        map: M,
        write: W,
    ) -> RunSummary
    where
        P: Fn(BatchTask) -> PF,
        PF: Future<Output = Result<Vec<T>>>,
        M: Fn(&T) -> Vec<UpsertOp>,
        W: Fn(Arc<[UpsertOp]>) -> WF,
        WF: Future<Output = Result<BulkWriteResult>>,
    {
        self.observer.notify(ImprovementEvent::Start {
            method: method.to_string(),
        });

        let plan = plan_batches(batch_size, total_estimate);
        let mut summary = RunSummary {
            batches_planned: plan.len(),
            ..Default::default()
        };
        debug!(
            "{}: {} batches of {} over an estimated {} records",
            method,
            plan.len(),
            batch_size,
            total_estimate
        );

        for window in plan.chunks(self.window_size) {
            if self.cancel.is_cancelled() {
                summary.batches_cancelled += window.len();
                continue;
            }

            let outcomes = join_all(
                window
                    .iter()
                    .map(|task| self.run_batch(method, *task, &produce, &map, &write)),
            )
            .await;

            for outcome in outcomes {
                match outcome {
                    BatchOutcome::Written(result) => {
                        summary.batches_succeeded += 1;
                        summary.written.merge(result);
                    }
                    BatchOutcome::Empty => summary.batches_empty += 1,
                    BatchOutcome::Failed => summary.batches_failed += 1,
                    BatchOutcome::Cancelled => summary.batches_cancelled += 1,
                }
            }
        }

        self.observer.notify(ImprovementEvent::End {
            method: method.to_string(),
            summary: summary.clone(),
        });
        summary
    }

    async fn run_batch<T, P, PF, M, W, WF>(
        &self,
        method: &str,
        task: BatchTask,
        produce: &P,
        map: &M,
        write: &W,
    ) -> BatchOutcome
    where
        P: Fn(BatchTask) -> PF,
        PF: Future<Output = Result<Vec<T>>>,
        M: Fn(&T) -> Vec<UpsertOp>,
        W: Fn(Arc<[UpsertOp]>) -> WF,
        WF: Future<Output = Result<BulkWriteResult>>,
    {
        let Ok(_permit) = self.limiter.acquire().await else {
            return BatchOutcome::Cancelled;
        };
        if self.cancel.is_cancelled() {
            return BatchOutcome::Cancelled;
        }

        let work = async {
            let candidates = match produce(task).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(
                        "{}: batch {} (skip {}) dropped while producing: {}",
                        method, task.index, task.skip, e
                    );
                    return BatchOutcome::Failed;
                }
            };
            if candidates.is_empty() {
                debug!("{}: batch {} (skip {}) is empty", method, task.index, task.skip);
                return BatchOutcome::Empty;
            }

            let operations: Arc<[UpsertOp]> = candidates.iter().flat_map(map).collect();
            match write(operations.clone()).await {
                Ok(result) => {
                    self.observer.notify(ImprovementEvent::BatchProcessed {
                        method: method.to_string(),
                        batch: task,
                        operations,
                    });
                    BatchOutcome::Written(result)
                }
                Err(e) => {
                    warn!(
                        "{}: batch {} (skip {}) dropped while writing: {}",
                        method, task.index, task.skip, e
                    );
                    BatchOutcome::Failed
                }
            }
        };

        match AssertUnwindSafe(work).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(
                    "{}: batch {} (skip {}) panicked and was dropped",
                    method, task.index, task.skip
                );
                BatchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::TrawlerError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn op(key: &str) -> Vec<UpsertOp> {
        vec![UpsertOp::new(key, json!({ "url": key }))]
    }

    fn engine(
        concurrency: usize,
        window_size: usize,
    ) -> (ImprovementEngine, mpsc::UnboundedReceiver<ImprovementEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = EngineConfig {
            concurrency,
            window_size,
            batch_size: 1,
        };
        (ImprovementEngine::new(&config, Arc::new(tx)), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ImprovementEvent>) -> Vec<ImprovementEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn accept(ops: Arc<[UpsertOp]>) -> Result<BulkWriteResult> {
        Ok(BulkWriteResult {
            upserted: ops.len(),
            ..Default::default()
        })
    }

    #[test]
    fn test_plan_batches_counts_and_offsets() {
        let plan = plan_batches(5, 23);
        assert_eq!(plan.len(), 5);
        let skips: Vec<usize> = plan.iter().map(|t| t.skip).collect();
        assert_eq!(skips, vec![0, 5, 10, 15, 20]);
        assert!(plan.iter().enumerate().all(|(i, t)| t.index == i && t.batch_size == 5));

        assert_eq!(plan_batches(5, 25).len(), 5);
        assert_eq!(plan_batches(5, 0).len(), 0);
        assert_eq!(plan_batches(0, 10).len(), 0);
        assert_eq!(plan_batches(10, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_produce_called_once_per_planned_batch() {
        let (engine, mut rx) = engine(4, 3);
        let skips = Mutex::new(Vec::new());

        let summary = engine
            .process_improvement(
                "batchAccounting",
                10,
                95,
                |task| {
                    skips.lock().unwrap().push(task.skip);
                    async move { Ok(vec![format!("https://site.test/{}", task.skip)]) }
                },
                |url: &String| op(url),
                accept,
            )
            .await;

        let mut skips = skips.into_inner().unwrap();
        skips.sort_unstable();
        assert_eq!(skips, (0..10).map(|i| i * 10).collect::<Vec<_>>());
        assert_eq!(summary.batches_planned, 10);
        assert_eq!(summary.batches_succeeded, 10);
        assert_eq!(summary.written.upserted, 10);

        let events = drain(&mut rx);
        assert!(matches!(
            events.first(),
            Some(ImprovementEvent::Start { method }) if method == "batchAccounting"
        ));
        assert!(matches!(events.last(), Some(ImprovementEvent::End { .. })));
        let processed = events
            .iter()
            .filter(|e| matches!(e, ImprovementEvent::BatchProcessed { .. }))
            .count();
        assert_eq!(processed, 10);
    }

    #[tokio::test]
    async fn test_empty_pages_do_not_end_the_run() {
        let (engine, mut rx) = engine(2, 2);
        let calls = AtomicUsize::new(0);

        let summary = engine
            .process_improvement(
                "sparse",
                1,
                6,
                |task| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if task.index % 2 == 0 {
                            Ok(Vec::new())
                        } else {
                            Ok(vec![task.skip.to_string()])
                        }
                    }
                },
                |s: &String| op(s),
                accept,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(summary.batches_empty, 3);
        assert_eq!(summary.batches_succeeded, 3);

        let processed = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, ImprovementEvent::BatchProcessed { .. }))
            .count();
        assert_eq!(processed, 3);
    }

    #[tokio::test]
    async fn test_failed_batches_are_skipped() {
        let (engine, _rx) = engine(8, 8);
        let written = Mutex::new(Vec::new());

        let summary = engine
            .process_improvement(
                "flaky",
                1,
                5,
                |task| async move {
                    match task.index {
                        1 => Err(TrawlerError::Other("store hiccup".into())),
                        3 => panic!("unexpected page shape"),
                        _ => Ok(vec![task.index.to_string()]),
                    }
                },
                |s: &String| op(s),
                |ops: Arc<[UpsertOp]>| {
                    let reject = ops.iter().any(|o| o.filter == "4");
                    if !reject {
                        written
                            .lock()
                            .unwrap()
                            .extend(ops.iter().map(|o| o.filter.clone()));
                    }
                    async move {
                        if reject {
                            Err(TrawlerError::Other("write rejected".into()))
                        } else {
                            accept(ops).await
                        }
                    }
                },
            )
            .await;

        assert_eq!(summary.batches_succeeded, 2);
        assert_eq!(summary.batches_failed, 3);
        let mut written = written.into_inner().unwrap();
        written.sort();
        assert_eq!(written, vec!["0".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_mapper_may_expand_or_filter() {
        let (engine, mut rx) = engine(1, 10);

        let summary = engine
            .process_improvement(
                "expand",
                2,
                2,
                |_| async { Ok(vec![0usize, 3]) },
                |n: &usize| (0..*n).map(|i| UpsertOp::new(i.to_string(), json!({}))).collect(),
                accept,
            )
            .await;

        assert_eq!(summary.written.upserted, 3);
        let ops_len = drain(&mut rx).into_iter().find_map(|e| match e {
            ImprovementEvent::BatchProcessed { operations, .. } => Some(operations.len()),
            _ => None,
        });
        assert_eq!(ops_len, Some(3));
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let (engine, _rx) = engine(3, 500);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        engine
            .process_improvement(
                "capped",
                1,
                20,
                |task| {
                    let in_flight = &in_flight;
                    let peak = &peak;
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(vec![task.index])
                    }
                },
                |n: &usize| op(&n.to_string()),
                accept,
            )
            .await;

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak {} exceeded limit", peak);
        assert!(peak >= 2);
    }

    #[tokio::test]
    async fn test_windows_complete_before_next_window() {
        let (engine, _rx) = engine(10, 2);
        let started = Mutex::new(Vec::new());
        let finished = Mutex::new(Vec::new());

        engine
            .process_improvement(
                "windowed",
                1,
                4,
                |task| {
                    started
                        .lock()
                        .unwrap()
                        .push((task.index, finished.lock().unwrap().len()));
                    let finished = &finished;
                    async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        finished.lock().unwrap().push(task.index);
                        Ok(vec![task.index])
                    }
                },
                |n: &usize| op(&n.to_string()),
                accept,
            )
            .await;

        for (index, finished_before) in started.into_inner().unwrap() {
            if index >= 2 {
                assert!(finished_before >= 2);
            } else {
                assert_eq!(finished_before, 0);
            }
        }
    }

    #[tokio::test]
    async fn test_cancelled_run_skips_remaining_batches() {
        let (engine, mut rx) = engine(1, 1);
        let token = engine.cancellation_token();
        let calls = AtomicUsize::new(0);

        let summary = engine
            .process_improvement(
                "cancelled",
                1,
                5,
                |task| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if task.index == 1 {
                        token.cancel();
                    }
                    async move { Ok(vec![task.index]) }
                },
                |n: &usize| op(&n.to_string()),
                accept,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(summary.batches_succeeded, 2);
        assert_eq!(summary.batches_cancelled, 3);
        assert!(matches!(drain(&mut rx).last(), Some(ImprovementEvent::End { .. })));
    }

    #[tokio::test]
    async fn test_zero_total_still_emits_lifecycle() {
        let (engine, mut rx) = engine(1, 1);
        let summary = engine
            .process_improvement(
                "nothing",
                5,
                0,
                |_| async { Ok(Vec::<usize>::new()) },
                |n: &usize| op(&n.to_string()),
                accept,
            )
            .await;

        assert_eq!(summary, RunSummary::default());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.method() == "nothing"));
    }
}
