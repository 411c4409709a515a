//! Sequential workflow engine (C11, spec §4.11): a bounded worker pool
//! pulling from a shared ordered queue, grounded on the teacher's
//! `WorkerPool`/`Worker` split (N workers sharing one queue, each guarded
//! by a semaphore-style concurrency cap) but run in-process over
//! `tokio::sync::Mutex` rather than a Redis-backed `JobQueue` — the spec's
//! non-goals exclude distributed execution, so the external queue is
//! dropped in favor of an in-memory one.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use legacy_artifacts::ArtifactStore;
use legacy_types::analysis::{Checkpoint, Counts, PageResult};
use legacy_types::error::CheckpointError;
use legacy_types::progress::{EtaEstimator, PageState, ProgressEvent, WorkflowState};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::control::WorkflowControl;
use crate::processor::PageProcessor;

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub workflow_id: String,
    pub max_concurrent_sessions: usize,
    pub max_retries_per_page: u32,
    pub enable_checkpointing: bool,
    pub retry_failed_on_resume: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            workflow_id: Uuid::new_v4().to_string(),
            max_concurrent_sessions: 3,
            max_retries_per_page: 1,
            enable_checkpointing: true,
            retry_failed_on_resume: false,
        }
    }
}

/// One page's entry in the ordered work list, as handed in by C12's
/// priority selection.
#[derive(Debug, Clone)]
pub struct PageEntry {
    pub page_id: String,
    pub url: String,
}

struct Shared {
    queue: Mutex<VecDeque<PageEntry>>,
    completed: Mutex<Vec<String>>,
    failed: Mutex<Vec<String>>,
    skipped: Mutex<Vec<String>>,
    results: Mutex<Vec<PageResult>>,
    eta: Mutex<EtaEstimator>,
    retry_counts: Mutex<std::collections::HashMap<String, u32>>,
    total: usize,
}

pub struct WorkflowEngine<P: PageProcessor> {
    processor: Arc<P>,
    artifacts: Option<Arc<ArtifactStore>>,
    control: WorkflowControl,
    options: WorkflowOptions,
    progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl<P: PageProcessor + 'static> WorkflowEngine<P> {
    pub fn new(processor: Arc<P>, options: WorkflowOptions) -> Self {
        Self {
            processor,
            artifacts: None,
            control: WorkflowControl::new(),
            options,
            progress_tx: None,
        }
    }

    pub fn with_artifacts(mut self, artifacts: Arc<ArtifactStore>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn with_progress_channel(mut self, tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn control(&self) -> WorkflowControl {
        self.control.clone()
    }

    /// Applies a prior checkpoint: completed and skipped pages are dropped
    /// from the work list outright; failed pages are re-queued only if
    /// `retry_failed_on_resume` is set (spec §4.11 resume semantics).
    fn apply_checkpoint(&self, pages: Vec<PageEntry>, checkpoint: &Checkpoint) -> Vec<PageEntry> {
        pages
            .into_iter()
            .filter(|p| {
                if checkpoint.completed_pages.contains(&p.page_id)
                    || checkpoint.skipped_pages.contains(&p.page_id)
                {
                    return false;
                }
                if checkpoint.failed_pages.contains(&p.page_id) {
                    return self.options.retry_failed_on_resume;
                }
                true
            })
            .collect()
    }

    /// Runs the workflow to completion (or until `stop()` is called on the
    /// returned control handle). Pages are processed in the order given;
    /// up to `max_concurrent_sessions` run at once.
    #[instrument(skip(self, pages, resume_from), fields(workflow_id = %self.options.workflow_id))]
    pub async fn run(
        &self,
        pages: Vec<PageEntry>,
        resume_from: Option<Checkpoint>,
    ) -> Result<Vec<PageResult>, CheckpointError> {
        let pages = match &resume_from {
            Some(checkpoint) => self.apply_checkpoint(pages, checkpoint),
            None => pages,
        };

        let shared = Arc::new(Shared {
            total: pages.len(),
            queue: Mutex::new(pages.into_iter().collect()),
            completed: Mutex::new(Vec::new()),
            failed: Mutex::new(Vec::new()),
            skipped: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
            eta: Mutex::new(EtaEstimator::new(0.3)),
            retry_counts: Mutex::new(std::collections::HashMap::new()),
        });

        self.control.start();

        let mut workers = tokio::task::JoinSet::new();
        for _ in 0..self.options.max_concurrent_sessions.max(1) {
            let shared = shared.clone();
            let processor = self.processor.clone();
            let control = self.control.clone();
            let artifacts = self.artifacts.clone();
            let progress_tx = self.progress_tx.clone();
            let options = self.options.clone();
            workers.spawn(async move {
                worker_loop(shared, processor, control, artifacts, progress_tx, options).await;
            });
        }

        while workers.join_next().await.is_some() {}

        if matches!(self.control.state(), WorkflowState::Stopped) {
            info!("workflow stopped before completion");
        } else {
            self.control.complete();
        }

        let shared = Arc::try_unwrap(shared)
            .unwrap_or_else(|_| panic!("all workers joined, shared state must be uniquely owned"));
        Ok(shared.results.into_inner())
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop<P: PageProcessor>(
    shared: Arc<Shared>,
    processor: Arc<P>,
    control: WorkflowControl,
    artifacts: Option<Arc<ArtifactStore>>,
    progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    options: WorkflowOptions,
) {
    loop {
        if matches!(control.state(), WorkflowState::Stopped) {
            return;
        }
        control.wait_while_paused().await;
        if matches!(control.state(), WorkflowState::Stopped) {
            return;
        }

        let entry = {
            let mut queue = shared.queue.lock().await;
            queue.pop_front()
        };

        let Some(entry) = entry else {
            return;
        };

        if control.is_skipped(&entry.url).await {
            shared.skipped.lock().await.push(entry.page_id.clone());
            emit_progress(
                &shared,
                &progress_tx,
                &options.workflow_id,
                &entry.url,
                PageState::Queued,
                PageState::Skipped,
            )
            .await;
            continue;
        }

        let started = std::time::Instant::now();
        let mut result = processor.process(&entry.page_id, &entry.url).await;

        let mut retries = 0;
        while result.failed() && retries < options.max_retries_per_page {
            retries += 1;
            shared
                .retry_counts
                .lock()
                .await
                .insert(entry.page_id.clone(), retries);
            result = processor.process(&entry.page_id, &entry.url).await;
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        shared.eta.lock().await.observe(elapsed_ms);

        let to_state = if result.failed() {
            shared.failed.lock().await.push(entry.page_id.clone());
            PageState::Step1Failed
        } else {
            shared.completed.lock().await.push(entry.page_id.clone());
            PageState::Completed
        };

        if let Some(store) = &artifacts {
            if options.enable_checkpointing {
                if let Err(err) = persist_checkpoint(&shared, store, &options.workflow_id).await {
                    warn!(error = %err, "failed to persist checkpoint");
                }
            }
        }

        shared.results.lock().await.push(result);

        emit_progress(
            &shared,
            &progress_tx,
            &options.workflow_id,
            &entry.url,
            PageState::Running,
            to_state,
        )
        .await;
    }
}

async fn persist_checkpoint(
    shared: &Shared,
    store: &ArtifactStore,
    workflow_id: &str,
) -> Result<(), CheckpointError> {
    let pending: Vec<String> = shared
        .queue
        .lock()
        .await
        .iter()
        .map(|e| e.page_id.clone())
        .collect();
    let checkpoint = Checkpoint {
        workflow_id: workflow_id.to_string(),
        created_at: Utc::now(),
        completed_pages: shared.completed.lock().await.clone(),
        pending_pages: pending,
        failed_pages: shared.failed.lock().await.clone(),
        skipped_pages: shared.skipped.lock().await.clone(),
        resume_token: Uuid::new_v4().to_string(),
    };
    store
        .write_checkpoint(&checkpoint)
        .await
        .map_err(|e| CheckpointError::WriteFailed {
            workflow_id: workflow_id.to_string(),
            message: e.to_string(),
        })
}

async fn emit_progress(
    shared: &Shared,
    progress_tx: &Option<mpsc::UnboundedSender<ProgressEvent>>,
    workflow_id: &str,
    page_url: &str,
    from_state: PageState,
    to_state: PageState,
) {
    let Some(tx) = progress_tx else { return };

    let completed = shared.completed.lock().await.len();
    let failed = shared.failed.lock().await.len();
    let skipped = shared.skipped.lock().await.len();
    let pending = shared.queue.lock().await.len();
    let running = shared
        .total
        .saturating_sub(completed + failed + skipped + pending);

    let counts = Counts {
        total: shared.total,
        completed,
        failed,
        skipped,
        pending,
        running,
    };
    let eta_ms = shared.eta.lock().await.eta_ms(pending);

    let event = ProgressEvent {
        ts: Utc::now(),
        workflow_id: workflow_id.to_string(),
        page_url: page_url.to_string(),
        from_state,
        to_state,
        counts,
        eta_ms,
    };
    let _ = tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legacy_types::analysis::StepOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct AlwaysSucceeds;

    #[async_trait]
    impl PageProcessor for AlwaysSucceeds {
        async fn process(&self, page_id: &str, url: &str) -> PageResult {
            PageResult {
                page_id: page_id.to_string(),
                url: url.to_string(),
                snapshot_ref: None,
                step1: StepOutcome::Skipped,
                step2: StepOutcome::Skipped,
                errors: vec![],
                processing_time_ms: 1,
            }
        }
    }

    struct FailsNTimesThenSucceeds {
        calls: AtomicUsize,
        fail_times: usize,
    }

    #[async_trait]
    impl PageProcessor for FailsNTimesThenSucceeds {
        async fn process(&self, page_id: &str, url: &str) -> PageResult {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                PageResult {
                    page_id: page_id.to_string(),
                    url: url.to_string(),
                    snapshot_ref: None,
                    step1: StepOutcome::Failed {
                        reason: "boom".to_string(),
                    },
                    step2: StepOutcome::Skipped,
                    errors: vec![],
                    processing_time_ms: 1,
                }
            } else {
                PageResult {
                    page_id: page_id.to_string(),
                    url: url.to_string(),
                    snapshot_ref: None,
                    step1: StepOutcome::Ok(legacy_types::analysis::ContentSummary {
                        id: Uuid::new_v4(),
                        purpose: "p".to_string(),
                        user_context: "u".to_string(),
                        business_logic: "b".to_string(),
                        navigation_role: "n".to_string(),
                        business_importance: 0.5,
                        confidence: 0.5,
                        workflows: vec![],
                        journey_stage: legacy_types::analysis::JourneyStage::Middle,
                        keywords: vec![],
                        quality: Default::default(),
                    }),
                    step2: StepOutcome::Skipped,
                    errors: vec![],
                    processing_time_ms: 1,
                }
            }
        }
    }

    fn entries(n: usize) -> Vec<PageEntry> {
        (0..n)
            .map(|i| PageEntry {
                page_id: format!("p{i}"),
                url: format!("https://example.com/{i}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn processes_all_pages_to_completion() {
        let engine = WorkflowEngine::new(
            Arc::new(AlwaysSucceeds),
            WorkflowOptions {
                max_concurrent_sessions: 2,
                enable_checkpointing: false,
                ..Default::default()
            },
        );

        let results = engine.run(entries(5), None).await.unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(engine.control().state(), WorkflowState::Completed);
    }

    #[tokio::test]
    async fn retries_failed_page_up_to_max_retries() {
        let engine = WorkflowEngine::new(
            Arc::new(FailsNTimesThenSucceeds {
                calls: AtomicUsize::new(0),
                fail_times: 1,
            }),
            WorkflowOptions {
                max_concurrent_sessions: 1,
                max_retries_per_page: 1,
                enable_checkpointing: false,
                ..Default::default()
            },
        );

        let results = engine.run(entries(1), None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].completed());
    }

    #[tokio::test]
    async fn skipped_page_is_excluded_from_processing() {
        let engine = WorkflowEngine::new(
            Arc::new(AlwaysSucceeds),
            WorkflowOptions {
                max_concurrent_sessions: 1,
                enable_checkpointing: false,
                ..Default::default()
            },
        );
        engine.control().skip("https://example.com/1").await;

        let results = engine.run(entries(3), None).await.unwrap();
        // The skipped page never reaches the processor, so it produces no
        // PageResult; only the two non-skipped pages do.
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn resume_skips_already_completed_pages() {
        let dir = tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let engine = WorkflowEngine::new(
            Arc::new(AlwaysSucceeds),
            WorkflowOptions {
                max_concurrent_sessions: 1,
                enable_checkpointing: true,
                ..Default::default()
            },
        )
        .with_artifacts(store);

        let checkpoint = Checkpoint {
            workflow_id: "wf".to_string(),
            created_at: Utc::now(),
            completed_pages: vec!["p0".to_string()],
            pending_pages: vec!["p1".to_string(), "p2".to_string()],
            failed_pages: vec![],
            skipped_pages: vec![],
            resume_token: "tok".to_string(),
        };

        let results = engine.run(entries(3), Some(checkpoint)).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
