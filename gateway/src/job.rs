//! Analysis job controller: single-job exclusion, status snapshots and
//! supervised cancellation.
//!
//! The status structure has one logical writer (the running pipeline) and
//! any number of readers; snapshots are published whole through a watch
//! channel so a reader never observes a partially updated status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use conjunction_screening::{CancelToken, ConjunctionEvent, ScreeningReport, ScreeningStats};

use crate::config::GatewayConfig;
use crate::pipeline::{self, PipelineOutcome};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JobError {
    #[error("Analysis is already running")]
    AlreadyRunning,
    #[error("No analysis is running")]
    NotRunning,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    Stopping,
    Completed,
    Failed,
    Stopped,
}

/// One whole status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatus {
    pub state: JobState,
    pub is_running: bool,
    /// 0..=100, monotonically non-decreasing while a run is in flight.
    pub progress: u8,
    pub message: String,
    pub run_id: Option<Uuid>,
}

impl JobStatus {
    fn idle() -> Self {
        Self {
            state: JobState::Idle,
            is_running: false,
            progress: 0,
            message: "No analysis has run yet".to_string(),
            run_id: None,
        }
    }
}

/// Write half of the status channel, scoped to one run.
#[derive(Clone)]
pub struct StatusPublisher {
    tx: watch::Sender<JobStatus>,
    run_id: Uuid,
}

impl StatusPublisher {
    pub fn publish(&self, state: JobState, progress: u8, message: impl Into<String>) {
        let current = self.tx.borrow().clone();

        // Progress never regresses within a running job; terminal states may
        // reset it (a stop reports 0).
        let progress = if state == JobState::Running
            && current.state == JobState::Running
            && current.run_id == Some(self.run_id)
        {
            progress.max(current.progress)
        } else {
            progress
        };

        self.tx.send_replace(JobStatus {
            state,
            is_running: matches!(state, JobState::Running | JobState::Stopping),
            progress,
            message: message.into(),
            run_id: Some(self.run_id),
        });
    }

    pub fn progress(&self) -> u8 {
        self.tx.borrow().progress
    }
}

/// Everything `get_results` exposes; zeroed when no run has completed yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub completed: bool,
    pub incomplete: bool,
    pub generated_at: Option<DateTime<Utc>>,
    pub stats: ScreeningStats,
    pub events: Vec<ConjunctionEvent>,
}

struct WorkerHandle {
    run_id: Uuid,
    cancel: CancelToken,
    task: JoinHandle<()>,
}

/// Owns the single analysis job.
pub struct JobController {
    config: GatewayConfig,
    status_tx: watch::Sender<JobStatus>,
    results: RwLock<Option<ScreeningReport>>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl JobController {
    pub fn new(config: GatewayConfig) -> Arc<Self> {
        let (status_tx, _) = watch::channel(JobStatus::idle());
        Arc::new(Self {
            config,
            status_tx,
            results: RwLock::new(None),
            worker: Mutex::new(None),
        })
    }

    /// Launch the screening pipeline. Exactly one job may run at a time;
    /// a second `start` returns [`JobError::AlreadyRunning`] with no side
    /// effects.
    pub async fn start(self: &Arc<Self>) -> Result<Uuid, JobError> {
        let mut slot = self.worker.lock().await;
        if let Some(handle) = slot.as_ref() {
            if !handle.task.is_finished() {
                return Err(JobError::AlreadyRunning);
            }
        }

        let run_id = Uuid::new_v4();
        let cancel = CancelToken::new();
        let publisher = StatusPublisher {
            tx: self.status_tx.clone(),
            run_id,
        };

        info!("Starting analysis run {}", run_id);
        publisher.publish(JobState::Running, 0, "Starting analysis");

        let controller = Arc::clone(self);
        let worker_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            match pipeline::run(&controller.config, &publisher, &worker_cancel).await {
                Ok(PipelineOutcome::Finished(report)) => {
                    *controller.results.write().await = Some(report);
                    publisher.publish(JobState::Completed, 100, "Analysis complete");
                }
                Ok(PipelineOutcome::Cancelled(report)) => {
                    if let Some(report) = report {
                        *controller.results.write().await = Some(report);
                    }
                    publisher.publish(JobState::Stopped, 0, "Analysis stopped by user");
                }
                Err(e) => {
                    error!("Analysis run failed: {e}");
                    let progress = publisher.progress();
                    publisher.publish(JobState::Failed, progress, format!("Analysis failed: {e}"));
                }
            }
        });

        *slot = Some(WorkerHandle {
            run_id,
            cancel,
            task,
        });
        Ok(run_id)
    }

    /// Cooperatively cancel the running job; abort its task if it does not
    /// yield within the configured grace period. Only the worker is torn
    /// down — never the process.
    pub async fn stop(&self) -> Result<(), JobError> {
        let mut slot = self.worker.lock().await;
        let handle = match slot.take() {
            Some(handle) if !handle.task.is_finished() => handle,
            other => {
                *slot = other;
                return Err(JobError::NotRunning);
            }
        };

        info!("Stop requested for run {}", handle.run_id);
        let publisher = StatusPublisher {
            tx: self.status_tx.clone(),
            run_id: handle.run_id,
        };
        let progress = publisher.progress();
        publisher.publish(JobState::Stopping, progress, "Stopping analysis");
        handle.cancel.cancel();

        let mut task = handle.task;
        match tokio::time::timeout(self.config.stop_grace, &mut task).await {
            Ok(_) => {
                // The worker observed the token and published its own
                // terminal state.
            }
            Err(_) => {
                warn!(
                    "Run {} did not yield within {:?}; aborting its task",
                    handle.run_id, self.config.stop_grace
                );
                task.abort();
                let _ = task.await;
                publisher.publish(JobState::Stopped, 0, "Analysis stopped (worker aborted)");
            }
        }

        Ok(())
    }

    /// Idempotent snapshot read.
    pub fn status(&self) -> JobStatus {
        self.status_tx.borrow().clone()
    }

    pub async fn results(&self) -> ResultsResponse {
        match self.results.read().await.as_ref() {
            Some(report) => ResultsResponse {
                completed: true,
                incomplete: report.incomplete,
                generated_at: Some(report.generated_at),
                stats: report.stats.clone(),
                events: report.events.clone(),
            },
            None => ResultsResponse {
                completed: false,
                incomplete: false,
                generated_at: None,
                stats: ScreeningStats::default(),
                events: Vec::new(),
            },
        }
    }
}
