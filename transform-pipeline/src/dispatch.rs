use std::future::Future;

use common::error::AppError;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

/// A detached job that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub label: String,
    pub message: String,
}

/// Runs jobs off the request path. Callers never observe the job's result; failures
/// are logged and, when a channel is attached, forwarded to it.
#[derive(Clone, Default)]
pub struct BackgroundDispatcher {
    tracker: TaskTracker,
    failures: Option<mpsc::UnboundedSender<DispatchFailure>>,
}

impl BackgroundDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_channel() -> (Self, mpsc::UnboundedReceiver<DispatchFailure>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tracker: TaskTracker::new(),
                failures: Some(tx),
            },
            rx,
        )
    }

    /// Returns `false` and drops `job` once the dispatcher has been shut down.
    pub fn run_detached<F>(&self, label: impl Into<String>, job: F) -> bool
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let label = label.into();
        if self.tracker.is_closed() {
            warn!(label = %label, "dispatcher shut down; dropping detached job");
            return false;
        }
        let failures = self.failures.clone();

        self.tracker.spawn(async move {
            // Inner spawn so a panicking job surfaces as a JoinError instead of unwinding here.
            let outcome = match tokio::spawn(job).await {
                Ok(Ok(())) => {
                    debug!(label = %label, "detached job finished");
                    return;
                }
                Ok(Err(err)) => {
                    warn!(label = %label, error = %err, "detached job failed");
                    err.to_string()
                }
                Err(join_err) => {
                    error!(label = %label, error = %join_err, "detached job panicked");
                    join_err.to_string()
                }
            };

            if let Some(tx) = failures {
                if tx
                    .send(DispatchFailure {
                        label,
                        message: outcome,
                    })
                    .is_err()
                {
                    debug!("failure channel closed");
                }
            }
        });
        true
    }

    /// Number of jobs still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting work and waits for running jobs.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
