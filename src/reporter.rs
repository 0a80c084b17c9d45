//! Background delivery of visit events.
//!
//! Request handling only ever calls [`VisitReporter::submit`], which is a
//! non-blocking `try_send` onto a bounded queue. A single worker drains the
//! queue and delivers each event on its own task, with the number of
//! in-flight deliveries capped by a semaphore. Delivery failures are logged
//! and dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::api::AgentsApi;
use crate::visit::VisitEvent;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

#[derive(Clone, Copy, Debug)]
pub struct ReporterOptions {
    /// Events buffered before new ones are dropped.
    pub queue_capacity: usize,
    /// Concurrent outbound deliveries.
    pub max_in_flight: usize,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Handle used by the interceptor to hand off visit events.
#[derive(Clone, Debug)]
pub struct VisitReporter {
    tx: mpsc::Sender<VisitEvent>,
}

impl VisitReporter {
    /// Start the delivery worker on the current runtime.
    ///
    /// The worker exits once every `VisitReporter` clone has been dropped and
    /// the queue is drained.
    pub fn spawn(api: Arc<dyn AgentsApi>, options: ReporterOptions) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let limit = Arc::new(Semaphore::new(options.max_in_flight.max(1)));
        let handle = tokio::spawn(run_worker(rx, api, limit));
        (Self { tx }, handle)
    }

    /// Queue `event` for delivery without waiting. Returns false if the event
    /// was dropped.
    pub fn submit(&self, event: VisitEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    path = %event.request_path,
                    "visit report queue full, dropping event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("visit reporter stopped, dropping event");
                false
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<VisitEvent>,
    api: Arc<dyn AgentsApi>,
    limit: Arc<Semaphore>,
) {
    while let Some(event) = rx.recv().await {
        let permit = match limit.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => break,
        };
        let api = api.clone();
        tokio::spawn(async move {
            let _permit = permit;
            deliver(api.as_ref(), &event).await;
        });
    }
    tracing::debug!("visit reporter worker exiting");
}

async fn deliver(api: &dyn AgentsApi, event: &VisitEvent) {
    match api.record_visit(event).await {
        Ok(status) => {
            tracing::debug!(status, path = %event.request_path, "visit event sent");
        }
        Err(err) => {
            tracing::warn!(error = %err, path = %event.request_path, "error sending visit event");
        }
    }
}
