//! Background run dispatcher
//!
//! Accepted simulations are handed to a single reaper task that owns a
//! [`JoinSet`] of lifecycle runs. The reaper observes every run as it
//! finishes and logs the outcome, so faults in background work are never
//! dropped silently. A run that panics is converted into a `failed` record
//! on a best-effort basis.
//!
//! There is no concurrency cap: every dispatched simulation starts its
//! solver immediately.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use cavity_core::domain::simulation::{SimulationParams, SimulationStatus};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, error, info, info_span};

use crate::lifecycle::{LifecycleController, LifecycleError};

#[derive(Debug, Error)]
#[error("dispatcher is shut down; simulation {0} was not started")]
pub struct DispatchError(pub i64);

enum Message {
    Run { id: i64, params: SimulationParams },
    Shutdown,
}

type RunResult = (i64, Result<SimulationStatus, LifecycleError>);

pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Message>,
    reaper: Mutex<Option<JoinHandle<()>>>,
    active: Arc<AtomicUsize>,
}

impl Dispatcher {
    /// Starts the reaper task on the current runtime
    pub fn start(controller: Arc<LifecycleController>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicUsize::new(0));
        let reaper = tokio::spawn(reap(rx, controller, Arc::clone(&active)));

        Self {
            tx,
            reaper: Mutex::new(Some(reaper)),
            active,
        }
    }

    /// Queues a simulation run without waiting for it
    pub fn dispatch(&self, id: i64, params: SimulationParams) -> Result<(), DispatchError> {
        self.active.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(Message::Run { id, params }).is_err() {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return Err(DispatchError(id));
        }
        debug!("Simulation {} dispatched", id);
        Ok(())
    }

    /// Number of runs dispatched but not yet finished
    pub fn active_runs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Stops accepting runs and waits for the ones already dispatched
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);

        let reaper = self
            .reaper
            .lock()
            .map(|mut guard| guard.take())
            .unwrap_or_default();

        if let Some(reaper) = reaper {
            if let Err(e) = reaper.await {
                error!("Dispatcher reaper task failed: {}", e);
            }
        }
    }
}

async fn reap(
    mut rx: mpsc::UnboundedReceiver<Message>,
    controller: Arc<LifecycleController>,
    active: Arc<AtomicUsize>,
) {
    let mut runs: JoinSet<RunResult> = JoinSet::new();
    let mut accepting = true;

    loop {
        tokio::select! {
            message = rx.recv(), if accepting => match message {
                Some(Message::Run { id, params }) => {
                    runs.spawn(supervise_run(Arc::clone(&controller), id, params));
                }
                Some(Message::Shutdown) | None => {
                    accepting = false;
                    rx.close();
                    // Runs queued before the shutdown request still execute
                    while let Ok(message) = rx.try_recv() {
                        if let Message::Run { id, params } = message {
                            runs.spawn(supervise_run(Arc::clone(&controller), id, params));
                        }
                    }
                    info!("Dispatcher draining {} simulation run(s)", runs.len());
                }
            },
            Some(joined) = runs.join_next(), if !runs.is_empty() => {
                active.fetch_sub(1, Ordering::SeqCst);
                log_outcome(joined);
            }
            else => break,
        }
    }

    debug!("Dispatcher reaper stopped");
}

/// Runs the controller in its own task so a panic can still be recorded
async fn supervise_run(
    controller: Arc<LifecycleController>,
    id: i64,
    params: SimulationParams,
) -> RunResult {
    let span = info_span!("simulation", id);
    let worker = Arc::clone(&controller);
    let handle = tokio::spawn(async move { worker.run(id, params).await }.instrument(span.clone()));

    let result = match handle.await {
        Ok(result) => result,
        Err(e) => {
            error!("Simulation {} run aborted: {}", id, e);
            controller
                .record_failure(id, format!("Simulation run aborted: {}", e))
                .instrument(span)
                .await
        }
    };

    (id, result)
}

fn log_outcome(joined: Result<RunResult, tokio::task::JoinError>) {
    match joined {
        Ok((id, Ok(status))) => info!("Simulation {} finished as {}", id, status),
        Ok((id, Err(e))) => error!("Simulation {} left unresolved: {}", id, e),
        Err(e) => error!("Simulation supervision task failed: {}", e),
    }
}
