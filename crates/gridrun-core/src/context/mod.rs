//! Run context and signal routing.
//!
//! The context owns the active strategy for the duration of a run. SIGINT and
//! SIGTERM are routed to [`Strategy::cancel`] on that strategy; nothing is
//! looked up through process-wide state.
use std::{future::Future, sync::Arc};

use gridrun_model::RunStatus;
use tracing::{debug, info, warn};

use crate::{error::CoreError, strategy::Strategy};

pub struct RunContext {
    strategy: Arc<dyn Strategy>,
}

impl RunContext {
    pub fn new(strategy: Arc<dyn Strategy>) -> Self {
        Self { strategy }
    }

    /// Run the strategy, cancelling it on SIGINT or SIGTERM.
    pub async fn run_until_signal(&self) -> Result<RunStatus, CoreError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run the strategy, cancelling it once `shutdown` completes.
    ///
    /// After cancellation the run is awaited to completion and always reported
    /// as [`RunStatus::Cancelled`]; errors raised while winding down are logged.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunStatus, CoreError>
    where
        F: Future<Output = ()>,
    {
        let mut run = self.strategy.run();

        tokio::select! {
            res = &mut run => res,
            _ = shutdown => {
                info!(target: "gridrun.core.context", backend = self.strategy.name(), "signal received; cancelling jobs");
                self.strategy.cancel().await;

                match run.await {
                    Ok(status) => debug!(target: "gridrun.core.context", ?status, "run stopped after cancel"),
                    Err(e) => warn!(target: "gridrun.core.context", error = %e, "run failed while cancelling"),
                }
                info!(target: "gridrun.core.context", "jobs are cancelled");
                Ok(RunStatus::Cancelled)
            }
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(target: "gridrun.core.context", error = %e, "cannot install SIGTERM handler");
            return ctrl_c_only().await;
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(target: "gridrun.core.context", error = %e, "cannot install SIGINT handler");
                term.recv().await;
            }
        }
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c_only().await
}

async fn ctrl_c_only() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(target: "gridrun.core.context", error = %e, "cannot install SIGINT handler");
        std::future::pending::<()>().await;
    }
}
