//! Execution strategy contract.
//!
//! Every backend drives the full submit, monitor, retry and report cycle of one
//! run behind this trait. The closed set of implementations lives in `gridrun-exec`.
use async_trait::async_trait;

use gridrun_model::RunStatus;

use crate::error::CoreError;

#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Run every task to a terminal state.
    ///
    /// Returns [`RunStatus::Cancelled`] once [`Strategy::cancel`] has been called.
    async fn run(&self) -> Result<RunStatus, CoreError>;

    /// Terminate outstanding work.
    ///
    /// Idempotent and safe to call while [`Strategy::run`] is in progress.
    /// Failures while terminating are logged, never returned.
    async fn cancel(&self);
}
