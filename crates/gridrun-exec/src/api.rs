//! Entry points for callers that just want a command run as a task array.
use gridrun_core::{CoreError, RunContext, host_identity, prepare_template, resolve_backend};
use gridrun_model::{BackendKind, ConfigOverrides, RunConfig, RunStatus};
use tracing::{debug, info};

use crate::backend::build_strategy;

/// Run `command` as a task array with `overrides` applied to the defaults.
///
/// The backend follows the host name. SIGINT and SIGTERM cancel the run.
///
/// ```no_run
/// # async fn demo() -> Result<(), gridrun_core::CoreError> {
/// let status = gridrun_exec::submit_job(vec!["./align".into(), "%t".into()], 8u32).await?;
/// std::process::exit(status.exit_code());
/// # }
/// ```
pub async fn submit_job(
    command: Vec<String>,
    overrides: impl Into<ConfigOverrides>,
) -> Result<RunStatus, CoreError> {
    let cfg = overrides.into().resolve(RunConfig::default())?;
    run_job(command, cfg, None).await
}

/// Run `command` under a resolved configuration.
///
/// `backend` bypasses host detection when set.
pub async fn run_job(
    command: Vec<String>,
    cfg: RunConfig,
    backend: Option<BackendKind>,
) -> Result<RunStatus, CoreError> {
    cfg.validate()?;
    let template = prepare_template(command, &cfg)?;

    let host = host_identity();
    let kind = resolve_backend(backend, &host);
    debug!(target: "gridrun.exec", %host, backend = kind.kind(), ?cfg, "resolved run");

    let ctx = RunContext::new(build_strategy(kind, template, cfg));
    let status = ctx.run_until_signal().await?;
    info!(target: "gridrun.exec", backend = kind.kind(), ?status, "run finished");
    Ok(status)
}
