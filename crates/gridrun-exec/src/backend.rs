use std::sync::Arc;

use gridrun_core::Strategy;
use gridrun_model::{BackendKind, RunConfig, TaskTemplate};

use crate::{
    invoke::{Invoker, ProcessInvoker},
    local::LocalPoolStrategy,
    sge::GridEngineStrategy,
    slurm::SlurmStrategy,
};

/// Strategy for `kind` talking to the real scheduler tools.
pub fn build_strategy(kind: BackendKind, template: TaskTemplate, cfg: RunConfig) -> Arc<dyn Strategy> {
    build_strategy_with(kind, template, cfg, Arc::new(ProcessInvoker))
}

/// Strategy for `kind` with scheduler commands routed through `invoker`.
///
/// The local pool runs its tasks directly and ignores the invoker.
pub fn build_strategy_with(
    kind: BackendKind,
    template: TaskTemplate,
    cfg: RunConfig,
    invoker: Arc<dyn Invoker>,
) -> Arc<dyn Strategy> {
    match kind {
        BackendKind::GridEngine => Arc::new(GridEngineStrategy::new(template, cfg, invoker)),
        BackendKind::Slurm => Arc::new(SlurmStrategy::new(template, cfg, invoker)),
        BackendKind::Local => Arc::new(LocalPoolStrategy::new(template, cfg)),
    }
}
