mod error;
pub use error::{ExecError, ExecResult};

mod util;

pub mod invoke;
pub use invoke::{Invoker, ProcessInvoker};

pub mod sge;
pub use sge::GridEngineStrategy;

pub mod slurm;
pub use slurm::SlurmStrategy;

pub mod local;
pub use local::LocalPoolStrategy;

mod backend;
pub use backend::{build_strategy, build_strategy_with};

mod api;
pub use api::{run_job, submit_job};

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::{build_strategy, run_job, submit_job};
    pub use crate::{GridEngineStrategy, LocalPoolStrategy, SlurmStrategy};
}
