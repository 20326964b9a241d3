mod constants;
pub use constants::*;

mod time_limit;
pub use time_limit::TimeLimit;

mod task_index;
pub use task_index::TaskIndex;

mod run_status;
pub use run_status::RunStatus;

mod backend_kind;
pub use backend_kind::BackendKind;

/// Identifier assigned to a submitted job by the external batch system.
pub type JobId = String;
