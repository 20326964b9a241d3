//! Process exit codes and well-known defaults.
//!
//! Exit codes are part of the command-line contract and are shared by every backend.

/// Every task finished successfully.
pub const EXIT_SUCCESS: i32 = 0;
/// At least one task failed permanently.
pub const EXIT_TASK_FAILED: i32 = 1;
/// The run was rejected before anything was submitted.
pub const EXIT_CONFIG_ERROR: i32 = 10;
/// The run was interrupted and outstanding work was cancelled.
pub const EXIT_CANCELLED: i32 = 255;

/// Default stdout path pattern.
pub const DEFAULT_STDOUT_PATTERN: &str = "%c.o%j.%t";
/// Default stderr path pattern.
pub const DEFAULT_STDERR_PATTERN: &str = "%c.e%j.%t";

/// File name of the per-user node denylist, looked up in `$HOME`.
pub const DENYLIST_FILE_NAME: &str = ".bad_node_list";
