use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of one task inside an array job.
///
/// A single-task array is labelled `single` instead of `1` when it is submitted
/// as its own job, but its command still sees task number `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskIndex {
    Numbered(u32),
    Single,
}

impl TaskIndex {
    /// Index for task `n` of an array with `num_tasks` tasks.
    pub fn for_task(n: u32, num_tasks: u32) -> Self {
        if num_tasks == 1 {
            TaskIndex::Single
        } else {
            TaskIndex::Numbered(n)
        }
    }

    /// Task number substituted into the command (`%t`).
    pub fn number(&self) -> u32 {
        match self {
            TaskIndex::Numbered(n) => *n,
            TaskIndex::Single => 1,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, TaskIndex::Single)
    }
}

impl fmt::Display for TaskIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskIndex::Numbered(n) => write!(f, "{n}"),
            TaskIndex::Single => f.write_str("single"),
        }
    }
}
