use serde::{Deserialize, Serialize};

use crate::{EXIT_CANCELLED, EXIT_SUCCESS, EXIT_TASK_FAILED};

/// Aggregate outcome of one run.
///
/// There is no partial success: individual task failures are only visible in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    /// Every task reached a successful terminal state.
    Succeeded,
    /// At least one task failed permanently.
    Failed,
    /// The run was interrupted and outstanding work was cancelled.
    Cancelled,
}

impl RunStatus {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Succeeded => EXIT_SUCCESS,
            RunStatus::Failed => EXIT_TASK_FAILED,
            RunStatus::Cancelled => EXIT_CANCELLED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_eq!(RunStatus::Succeeded.exit_code(), 0);
        assert_eq!(RunStatus::Failed.exit_code(), 1);
        assert_eq!(RunStatus::Cancelled.exit_code(), 255);
    }

    #[test]
    fn only_succeeded_is_success() {
        assert!(RunStatus::Succeeded.is_success());
        assert!(!RunStatus::Failed.is_success());
        assert!(!RunStatus::Cancelled.is_success());
    }
}
