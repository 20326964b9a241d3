use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Closed set of execution backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    /// Grid-engine cluster; one synchronous array submission (`qsub -sync y`).
    GridEngine,
    /// Slurm cluster; one job per task, polled and retried.
    Slurm,
    /// Local subprocesses on a bounded worker pool.
    Local,
}

impl BackendKind {
    /// Short symbolic name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendKind::GridEngine => "sge",
            BackendKind::Slurm => "slurm",
            BackendKind::Local => "local",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "sge" | "gridengine" | "grid-engine" => Ok(BackendKind::GridEngine),
            "slurm" => Ok(BackendKind::Slurm),
            "local" => Ok(BackendKind::Local),
            _ => Err(ModelError::UnknownBackend(s.to_string())),
        }
    }
}
