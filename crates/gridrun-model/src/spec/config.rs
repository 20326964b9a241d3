use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_STDERR_PATTERN, DEFAULT_STDOUT_PATTERN, DENYLIST_FILE_NAME, ModelError, TimeLimit};

/// Canonical configuration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    /// Number of tasks in the array (>= 1).
    pub num_tasks: u32,
    /// Wall-clock limit of one task.
    pub time_limit: TimeLimit,
    /// Memory limit of one task in MB.
    pub mem_limit_mb: u64,
    pub stdout_pattern: String,
    pub stderr_pattern: String,
    /// Niceness; a higher value runs later.
    pub priority: i32,
    /// Queue or partition.
    ///
    /// Slurm ignores values starting with `-` (grid-engine style flags).
    pub queue: String,
    /// Local worker count. Non-positive values keep `|cores|` execution units free.
    pub cores: i32,
    /// Nodes per Slurm job.
    pub nodes: u32,
    /// Retry budget per task (polling backend).
    pub retries: u32,
    /// Comma separated node names to exclude.
    pub exclude_nodes: String,
    /// Node denylist file; `$HOME/.bad_node_list` when unset.
    pub denylist: Option<PathBuf>,
    pub verbosity: u8,
    pub pacing: PacingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_tasks: 1,
            time_limit: TimeLimit::default(),
            mem_limit_mb: 100,
            stdout_pattern: DEFAULT_STDOUT_PATTERN.to_string(),
            stderr_pattern: DEFAULT_STDERR_PATTERN.to_string(),
            priority: 0,
            queue: "-soft -q helli.q".to_string(),
            cores: -1,
            nodes: 1,
            retries: 3,
            exclude_nodes: String::new(),
            denylist: None,
            verbosity: 0,
            pacing: PacingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Check invariants that serde and the override layer cannot express.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.num_tasks == 0 {
            return Err(ModelError::NoTasks);
        }
        Ok(())
    }

    /// Effective denylist path, if any can be determined.
    pub fn denylist_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.denylist {
            return Some(path.clone());
        }
        std::env::var_os("HOME").map(|home| Path::new(&home).join(DENYLIST_FILE_NAME))
    }

    /// Explicit partition, if the queue names one.
    pub fn partition(&self) -> Option<&str> {
        let queue = self.queue.trim();
        if queue.is_empty() || queue.starts_with('-') {
            None
        } else {
            Some(queue)
        }
    }
}

/// Timing knobs of the batch backends.
///
/// Submission pacing adapts: each accepted submission shrinks the delay
/// (bounded below by `min_delay_ms`), each rejected one grows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PacingConfig {
    pub initial_delay_ms: u64,
    pub min_delay_ms: u64,
    pub grow_factor: f64,
    pub shrink_factor: f64,
    /// Pause after resubmitting a failed task.
    pub retry_pause_ms: u64,
    /// Interval between status queries while jobs are still running.
    pub poll_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2_000,
            min_delay_ms: 1_000,
            grow_factor: 1.5,
            shrink_factor: 0.8,
            retry_pause_ms: 1_000,
            poll_interval_ms: 2_000,
        }
    }
}

impl PacingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
