use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ModelError, PacingConfig, RunConfig, TimeLimit};

/// Caller-supplied changes to the default configuration.
///
/// Every field is optional; `None` keeps the base value. The time limit is
/// kept as raw text so a malformed value is reported by [`ConfigOverrides::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOverrides {
    pub num_tasks: Option<u32>,
    pub time_limit: Option<String>,
    pub mem_limit_mb: Option<u64>,
    pub stdout_pattern: Option<String>,
    pub stderr_pattern: Option<String>,
    pub priority: Option<i32>,
    pub queue: Option<String>,
    pub cores: Option<i32>,
    pub nodes: Option<u32>,
    pub retries: Option<u32>,
    pub exclude_nodes: Option<String>,
    pub denylist: Option<PathBuf>,
    pub verbosity: Option<u8>,
    pub pacing: Option<PacingConfig>,
}

/// Either a full set of option overrides or just a task count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigOverrides {
    Options(RunOverrides),
    TaskCount(u32),
}

impl ConfigOverrides {
    /// Apply the overrides on top of `base` and validate the result.
    pub fn resolve(self, base: RunConfig) -> Result<RunConfig, ModelError> {
        let cfg = match self {
            ConfigOverrides::TaskCount(num_tasks) => RunConfig { num_tasks, ..base },
            ConfigOverrides::Options(o) => {
                let time_limit = match o.time_limit {
                    Some(raw) => raw.parse::<TimeLimit>()?,
                    None => base.time_limit,
                };
                RunConfig {
                    num_tasks: o.num_tasks.unwrap_or(base.num_tasks),
                    time_limit,
                    mem_limit_mb: o.mem_limit_mb.unwrap_or(base.mem_limit_mb),
                    stdout_pattern: o.stdout_pattern.unwrap_or(base.stdout_pattern),
                    stderr_pattern: o.stderr_pattern.unwrap_or(base.stderr_pattern),
                    priority: o.priority.unwrap_or(base.priority),
                    queue: o.queue.unwrap_or(base.queue),
                    cores: o.cores.unwrap_or(base.cores),
                    nodes: o.nodes.unwrap_or(base.nodes),
                    retries: o.retries.unwrap_or(base.retries),
                    exclude_nodes: o.exclude_nodes.unwrap_or(base.exclude_nodes),
                    denylist: o.denylist.or(base.denylist),
                    verbosity: o.verbosity.unwrap_or(base.verbosity),
                    pacing: o.pacing.unwrap_or(base.pacing),
                }
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

impl From<u32> for ConfigOverrides {
    fn from(num_tasks: u32) -> Self {
        ConfigOverrides::TaskCount(num_tasks)
    }
}

impl From<RunOverrides> for ConfigOverrides {
    fn from(value: RunOverrides) -> Self {
        ConfigOverrides::Options(value)
    }
}

impl Default for ConfigOverrides {
    fn default() -> Self {
        ConfigOverrides::TaskCount(1)
    }
}
