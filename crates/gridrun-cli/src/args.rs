//! Command line of `job-runner`.
use std::path::PathBuf;

use clap::Parser;

use gridrun_model::{BackendKind, RunOverrides};
use gridrun_observe::LoggerFormat;

/// Run a command as an array of tasks on the cluster this host belongs to.
///
/// `%t` in the command is replaced by the task number.
#[derive(Parser, Debug, Clone)]
#[command(name = "job-runner")]
pub struct Args {
    /// Number of tasks to launch
    #[arg(short = 'T', long = "numtasks")]
    pub num_tasks: Option<u32>,

    /// Time limit for one task (hh:mm:ss)
    #[arg(short = 't', long = "timelimit")]
    pub time_limit: Option<String>,

    /// Memory limit for one task in MB
    #[arg(short = 'm', long = "memlimit")]
    pub mem_limit: Option<u64>,

    /// Stdout file pattern (%c command, %j first job id, %J real job id, %t task).
    /// A directory gets the default pattern inside it.
    #[arg(short = 'o', long = "output-stream", value_name = "FILE")]
    pub output_stream: Option<String>,

    /// Stderr file pattern, same placeholders as --output-stream
    #[arg(short = 'e', long = "error-stream", value_name = "FILE")]
    pub error_stream: Option<String>,

    /// Job priority; a higher value runs later
    #[arg(short = 'p', long, allow_negative_numbers = true)]
    pub priority: Option<i32>,

    /// Queue or partition (ignored on Slurm if it starts with -)
    #[arg(short = 'q', long, allow_hyphen_values = true)]
    pub queue: Option<String>,

    /// Local worker count; zero or negative keeps that many CPUs free
    #[arg(short = 'c', long, allow_negative_numbers = true)]
    pub cores: Option<i32>,

    /// Nodes per task (Slurm)
    #[arg(short = 'N', long)]
    pub nodes: Option<u32>,

    /// Retries for failed tasks (Slurm)
    #[arg(short = 'r', long = "retrys")]
    pub retries: Option<u32>,

    #[arg(short = 'V', long, default_value_t = 0)]
    pub verbosity: u8,

    /// Comma separated nodes to exclude (Slurm)
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,

    /// Node denylist file [default: $HOME/.bad_node_list]
    #[arg(long, env = "GRIDRUN_DENYLIST")]
    pub denylist: Option<PathBuf>,

    /// Force a backend instead of detecting it from the host name
    #[arg(long, value_name = "sge|slurm|local")]
    pub backend: Option<BackendKind>,

    #[arg(long, env = "GRIDRUN_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Command to run, with its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Args {
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            num_tasks: self.num_tasks,
            time_limit: self.time_limit.clone(),
            mem_limit_mb: self.mem_limit,
            stdout_pattern: self.output_stream.clone(),
            stderr_pattern: self.error_stream.clone(),
            priority: self.priority,
            queue: self.queue.clone(),
            cores: self.cores,
            nodes: self.nodes,
            retries: self.retries,
            exclude_nodes: self.exclude.clone(),
            denylist: self.denylist.clone(),
            verbosity: Some(self.verbosity),
            pacing: None,
        }
    }
}
