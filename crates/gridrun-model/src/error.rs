use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error(
        "time limit {0:?} has not the correct syntax (hh:mm:ss), for example 48:00:00 for 2 days"
    )]
    InvalidTimeLimit(String),
    #[error("no command given")]
    EmptyCommand,
    #[error("task count must be at least 1")]
    NoTasks,
    #[error("unknown backend: {0} (expected: sge|slurm|local)")]
    UnknownBackend(String),
}
