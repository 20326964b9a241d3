use thiserror::Error;

use gridrun_model::{EXIT_CONFIG_ERROR, EXIT_TASK_FAILED, ModelError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ModelError),
    #[error("{backend} backend failed: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },
    #[error("io error: {0}")]
    Io(String),
}

impl CoreError {
    pub fn backend(backend: &'static str, reason: impl Into<String>) -> Self {
        CoreError::Backend {
            backend,
            reason: reason.into(),
        }
    }

    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Config(_) => EXIT_CONFIG_ERROR,
            CoreError::Backend { .. } | CoreError::Io(_) => EXIT_TASK_FAILED,
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}
