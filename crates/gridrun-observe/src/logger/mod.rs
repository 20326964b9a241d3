mod config;
mod error;
mod format;
mod log;

pub use config::{LoggerConfig, level_for_verbosity};
pub use error::LoggerError;
pub use format::LoggerFormat;

pub use log::FILTER_ENV;

/// Install the global subscriber. Fails if one is already installed.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    log::install(cfg)
}
