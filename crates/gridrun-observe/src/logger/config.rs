use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::format::LoggerFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Level for the `gridrun` targets; `RUST_LOG` replaces the whole filter.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stderr().is_terminal();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: false,
            use_color,
        }
    }
}

impl LoggerConfig {
    /// Config whose level follows the run's verbosity.
    pub fn from_verbosity(verbosity: u8) -> Self {
        Self {
            level: level_for_verbosity(verbosity).to_string(),
            with_targets: verbosity > 1,
            ..Default::default()
        }
    }
}

/// Map the `-V` verbosity count to a log level.
///
/// 0 reports progress and failures, 1 adds per-run details, 2 and above
/// also echo every command handed to the batch system.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
