//! Subscriber installation.
//!
//! All output goes to stderr; stdout belongs to the wrapped command's users.
use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Environment variable that replaces the verbosity-derived filter.
pub const FILTER_ENV: &str = "RUST_LOG";

/// Level for everything outside the `gridrun` targets.
const DEPENDENCY_LEVEL: &str = "warn";

pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = filter_for(&cfg.level, std::env::var(FILTER_ENV).ok())?;
    let registry = tracing_subscriber::registry().with(filter);

    match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(cfg.use_color)
                .with_target(cfg.with_targets)
                .with_timer(local_timer());
            init_with(registry.with(layer))
        }
        LoggerFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(cfg.with_targets)
                .with_current_span(false)
                .with_timer(local_timer());
            init_with(registry.with(layer))
        }
        LoggerFormat::Journald => journald(registry),
    }
}

/// Filter for `level` on the crate's own targets, unless `env` holds a directive.
pub(crate) fn filter_for(level: &str, env: Option<String>) -> Result<EnvFilter, LoggerError> {
    let directive = directive(level, env);
    EnvFilter::try_new(&directive).map_err(|_| LoggerError::InvalidLogLevel(directive))
}

fn directive(level: &str, env: Option<String>) -> String {
    match env {
        Some(env) if !env.trim().is_empty() => env,
        _ => format!("{DEPENDENCY_LEVEL},gridrun={level}"),
    }
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let msg = e.to_string();
        if msg.contains("global default") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::InitializationFailed(msg)
        }
    })
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald<S>(registry: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("job-runner".to_string());
    init_with(registry.with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald<S>(_registry: S) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_applies_to_own_targets() {
        assert_eq!(directive("debug", None), "warn,gridrun=debug");
        assert!(filter_for("trace", None).is_ok());
    }

    #[test]
    fn env_directive_wins() {
        assert_eq!(
            directive("info", Some("gridrun.exec.slurm=trace".into())),
            "gridrun.exec.slurm=trace"
        );
        assert_eq!(directive("info", Some("  ".into())), "warn,gridrun=info");
    }

    #[test]
    fn invalid_level_is_reported() {
        assert!(matches!(
            filter_for("loud", None),
            Err(LoggerError::InvalidLogLevel(_))
        ));
    }
}
