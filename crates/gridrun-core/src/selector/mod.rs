use gridrun_model::BackendKind;
use tracing::debug;

/// Host-name prefix of the grid-engine cluster front ends.
pub const GRID_ENGINE_HOST_PREFIX: &str = "stimulus";
/// Host-name prefix of the Slurm cluster front ends.
pub const SLURM_HOST_PREFIX: &str = "triton";

/// Pick the backend for a host.
///
/// Unknown hosts run locally.
pub fn select_backend(hostname: &str) -> BackendKind {
    if hostname.starts_with(GRID_ENGINE_HOST_PREFIX) {
        BackendKind::GridEngine
    } else if hostname.starts_with(SLURM_HOST_PREFIX) {
        BackendKind::Slurm
    } else {
        BackendKind::Local
    }
}

/// An explicit choice wins over host detection.
pub fn resolve_backend(explicit: Option<BackendKind>, hostname: &str) -> BackendKind {
    let kind = explicit.unwrap_or_else(|| select_backend(hostname));
    debug!(target: "gridrun.core.selector", hostname, backend = kind.kind(), "backend selected");
    kind
}

/// Name of the current host, empty if it cannot be determined.
pub fn host_identity() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_default()
}
