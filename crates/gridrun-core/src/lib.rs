pub mod error;
pub use error::CoreError;

pub mod strategy;
pub use strategy::Strategy;

pub mod selector;
pub use selector::{host_identity, resolve_backend, select_backend};

pub mod exclusion;
pub use exclusion::ExclusionList;

pub mod ranges;
pub use ranges::render_job_ids;

pub mod prepare;
pub use prepare::{prepare_template, prepare_template_in};

pub mod context;
pub use context::RunContext;
