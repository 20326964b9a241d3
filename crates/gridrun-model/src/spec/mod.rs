mod template;
pub use template::TaskTemplate;

mod config;
pub use config::{PacingConfig, RunConfig};

mod overrides;
pub use overrides::{ConfigOverrides, RunOverrides};
