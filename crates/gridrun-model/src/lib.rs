mod error;
pub use error::ModelError;

mod domain;
pub use domain::*;

mod spec;
pub use spec::*;
