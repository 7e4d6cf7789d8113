//! Data models

pub mod validation;
pub mod telemetry;
pub mod settings;
pub mod verdict;
pub mod evaluation;

pub use validation::*;
pub use telemetry::*;
pub use settings::*;
pub use verdict::*;
pub use evaluation::*;
