pub mod config;
pub mod errors;
pub mod span;

pub use config::{AnalysisConfig, ConfigError};
pub use errors::SemanticError;
pub use span::{Position, Span};
