pub mod config;
pub mod types;

pub use config::{ConfigError, ListingFormat, StageConfig, StrategyKind};
pub use types::*;
