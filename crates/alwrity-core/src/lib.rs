//! ALwrity Core: error taxonomy, configuration, clock, shared content types.

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AlwrityConfig, DataPaths, GenerationConfig, ScoringConfig, Settings};
pub use error::{Error, Result};
pub use types::*;
