//! Configuration parsing for niri-helpers
//!
//! This crate handles parsing the KDL configuration file, resolving XDG
//! paths, and persisting small JSON state records between invocations.

mod error;
pub mod logging;
mod model;
mod parser;
pub mod paths;
mod state;

pub use error::ConfigError;
pub use logging::init_logging;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
pub use state::StateFile;
