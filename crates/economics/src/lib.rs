//! Citymine Economics
//!
//! Pure issuance schedule for mining rewards:
//! - fixed bonus reward for the first blocks after activation
//! - halving epochs keyed to the block offset from activation
//! - a perpetual tail reward once the last halving is reached

pub mod errors;
pub mod params;
pub mod schedule;

pub use errors::*;
pub use params::*;
pub use schedule::*;

/// Module version for API introspection
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
