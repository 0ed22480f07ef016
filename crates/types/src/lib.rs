//! Core types shared by the citymine workspace
//!
//! Principals, participant identifiers, block heights, reward cycles and the
//! per-block randomness seed. Every other crate depends on these definitions.

pub mod principal;
pub mod units;

pub use principal::*;
pub use units::*;
