//! # Lumi Utils
//!
//! Position and math types shared by the Lumi crates.

/// Small math primitives.
pub mod math;
mod types;

pub use types::*;
