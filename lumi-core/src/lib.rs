//! # Lumi Core
//!
//! A concurrent voxel lighting engine. Block and sky light are stored per 16x16x16 section
//! as 4-bit values and kept consistent with the world's block data by incremental flood fill.
//!
//! The world reports changes through [`ThreadedLevelLightEngine`]; workers process them
//! per section and readers query the stored light at any time.

pub mod chunk;
pub mod config;
pub mod error;
pub mod world;

pub use chunk::light_engine::ThreadedLevelLightEngine;
pub use chunk::{LightChannel, LightStorage, SectionState};
pub use config::LightConfig;
pub use error::{ConfigError, LightError};
