//! Per-section light storage and the engine that keeps it consistent.

pub mod light_engine;
pub mod light_storage;
pub mod section;

pub use light_storage::{LightChannel, LightLayer, LightStorage, MAX_LIGHT};
pub use section::{ChunkLightSection, SectionState};
