//! Light propagation using a flood-fill algorithm, run by a pool of section-claiming workers.

pub mod base;
pub mod direction;
pub mod light_queue;
pub mod queue_entry;
pub mod request;
pub mod scheduler;
mod section_locks;
pub mod threaded_level_light_engine;
mod worker;

// Re-export main types for convenience
pub use base::{LightAccess, PassStats, PropagationEngine};
pub use direction::Direction;
pub use light_queue::LightQueue;
pub use queue_entry::QueueEntry;
pub use request::UpdateRequest;
pub use scheduler::{Batch, UpdateScheduler};
pub use threaded_level_light_engine::ThreadedLevelLightEngine;
