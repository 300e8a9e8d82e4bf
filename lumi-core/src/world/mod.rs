//! The boundary between the light engine and the world that owns block state.

use lumi_utils::BlockPos;

/// Read access to clamped block data for the engine.
pub mod block_view;
/// An in-memory world for tests, tools and benchmarks.
pub mod memory;
/// Per-column sky exposure tracking.
pub mod sky_light_sources;

pub use block_view::BlockView;
pub use memory::{BlockLight, MemoryWorld};

/// The world collaborator the engine reads block data from.
///
/// Implementations must be cheap to call. The engine calls them for every coordinate it
/// visits, from several worker threads at once.
pub trait LumiWorld: Send + Sync {
    /// Light attenuation of the block at `pos`.
    fn opacity(&self, pos: BlockPos) -> u8;

    /// Light emitted by the block at `pos`.
    fn emission(&self, pos: BlockPos) -> u8;

    /// Whether `pos` can see the sky.
    fn is_sky_exposed(&self, pos: BlockPos) -> bool;

    /// Whether block data at `pos` is available.
    fn is_loaded(&self, pos: BlockPos) -> bool;
}
