use lumi_utils::{BlockPos, SectionPos};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::world::{LumiWorld, sky_light_sources::ChunkSkyLightSources};

/// The light-relevant properties of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockLight {
    /// Light attenuation (0-15).
    pub opacity: u8,
    /// Emitted light (0-15).
    pub emission: u8,
}

impl BlockLight {
    /// A transparent block that emits nothing.
    pub const AIR: Self = Self::new(0, 0);

    /// Creates block properties.
    #[must_use]
    pub const fn new(opacity: u8, emission: u8) -> Self {
        Self { opacity, emission }
    }
}

/// A sparse world kept entirely in memory.
///
/// Blocks default to air. Only explicitly loaded sections report as loaded.
pub struct MemoryWorld {
    min_y: i32,
    blocks: RwLock<FxHashMap<BlockPos, BlockLight>>,
    sky_sources: RwLock<FxHashMap<(i32, i32), ChunkSkyLightSources>>,
    loaded: RwLock<FxHashSet<SectionPos>>,
}

impl MemoryWorld {
    /// Creates an empty world whose sky reaches down to `min_y`.
    #[must_use]
    pub fn new(min_y: i32) -> Self {
        Self {
            min_y,
            blocks: RwLock::new(FxHashMap::default()),
            sky_sources: RwLock::new(FxHashMap::default()),
            loaded: RwLock::new(FxHashSet::default()),
        }
    }

    /// The block at `pos`.
    #[must_use]
    pub fn block(&self, pos: BlockPos) -> BlockLight {
        self.blocks.read().get(&pos).copied().unwrap_or_default()
    }

    /// Replaces the block at `pos` and returns the previous one.
    pub fn set_block(&self, pos: BlockPos, block: BlockLight) -> BlockLight {
        let mut blocks = self.blocks.write();
        let old = if block == BlockLight::AIR {
            blocks.remove(&pos)
        } else {
            blocks.insert(pos, block)
        }
        .unwrap_or_default();

        if (old.opacity > 0) != (block.opacity > 0) {
            let (x, _, z) = pos.section_local();
            let mut sky_sources = self.sky_sources.write();
            let column = sky_sources
                .entry((pos.0.x >> 4, pos.0.z >> 4))
                .or_insert_with(|| ChunkSkyLightSources::new(self.min_y));
            if block.opacity > 0 {
                column.block_opaque(x, z, pos.0.y);
            } else {
                column.block_cleared(x, z, pos.0.y, |y| {
                    blocks
                        .get(&BlockPos::new(pos.0.x, y, pos.0.z))
                        .is_some_and(|below| below.opacity > 0)
                });
            }
        }
        old
    }

    /// Marks a section's block data as available.
    pub fn load_section(&self, section: SectionPos) {
        self.loaded.write().insert(section);
    }

    /// Marks a section's block data as unavailable.
    pub fn unload_section(&self, section: SectionPos) {
        self.loaded.write().remove(&section);
    }
}

impl LumiWorld for MemoryWorld {
    fn opacity(&self, pos: BlockPos) -> u8 {
        self.block(pos).opacity
    }

    fn emission(&self, pos: BlockPos) -> u8 {
        self.block(pos).emission
    }

    fn is_sky_exposed(&self, pos: BlockPos) -> bool {
        let (x, _, z) = pos.section_local();
        self.sky_sources
            .read()
            .get(&(pos.0.x >> 4, pos.0.z >> 4))
            .map_or(pos.0.y >= self.min_y, |column| column.is_exposed(x, pos.0.y, z))
    }

    fn is_loaded(&self, pos: BlockPos) -> bool {
        self.loaded.read().contains(&SectionPos::from_block(pos))
    }
}
