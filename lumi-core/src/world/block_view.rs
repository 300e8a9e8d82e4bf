use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use lumi_utils::BlockPos;

use crate::{
    chunk::light_storage::{LightChannel, MAX_LIGHT},
    error::LightError,
    world::LumiWorld,
};

/// Clamped, load-checked reads of block data.
///
/// Also owns the ambient sky strength, the source value of every sky-exposed block.
pub struct BlockView {
    world: Arc<dyn LumiWorld>,
    has_sky: bool,
    sky_light: AtomicU8,
}

impl BlockView {
    /// Wraps a world.
    ///
    /// # Arguments
    /// * `world` - The block data provider
    /// * `has_sky` - Whether the sky channel has any source at all
    /// * `sky_light` - Ambient sky strength (0-15)
    #[must_use]
    pub fn new(world: Arc<dyn LumiWorld>, has_sky: bool, sky_light: u8) -> Self {
        Self {
            world,
            has_sky,
            sky_light: AtomicU8::new(sky_light.min(MAX_LIGHT)),
        }
    }

    /// Opacity at `pos`, clamped to 0-15.
    pub fn opacity(&self, pos: BlockPos) -> Result<u8, LightError> {
        self.ensure_loaded(pos)?;
        Ok(self.world.opacity(pos).min(MAX_LIGHT))
    }

    /// Emission at `pos`, clamped to 0-15.
    pub fn emission(&self, pos: BlockPos) -> Result<u8, LightError> {
        self.ensure_loaded(pos)?;
        Ok(self.world.emission(pos).min(MAX_LIGHT))
    }

    /// Whether `pos` sees the sky. Always false in worlds without one.
    pub fn is_sky_exposed(&self, pos: BlockPos) -> Result<bool, LightError> {
        self.ensure_loaded(pos)?;
        Ok(self.has_sky && self.world.is_sky_exposed(pos))
    }

    /// Whether block data at `pos` is available.
    #[must_use]
    pub fn is_loaded(&self, pos: BlockPos) -> bool {
        self.world.is_loaded(pos)
    }

    /// The light `pos` produces by itself on `channel`.
    pub fn source_level(&self, pos: BlockPos, channel: LightChannel) -> Result<u8, LightError> {
        match channel {
            LightChannel::Block => self.emission(pos),
            LightChannel::Sky => Ok(if self.is_sky_exposed(pos)? {
                self.sky_light_level()
            } else {
                0
            }),
        }
    }

    /// The ambient sky strength, 0 in worlds without a sky.
    #[must_use]
    pub fn sky_light_level(&self) -> u8 {
        if self.has_sky {
            self.sky_light.load(Ordering::Acquire)
        } else {
            0
        }
    }

    /// Changes the ambient sky strength. Returns the previous value.
    ///
    /// Stored light is not touched; the caller has to recheck loaded sections.
    pub fn set_sky_light_level(&self, level: u8) -> u8 {
        self.sky_light.swap(level.min(MAX_LIGHT), Ordering::AcqRel)
    }

    /// Whether the world has a sky channel.
    #[must_use]
    pub fn has_sky(&self) -> bool {
        self.has_sky
    }

    fn ensure_loaded(&self, pos: BlockPos) -> Result<(), LightError> {
        if self.world.is_loaded(pos) {
            Ok(())
        } else {
            Err(LightError::NotLoaded(pos))
        }
    }
}

#[cfg(test)]
mod tests {
    use lumi_utils::SectionPos;

    use super::*;
    use crate::world::{BlockLight, MemoryWorld};

    fn view(has_sky: bool) -> (Arc<MemoryWorld>, BlockView) {
        let world = Arc::new(MemoryWorld::new(0));
        world.load_section(SectionPos::new(0, 0, 0));
        let view = BlockView::new(world.clone(), has_sky, 15);
        (world, view)
    }

    #[test]
    fn test_values_are_clamped() {
        let (world, view) = view(true);
        let pos = BlockPos::new(1, 1, 1);
        world.set_block(pos, BlockLight::new(200, 99));
        assert_eq!(view.opacity(pos), Ok(15));
        assert_eq!(view.emission(pos), Ok(15));
    }

    #[test]
    fn test_unloaded_reads_fail() {
        let (_world, view) = view(true);
        let pos = BlockPos::new(16, 0, 0);
        assert_eq!(view.opacity(pos), Err(LightError::NotLoaded(pos)));
        assert!(!view.is_loaded(pos));
    }

    #[test]
    fn test_sky_source_follows_ambient_strength() {
        let (_world, view) = view(true);
        let pos = BlockPos::new(3, 3, 3);
        assert_eq!(view.source_level(pos, LightChannel::Sky), Ok(15));
        assert_eq!(view.set_sky_light_level(9), 15);
        assert_eq!(view.source_level(pos, LightChannel::Sky), Ok(9));
        assert_eq!(view.source_level(pos, LightChannel::Block), Ok(0));
    }

    #[test]
    fn test_no_sky_world() {
        let (_world, view) = view(false);
        let pos = BlockPos::new(3, 3, 3);
        assert_eq!(view.is_sky_exposed(pos), Ok(false));
        assert_eq!(view.sky_light_level(), 0);
        assert_eq!(view.source_level(pos, LightChannel::Sky), Ok(0));
    }
}
