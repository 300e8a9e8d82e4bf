//! Light storage for chunk sections.
//!
//! Light values are stored as 4-bit values (0-15), packed as two values per byte.
//! For a 16x16x16 section, this requires 2048 bytes (4096 blocks / 2) per channel.

use std::fmt::Debug;

use lumi_utils::BlockPos;

/// The number of bytes needed to store one channel of a 16x16x16 section.
/// 16*16*16 blocks = 4096 blocks, at 4 bits per block = 2048 bytes
pub const LIGHT_ARRAY_SIZE: usize = 2048;

/// The brightest light level.
pub const MAX_LIGHT: u8 = 15;

/// One of the two independent light channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightChannel {
    /// Light coming from the sky.
    Sky,
    /// Light emitted by blocks.
    Block,
}

impl LightChannel {
    /// Both channels, sky first.
    pub const ALL: [LightChannel; 2] = [LightChannel::Sky, LightChannel::Block];
}

/// Light data for a single channel of a chunk section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightLayer {
    /// All blocks in the section have the same light level (0-15).
    Homogeneous(u8),
    /// Blocks have different light levels, stored as packed nibbles.
    /// Each byte contains two 4-bit light values.
    Heterogeneous(Box<[u8; LIGHT_ARRAY_SIZE]>),
}

impl LightLayer {
    /// Creates a new homogeneous layer with all blocks at the given light level.
    #[must_use]
    pub fn new_filled(light_level: u8) -> Self {
        debug_assert!(light_level <= MAX_LIGHT, "Light level must be 0-15");
        Self::Homogeneous(light_level)
    }

    /// Creates a new empty (dark) layer.
    #[must_use]
    pub fn new_empty() -> Self {
        Self::Homogeneous(0)
    }

    /// Creates a layer from a packed nibble array.
    ///
    /// Returns `None` if `nibbles` is not exactly [`LIGHT_ARRAY_SIZE`] bytes.
    #[must_use]
    pub fn from_nibbles(nibbles: &[u8]) -> Option<Self> {
        let data: [u8; LIGHT_ARRAY_SIZE] = nibbles.try_into().ok()?;
        let first = data[0];
        let uniform = (first & 0x0F) == (first >> 4) && data.iter().all(|&byte| byte == first);
        if uniform {
            Some(Self::Homogeneous(first & 0x0F))
        } else {
            Some(Self::Heterogeneous(Box::new(data)))
        }
    }

    /// Gets the light level at the given position.
    ///
    /// # Arguments
    /// * `x` - X coordinate (0-15)
    /// * `y` - Y coordinate (0-15)
    /// * `z` - Z coordinate (0-15)
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");

        match self {
            Self::Homogeneous(level) => *level,
            Self::Heterogeneous(data) => {
                let (byte_index, is_upper_nibble) = Self::index(x, y, z);
                if is_upper_nibble {
                    (data[byte_index] >> 4) & 0x0F
                } else {
                    data[byte_index] & 0x0F
                }
            }
        }
    }

    /// Sets the light level at the given position.
    ///
    /// If currently homogeneous and setting a different value, upgrades to heterogeneous.
    ///
    /// # Arguments
    /// * `x` - X coordinate (0-15)
    /// * `y` - Y coordinate (0-15)
    /// * `z` - Z coordinate (0-15)
    /// * `light_level` - Light level (0-15)
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, light_level: u8) {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
        debug_assert!(light_level <= MAX_LIGHT, "Light level must be 0-15");

        if let Self::Homogeneous(current_level) = *self {
            if light_level == current_level {
                return;
            }
            // Upgrade to heterogeneous, filling both nibbles with the current level
            let packed = (current_level & 0x0F) | ((current_level & 0x0F) << 4);
            *self = Self::Heterogeneous(Box::new([packed; LIGHT_ARRAY_SIZE]));
        }

        if let Self::Heterogeneous(data) = self {
            let (byte_index, is_upper_nibble) = Self::index(x, y, z);
            if is_upper_nibble {
                data[byte_index] = (data[byte_index] & 0x0F) | ((light_level & 0x0F) << 4);
            } else {
                data[byte_index] = (data[byte_index] & 0xF0) | (light_level & 0x0F);
            }
        }
    }

    /// Returns the packed nibble array.
    ///
    /// For homogeneous storage, creates a filled array.
    /// For heterogeneous storage, returns a clone of the data.
    #[must_use]
    pub fn to_nibbles(&self) -> Vec<u8> {
        match self {
            Self::Homogeneous(level) => {
                let packed = (*level & 0x0F) | ((*level & 0x0F) << 4);
                vec![packed; LIGHT_ARRAY_SIZE]
            }
            Self::Heterogeneous(data) => data.to_vec(),
        }
    }

    // Index is y * 16 * 16 + z * 16 + x, two blocks per byte.
    #[inline]
    fn index(x: usize, y: usize, z: usize) -> (usize, bool) {
        let block_index = y * 256 + z * 16 + x;
        (block_index >> 1, (block_index & 1) == 1)
    }
}

impl Default for LightLayer {
    fn default() -> Self {
        Self::new_empty()
    }
}

/// Both light channels of one chunk section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightStorage {
    sky: LightLayer,
    block: LightLayer,
}

impl LightStorage {
    /// Creates dark storage for both channels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage from existing layers.
    #[must_use]
    pub fn from_layers(sky: LightLayer, block: LightLayer) -> Self {
        Self { sky, block }
    }

    /// The layer for `channel`.
    #[must_use]
    pub fn layer(&self, channel: LightChannel) -> &LightLayer {
        match channel {
            LightChannel::Sky => &self.sky,
            LightChannel::Block => &self.block,
        }
    }

    fn layer_mut(&mut self, channel: LightChannel) -> &mut LightLayer {
        match channel {
            LightChannel::Sky => &mut self.sky,
            LightChannel::Block => &mut self.block,
        }
    }

    /// Gets the light at `pos`, which must lie inside this section.
    #[must_use]
    #[inline]
    pub fn get(&self, pos: BlockPos, channel: LightChannel) -> u8 {
        let (x, y, z) = pos.section_local();
        self.layer(channel).get(x, y, z)
    }

    /// Sets the light at `pos`, which must lie inside this section.
    #[inline]
    pub fn set(&mut self, pos: BlockPos, channel: LightChannel, light_level: u8) {
        let (x, y, z) = pos.section_local();
        self.layer_mut(channel).set(x, y, z, light_level);
    }

    /// The packed nibble array of one channel, ready for persistence or the network.
    #[must_use]
    pub fn to_nibbles(&self, channel: LightChannel) -> Vec<u8> {
        self.layer(channel).to_nibbles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogeneous_get() {
        let layer = LightLayer::new_filled(15);
        assert_eq!(layer.get(0, 0, 0), 15);
        assert_eq!(layer.get(15, 15, 15), 15);
    }

    #[test]
    fn test_set_upgrades_to_heterogeneous() {
        let mut layer = LightLayer::new_empty();
        layer.set(5, 5, 5, 14);

        assert_eq!(layer.get(5, 5, 5), 14);
        assert_eq!(layer.get(0, 0, 0), 0);

        assert!(matches!(layer, LightLayer::Heterogeneous(_)));
    }

    #[test]
    fn test_upgrade_keeps_filled_level() {
        let mut layer = LightLayer::new_filled(9);
        layer.set(1, 2, 3, 4);
        assert_eq!(layer.get(1, 2, 3), 4);
        assert_eq!(layer.get(0, 2, 3), 9);
        assert_eq!(layer.get(15, 15, 15), 9);
    }

    #[test]
    fn test_packed_nibbles() {
        let mut layer = LightLayer::new_empty();

        // Two adjacent blocks share a byte
        layer.set(0, 0, 0, 5);
        layer.set(1, 0, 0, 10);

        assert_eq!(layer.get(0, 0, 0), 5);
        assert_eq!(layer.get(1, 0, 0), 10);
        assert_eq!(layer.to_nibbles()[0], 0xA5);
    }

    #[test]
    fn test_from_nibbles() {
        assert_eq!(LightLayer::from_nibbles(&[0x77; LIGHT_ARRAY_SIZE]), Some(LightLayer::Homogeneous(7)));
        assert_eq!(LightLayer::from_nibbles(&[0; 12]), None);

        let mut layer = LightLayer::new_empty();
        layer.set(3, 4, 5, 12);
        let restored = LightLayer::from_nibbles(&layer.to_nibbles()).unwrap();
        assert_eq!(restored.get(3, 4, 5), 12);
        assert_eq!(restored.get(3, 4, 6), 0);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut storage = LightStorage::new();
        let pos = BlockPos::new(-1, 17, 32);
        storage.set(pos, LightChannel::Sky, 13);

        assert_eq!(storage.get(pos, LightChannel::Sky), 13);
        assert_eq!(storage.get(pos, LightChannel::Block), 0);
        assert_eq!(storage.layer(LightChannel::Block), &LightLayer::Homogeneous(0));
    }
}
