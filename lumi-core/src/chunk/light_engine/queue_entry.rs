//! `QueueEntry` bit-packing for frontier entries.
//!
//! The `QueueEntry` packs all propagation metadata into a single u64:
//! - Bits 0-3: Light level (0-15)
//! - Bits 4-9: Direction flags (6 directions)
//! - Bit 10: Seeded from a light source

use super::direction::Direction;

/// A frontier entry that encodes light propagation information in a bit-packed u64.
///
/// Bit layout:
/// ```text
/// Bit Position:  63.....................11  10  9  8  7  6  5  4  3  2  1  0
///                |         Unused        | S | D D D D D D | L L L L |
///                                         |   |           |         |
///                                         |   |           |         +-> Light Level (4 bits)
///                                         |   |           +----------> Direction Flags (6 bits)
///                                         |   +----------------------> Source Flag
///                                         +--------------------------> (Unused)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueEntry(u64);

impl QueueEntry {
    /// Mask for light level (bits 0-3)
    const LEVEL_MASK: u64 = 0x0F;

    /// First bit of the direction flags
    const DIRECTION_SHIFT: u32 = 4;

    /// Mask for all direction flags (bits 4-9)
    const DIRECTIONS_MASK: u64 = 0x3F << Self::DIRECTION_SHIFT;

    /// Flag for light seeded from an emitting or sky-exposed block (bit 10)
    const SOURCE_FLAG: u64 = 0x400;

    /// Gets the light level from this queue entry (0-15).
    #[must_use]
    #[inline]
    pub fn level(self) -> u8 {
        (self.0 & Self::LEVEL_MASK) as u8
    }

    /// Checks if light should propagate in the given direction.
    #[must_use]
    #[inline]
    pub fn should_propagate(self, dir: Direction) -> bool {
        (self.0 & dir.flag(Self::DIRECTION_SHIFT)) != 0
    }

    /// Checks if this entry was seeded from a light source.
    #[must_use]
    #[inline]
    pub fn is_from_source(self) -> bool {
        (self.0 & Self::SOURCE_FLAG) != 0
    }

    #[must_use]
    #[inline]
    fn with_level(self, level: u8) -> Self {
        debug_assert!(level <= 15, "Light level must be 0-15");
        Self((self.0 & !Self::LEVEL_MASK) | (u64::from(level) & Self::LEVEL_MASK))
    }

    #[must_use]
    #[inline]
    fn with_direction(self, dir: Direction) -> Self {
        Self(self.0 | dir.flag(Self::DIRECTION_SHIFT))
    }

    #[must_use]
    #[inline]
    fn without_direction(self, dir: Direction) -> Self {
        Self(self.0 & !dir.flag(Self::DIRECTION_SHIFT))
    }

    /// Creates an entry for decreasing light in all directions.
    #[must_use]
    pub fn decrease_all_directions(level: u8) -> Self {
        Self(Self::DIRECTIONS_MASK).with_level(level)
    }

    /// Creates an entry for decreasing light in all directions except one.
    #[must_use]
    pub fn decrease_skip_one_direction(level: u8, skip_dir: Direction) -> Self {
        Self(Self::DIRECTIONS_MASK)
            .without_direction(skip_dir)
            .with_level(level)
    }

    /// Creates an entry for increasing light in all directions.
    #[must_use]
    pub fn increase_all_directions(level: u8) -> Self {
        Self(Self::DIRECTIONS_MASK).with_level(level)
    }

    /// Creates an entry for light seeded at a source block.
    #[must_use]
    pub fn increase_from_source(level: u8) -> Self {
        Self(Self::DIRECTIONS_MASK | Self::SOURCE_FLAG).with_level(level)
    }

    /// Creates an entry for increasing light in all directions except one.
    #[must_use]
    pub fn increase_skip_one_direction(level: u8, skip_dir: Direction) -> Self {
        Self(Self::DIRECTIONS_MASK)
            .without_direction(skip_dir)
            .with_level(level)
    }

    /// Creates an entry for increasing light in only one direction.
    #[must_use]
    pub fn increase_only_one_direction(level: u8, dir: Direction) -> Self {
        Self(0).with_direction(dir).with_level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_extraction() {
        let entry = QueueEntry::decrease_all_directions(12);
        assert_eq!(entry.level(), 12);
        assert!(!entry.is_from_source());
    }

    #[test]
    fn test_direction_flags() {
        let entry = QueueEntry::increase_all_directions(5);
        for dir in Direction::ALL {
            assert!(entry.should_propagate(dir));
        }
    }

    #[test]
    fn test_skip_one_direction() {
        let entry = QueueEntry::decrease_skip_one_direction(8, Direction::Up);
        assert!(entry.should_propagate(Direction::Down));
        assert!(!entry.should_propagate(Direction::Up));
        assert!(entry.should_propagate(Direction::North));
        assert_eq!(entry.level(), 8);
    }

    #[test]
    fn test_source_flag() {
        let entry = QueueEntry::increase_from_source(14);
        assert_eq!(entry.level(), 14);
        assert!(entry.is_from_source());
        assert!(entry.should_propagate(Direction::West));
    }

    #[test]
    fn test_only_one_direction() {
        let entry = QueueEntry::increase_only_one_direction(7, Direction::East);
        assert_eq!(entry.level(), 7);
        for dir in Direction::ALL {
            assert_eq!(entry.should_propagate(dir), dir == Direction::East);
        }
    }
}
