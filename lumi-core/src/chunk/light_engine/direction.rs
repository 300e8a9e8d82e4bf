//! The six face neighbours light travels to.

use lumi_utils::BlockPos;

/// A face of a block.
///
/// Opposite faces sit on adjacent ordinals (`Down`/`Up`, `North`/`South`, `West`/`East`),
/// and each ordinal selects one flag bit of a `QueueEntry`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -Y
    Down = 0,
    /// +Y
    Up = 1,
    /// -Z
    North = 2,
    /// +Z
    South = 3,
    /// -X
    West = 4,
    /// +X
    East = 5,
}

const OFFSETS: [(i32, i32, i32); 6] = [
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
    (-1, 0, 0),
    (1, 0, 0),
];

impl Direction {
    /// Every face, in ordinal order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The face pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::ALL[(self as usize) ^ 1]
    }

    /// The unit step `(dx, dy, dz)` toward this face.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        OFFSETS[self as usize]
    }

    /// The neighbour of `pos` across this face.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }

    /// This face's bit in a direction mask starting at bit `shift`.
    #[must_use]
    pub const fn flag(self, shift: u32) -> u64 {
        1 << (self as u32 + shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites_pair_up() {
        assert_eq!(Direction::Down.opposite(), Direction::Up);
        assert_eq!(Direction::South.opposite(), Direction::North);
        assert_eq!(Direction::West.opposite(), Direction::East);
        for dir in Direction::ALL {
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn test_relative_steps_one_block() {
        let pos = BlockPos::new(-1, 15, 16);
        for dir in Direction::ALL {
            let moved = dir.relative(pos);
            assert_eq!(moved.manhattan_distance(pos), 1);
            assert_eq!(dir.opposite().relative(moved), pos);
        }
    }

    #[test]
    fn test_flags_are_distinct() {
        let mask = Direction::ALL.iter().fold(0u64, |mask, dir| {
            assert_eq!(mask & dir.flag(4), 0);
            mask | dir.flag(4)
        });
        assert_eq!(mask, 0b11_1111 << 4);
    }
}
