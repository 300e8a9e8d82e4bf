// Wrapper types making it harder to accidentaly mix block and section coordinates.

use std::fmt::{self, Display};

use crate::math::Vector3;

/// Width of a section along every axis, in blocks.
pub const SECTION_SIZE: i32 = 16;

/// Number of blocks in a section.
pub const SECTION_VOLUME: usize = 4096;

/// A block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a block position from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// Returns this position moved by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// The position directly below.
    #[must_use]
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The position directly above.
    #[must_use]
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Coordinates of this block inside its section, each in `0..16`.
    #[must_use]
    pub const fn section_local(self) -> (usize, usize, usize) {
        (
            (self.0.x & 15) as usize,
            (self.0.y & 15) as usize,
            (self.0.z & 15) as usize,
        )
    }

    /// Manhattan distance to another position.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.0.x.abs_diff(other.0.x) + self.0.y.abs_diff(other.0.y) + self.0.z.abs_diff(other.0.z)
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0.x, self.0.y, self.0.z)
    }
}

/// A section position, measured in units of 16 blocks.
///
/// The derived ordering (x, then y, then z) is the global lock order for sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SectionPos(pub Vector3<i32>);

impl SectionPos {
    /// Creates a section position from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The section containing `pos`.
    #[must_use]
    pub const fn from_block(pos: BlockPos) -> Self {
        Self::new(pos.0.x >> 4, pos.0.y >> 4, pos.0.z >> 4)
    }

    /// The block with the smallest coordinates inside this section.
    #[must_use]
    pub const fn min_block(self) -> BlockPos {
        BlockPos::new(
            self.0.x * SECTION_SIZE,
            self.0.y * SECTION_SIZE,
            self.0.z * SECTION_SIZE,
        )
    }

    /// The block with the largest coordinates inside this section.
    #[must_use]
    pub const fn max_block(self) -> BlockPos {
        self.min_block()
            .offset(SECTION_SIZE - 1, SECTION_SIZE - 1, SECTION_SIZE - 1)
    }

    /// Whether `pos` lies inside this section.
    #[must_use]
    pub const fn contains(self, pos: BlockPos) -> bool {
        let other = Self::from_block(pos);
        other.0.x == self.0.x && other.0.y == self.0.y && other.0.z == self.0.z
    }

    /// Returns this section moved by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// Every block in this section, in y, z, x order.
    pub fn blocks(self) -> impl Iterator<Item = BlockPos> {
        let min = self.min_block();
        (0..SECTION_SIZE).flat_map(move |y| {
            (0..SECTION_SIZE)
                .flat_map(move |z| (0..SECTION_SIZE).map(move |x| min.offset(x, y, z)))
        })
    }
}

impl Display for SectionPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section[{}, {}, {}]", self.0.x, self.0.y, self.0.z)
    }
}
