/// Tracks the lowest Y-coordinate where sky light enters each column of a chunk.
///
/// This structure maintains a 16x16 grid (one entry per XZ column). A block sees the sky
/// when its Y is at or above its column's source, which sits one block above the highest
/// block with any opacity.
#[derive(Debug, Clone)]
pub struct ChunkSkyLightSources {
    /// Minimum Y coordinate of the world, the source of an empty column.
    min_y: i32,

    /// Sky light source heights for each column (16x16 = 256 entries).
    /// Stored in Z-major order: index = z * 16 + x
    heights: Box<[i32; 256]>,
}

impl ChunkSkyLightSources {
    /// Creates a tracker where every column is open down to `min_y`.
    #[must_use]
    pub fn new(min_y: i32) -> Self {
        Self {
            min_y,
            heights: Box::new([min_y; 256]),
        }
    }

    /// Gets the sky light source Y-coordinate for a column.
    ///
    /// # Arguments
    /// * `x` - Column X coordinate (0-15)
    /// * `z` - Column Z coordinate (0-15)
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> i32 {
        debug_assert!(x < 16 && z < 16, "Column coordinates must be 0-15");
        self.heights[z * 16 + x]
    }

    /// Sets the sky light source Y-coordinate for a column.
    ///
    /// Values below the world minimum are raised to it.
    #[inline]
    pub fn set(&mut self, x: usize, z: usize, y: i32) {
        debug_assert!(x < 16 && z < 16, "Column coordinates must be 0-15");
        self.heights[z * 16 + x] = y.max(self.min_y);
    }

    /// Whether the block at height `y` in column `(x, z)` sees the sky.
    #[inline]
    #[must_use]
    pub fn is_exposed(&self, x: usize, y: i32, z: usize) -> bool {
        y >= self.get(x, z)
    }

    /// Records that an opaque block now sits at `y`.
    pub fn block_opaque(&mut self, x: usize, z: usize, y: i32) {
        if y >= self.get(x, z) {
            self.set(x, z, y + 1);
        }
    }

    /// Records that the block at `y` no longer has opacity.
    ///
    /// `is_opaque` answers for lower blocks of the same column and is only consulted when the
    /// cleared block was the column's top.
    pub fn block_cleared(&mut self, x: usize, z: usize, y: i32, is_opaque: impl Fn(i32) -> bool) {
        if y + 1 != self.get(x, z) {
            return;
        }
        let source = (self.min_y..y)
            .rev()
            .find(|&below| is_opaque(below))
            .map_or(self.min_y, |top| top + 1);
        self.set(x, z, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut sources = ChunkSkyLightSources::new(-64);

        sources.set(0, 0, 100);
        assert_eq!(sources.get(0, 0), 100);

        sources.set(15, 15, -100);
        assert_eq!(sources.get(15, 15), -64);
    }

    #[test]
    fn test_opaque_blocks_raise_source() {
        let mut sources = ChunkSkyLightSources::new(0);
        assert!(sources.is_exposed(3, 0, 4));

        sources.block_opaque(3, 4, 10);
        assert!(!sources.is_exposed(3, 10, 4));
        assert!(sources.is_exposed(3, 11, 4));

        // A lower block changes nothing
        sources.block_opaque(3, 4, 5);
        assert_eq!(sources.get(3, 4), 11);
    }

    #[test]
    fn test_clearing_top_rescans_column() {
        let mut sources = ChunkSkyLightSources::new(0);
        sources.block_opaque(1, 1, 5);
        sources.block_opaque(1, 1, 10);

        sources.block_cleared(1, 1, 10, |y| y == 5);
        assert_eq!(sources.get(1, 1), 6);

        sources.block_cleared(1, 1, 5, |_| false);
        assert_eq!(sources.get(1, 1), 0);
    }
}
