//! FIFO frontier for light propagation entries.

use lumi_utils::BlockPos;

use super::queue_entry::QueueEntry;

/// A FIFO queue of (`BlockPos`, `QueueEntry`) pairs backed by a ring buffer.
///
/// The buffer length is always a power of two so wrapping is a mask. It doubles when full
/// and never shrinks, so a reused queue stops allocating after its first large pass.
#[derive(Debug)]
pub struct LightQueue {
    buffer: Vec<(BlockPos, QueueEntry)>,
    head: usize,
    size: usize,
}

impl LightQueue {
    /// Creates a new empty light queue with room for 4096 entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Creates a new light queue with at least the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(16).next_power_of_two();
        Self {
            buffer: vec![(BlockPos::default(), QueueEntry::default()); capacity],
            head: 0,
            size: 0,
        }
    }

    #[inline]
    fn mask(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Enqueues a position and queue entry for processing.
    #[inline]
    pub fn enqueue(&mut self, pos: BlockPos, entry: QueueEntry) {
        if self.size == self.buffer.len() {
            self.grow();
        }
        let tail = (self.head + self.size) & self.mask();
        self.buffer[tail] = (pos, entry);
        self.size += 1;
    }

    /// Dequeues the next position and queue entry.
    ///
    /// Returns `None` if the queue is empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<(BlockPos, QueueEntry)> {
        if self.size == 0 {
            return None;
        }

        let item = self.buffer[self.head];
        self.head = (self.head + 1) & self.mask();
        self.size -= 1;

        Some(item)
    }

    /// Checks if the queue is empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of entries in the queue.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// The number of entries the queue holds before growing.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Clears all entries from the queue.
    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.size = 0;
    }

    /// Doubles the buffer, unwrapping the live entries to the front.
    fn grow(&mut self) {
        self.buffer.rotate_left(self.head);
        self.head = 0;
        let new_capacity = self.buffer.len() * 2;
        self.buffer
            .resize(new_capacity, (BlockPos::default(), QueueEntry::default()));
    }
}

impl Default for LightQueue {
    fn default() -> Self {
        Self::new()
    }
}
