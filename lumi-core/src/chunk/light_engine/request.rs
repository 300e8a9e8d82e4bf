//! The units of work the scheduler queues and the propagation engine consumes.

use lumi_utils::{BlockPos, SectionPos};

use crate::chunk::light_storage::LightChannel;

/// A unit of light work. Requests are immutable once queued and consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRequest {
    /// The block at `pos` changed. The old values let an unchanged block channel be skipped.
    BlockChanged {
        /// The changed block.
        pos: BlockPos,
        /// Opacity before the change.
        old_opacity: u8,
        /// Emission before the change.
        old_emission: u8,
    },
    /// A section became available and must be seeded.
    SectionLoaded(SectionPos),
    /// A section became unavailable and must be retired.
    SectionUnloaded(SectionPos),
    /// A neighbour offered `value` to `pos`.
    LightIncrease {
        /// The receiving block.
        pos: BlockPos,
        /// The channel being raised.
        channel: LightChannel,
        /// The offered light.
        value: u8,
    },
    /// The light at `pos` dropped from `old_value`; dependants must be re-derived.
    LightDecrease {
        /// The block whose light dropped.
        pos: BlockPos,
        /// The channel being lowered.
        channel: LightChannel,
        /// The light before the drop.
        old_value: u8,
    },
    /// Re-derive `pos` from its sources and neighbours.
    Recheck {
        /// The block to re-derive.
        pos: BlockPos,
        /// The channel to re-derive.
        channel: LightChannel,
    },
}

impl UpdateRequest {
    /// The section that owns this request.
    #[must_use]
    pub fn section(&self) -> SectionPos {
        match *self {
            Self::SectionLoaded(section) | Self::SectionUnloaded(section) => section,
            Self::BlockChanged { pos, .. }
            | Self::LightIncrease { pos, .. }
            | Self::LightDecrease { pos, .. }
            | Self::Recheck { pos, .. } => SectionPos::from_block(pos),
        }
    }

    /// Whether this request reads or writes the light at `pos`.
    #[must_use]
    pub fn touches(&self, pos: BlockPos) -> bool {
        match *self {
            Self::SectionLoaded(section) | Self::SectionUnloaded(section) => section.contains(pos),
            Self::BlockChanged { pos: target, .. }
            | Self::LightIncrease { pos: target, .. }
            | Self::LightDecrease { pos: target, .. }
            | Self::Recheck { pos: target, .. } => target == pos,
        }
    }

    /// Whether this request does any work on `channel`.
    #[must_use]
    pub fn affects(&self, channel: LightChannel) -> bool {
        match *self {
            Self::BlockChanged { .. } | Self::SectionLoaded(_) | Self::SectionUnloaded(_) => true,
            Self::LightIncrease { channel: own, .. }
            | Self::LightDecrease { channel: own, .. }
            | Self::Recheck { channel: own, .. } => own == channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_routing() {
        let request = UpdateRequest::BlockChanged {
            pos: BlockPos::new(-1, 31, 16),
            old_opacity: 0,
            old_emission: 0,
        };
        assert_eq!(request.section(), SectionPos::new(-1, 1, 1));

        let loaded = UpdateRequest::SectionLoaded(SectionPos::new(2, 0, 0));
        assert_eq!(loaded.section(), SectionPos::new(2, 0, 0));
        assert!(loaded.touches(BlockPos::new(40, 3, 3)));
        assert!(!loaded.touches(BlockPos::new(48, 3, 3)));
    }

    #[test]
    fn test_channel_filter() {
        let recheck = UpdateRequest::Recheck {
            pos: BlockPos::new(0, 0, 0),
            channel: LightChannel::Block,
        };
        assert!(recheck.affects(LightChannel::Block));
        assert!(!recheck.affects(LightChannel::Sky));
        assert!(UpdateRequest::SectionUnloaded(SectionPos::new(0, 0, 0)).affects(LightChannel::Sky));
    }
}
