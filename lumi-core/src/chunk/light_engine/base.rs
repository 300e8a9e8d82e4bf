//! The flood-fill propagation engine.
//!
//! One [`PropagationEngine::process`] call restores the light-field invariant for everything a
//! request can affect:
//!
//! ```text
//! light(p) = max(source(p), max over neighbours n of light(n) - 1 - opacity(p))
//! ```
//!
//! Each channel runs a decrease frontier first and an increase frontier second. Reads that
//! hit a section held by another pass are not waited on; they are returned as deferred
//! requests for the scheduler to retry.

use lumi_utils::{BlockPos, SECTION_SIZE, SectionPos};
use smallvec::SmallVec;

use super::{direction::Direction, light_queue::LightQueue, queue_entry::QueueEntry, request::UpdateRequest};
use crate::{
    chunk::light_storage::{LightChannel, MAX_LIGHT},
    config::DEFAULT_MIN_SECTION_Y,
    error::LightError,
    world::BlockView,
};

/// Read and write access to stored light during one pass.
pub trait LightAccess {
    /// Stored light at `pos`.
    ///
    /// Fails with `NotLoaded` outside live sections and `SectionBusy` when another pass
    /// holds the section.
    fn light(&mut self, pos: BlockPos, channel: LightChannel) -> Result<u8, LightError>;

    /// Stores light at `pos`. Only called for positions that were just read successfully.
    fn set_light(&mut self, pos: BlockPos, channel: LightChannel, level: u8) -> Result<(), LightError>;

    /// Block data for the pass.
    fn blocks(&self) -> &BlockView;
}

/// Counters for one processed request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    /// Increase entries that were still current when popped.
    pub increases: usize,
    /// Decrease entries popped.
    pub decreases: usize,
    /// Requests handed back for later.
    pub deferred: usize,
}

enum Probe {
    Value(u8),
    Missing,
    Busy,
}

fn probe<A: LightAccess>(access: &mut A, pos: BlockPos, channel: LightChannel) -> Result<Probe, LightError> {
    match access.light(pos, channel) {
        Ok(level) => Ok(Probe::Value(level)),
        Err(LightError::NotLoaded(_)) => Ok(Probe::Missing),
        Err(LightError::SectionBusy(_)) => Ok(Probe::Busy),
        Err(err) => Err(err),
    }
}

/// The increase/decrease flood fill.
///
/// The engine keeps its frontiers between requests so a worker allocates them once.
#[derive(Debug)]
pub struct PropagationEngine {
    increase_queue: LightQueue,
    decrease_queue: LightQueue,
    deferred: SmallVec<[UpdateRequest; 8]>,
    stats: PassStats,
    min_section_y: i32,
}

impl PropagationEngine {
    /// Creates a new engine with default frontier capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Creates a new engine whose frontiers start with `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            increase_queue: LightQueue::with_capacity(capacity),
            decrease_queue: LightQueue::with_capacity(capacity),
            deferred: SmallVec::new(),
            stats: PassStats::default(),
            min_section_y: DEFAULT_MIN_SECTION_Y,
        }
    }

    /// Sets the lowest section y the sky column walk may reach.
    #[must_use]
    pub fn with_min_section_y(mut self, min_section_y: i32) -> Self {
        self.min_section_y = min_section_y;
        self
    }

    /// Checks if there are pending frontier entries.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.increase_queue.is_empty() || !self.decrease_queue.is_empty()
    }

    /// Takes the requests deferred by the last [`process`](Self::process) call.
    pub fn take_deferred(&mut self) -> SmallVec<[UpdateRequest; 8]> {
        std::mem::take(&mut self.deferred)
    }

    /// Processes one request to completion on every channel it affects.
    ///
    /// Only fatal errors are returned; unloaded and busy reads are handled inside the pass.
    /// `SectionUnloaded` expects the section to be gone from `access` already.
    pub fn process<A: LightAccess>(&mut self, access: &mut A, request: &UpdateRequest) -> Result<PassStats, LightError> {
        self.stats = PassStats::default();
        self.increase_queue.clear();
        self.decrease_queue.clear();

        for channel in LightChannel::ALL {
            if !request.affects(channel) {
                continue;
            }
            let result = self
                .seed(access, request, channel)
                .and_then(|()| self.run_light_updates(access, channel));
            if let Err(err) = result {
                self.increase_queue.clear();
                self.decrease_queue.clear();
                return Err(err);
            }
        }
        self.stats.deferred = self.deferred.len();
        Ok(self.stats)
    }

    /// Drains both frontiers of `channel`, decreases first.
    fn run_light_updates<A: LightAccess>(&mut self, access: &mut A, channel: LightChannel) -> Result<(), LightError> {
        self.propagate_decreases(access, channel)?;
        self.propagate_increases(access, channel)
    }

    fn seed<A: LightAccess>(&mut self, access: &mut A, request: &UpdateRequest, channel: LightChannel) -> Result<(), LightError> {
        match *request {
            UpdateRequest::BlockChanged {
                pos,
                old_opacity,
                old_emission,
            } => {
                if channel == LightChannel::Block {
                    let blocks = access.blocks();
                    let unchanged = blocks.opacity(pos).ok() == Some(old_opacity.min(MAX_LIGHT))
                        && blocks.emission(pos).ok() == Some(old_emission.min(MAX_LIGHT));
                    if unchanged {
                        return Ok(());
                    }
                }
                self.check_block(access, pos, channel)?;
                if channel == LightChannel::Sky {
                    self.check_sky_column(access, pos.below())?;
                }
            }
            UpdateRequest::SectionLoaded(section) => {
                for pos in section.blocks() {
                    self.check_block(access, pos, channel)?;
                }
                if channel == LightChannel::Sky {
                    self.check_sky_below(access, section)?;
                }
            }
            UpdateRequest::SectionUnloaded(section) => {
                for pos in boundary_neighbours(section) {
                    self.check_block(access, pos, channel)?;
                }
                if channel == LightChannel::Sky {
                    self.check_sky_below(access, section)?;
                }
            }
            UpdateRequest::LightIncrease { pos, value, .. } => {
                let current = match probe(access, pos, channel)? {
                    Probe::Value(level) => level,
                    Probe::Missing => return Ok(()),
                    Probe::Busy => {
                        self.defer(*request);
                        return Ok(());
                    }
                };
                let Some(expected) = self.expected_level(access, pos, channel)? else {
                    return Ok(());
                };
                if value > expected {
                    log::trace!("Stale light offer of {value} at {pos}, re-derived {expected}");
                }
                if expected > current {
                    access.set_light(pos, channel, expected)?;
                    self.increase_queue
                        .enqueue(pos, QueueEntry::increase_all_directions(expected));
                }
            }
            UpdateRequest::LightDecrease { pos, old_value, .. } => {
                self.check_block(access, pos, channel)?;
                let current = match probe(access, pos, channel)? {
                    Probe::Value(level) => level,
                    Probe::Missing => return Ok(()),
                    Probe::Busy => {
                        self.defer(*request);
                        return Ok(());
                    }
                };
                if old_value > 0 {
                    self.decrease_queue
                        .enqueue(pos, QueueEntry::decrease_all_directions(old_value.min(MAX_LIGHT)));
                }
                if current > 0 {
                    self.increase_queue
                        .enqueue(pos, QueueEntry::increase_all_directions(current));
                }
            }
            UpdateRequest::Recheck { pos, .. } => {
                self.check_block(access, pos, channel)?;
                if channel == LightChannel::Sky {
                    self.check_sky_column(access, pos.below())?;
                }
            }
        }
        Ok(())
    }

    /// Compares `pos` against its invariant value and seeds the frontier that fixes it.
    fn check_block<A: LightAccess>(&mut self, access: &mut A, pos: BlockPos, channel: LightChannel) -> Result<(), LightError> {
        let current = match probe(access, pos, channel)? {
            Probe::Value(level) => level,
            Probe::Missing => return Ok(()),
            Probe::Busy => {
                self.defer(UpdateRequest::Recheck { pos, channel });
                return Ok(());
            }
        };
        let Some(expected) = self.expected_level(access, pos, channel)? else {
            return Ok(());
        };

        if expected > current {
            access.set_light(pos, channel, expected)?;
            self.increase_queue
                .enqueue(pos, QueueEntry::increase_all_directions(expected));
        } else if expected < current {
            // Clear it and let the decrease pass find what still holds it up
            access.set_light(pos, channel, 0)?;
            self.decrease_queue
                .enqueue(pos, QueueEntry::decrease_all_directions(current));
            self.reseed_source(access, pos, channel)?;
        }
        Ok(())
    }

    /// The invariant value of `pos` from its source and current neighbours.
    ///
    /// Returns `None` when it cannot be known now; a busy neighbour also defers a recheck.
    fn expected_level<A: LightAccess>(
        &mut self,
        access: &mut A,
        pos: BlockPos,
        channel: LightChannel,
    ) -> Result<Option<u8>, LightError> {
        let (source, opacity) = {
            let blocks = access.blocks();
            (blocks.source_level(pos, channel), blocks.opacity(pos))
        };
        let (Ok(source), Ok(opacity)) = (source, opacity) else {
            return Ok(None);
        };
        if source >= MAX_LIGHT {
            return Ok(Some(MAX_LIGHT));
        }

        let attenuation = 1 + opacity;
        let mut level = source;
        for dir in Direction::ALL {
            match probe(access, dir.relative(pos), channel)? {
                Probe::Value(neighbour) => level = level.max(neighbour.saturating_sub(attenuation)),
                Probe::Missing => {}
                Probe::Busy => {
                    self.defer(UpdateRequest::Recheck { pos, channel });
                    return Ok(None);
                }
            }
        }
        Ok(Some(level))
    }

    /// Puts a cleared source block back at its own strength.
    fn reseed_source<A: LightAccess>(&mut self, access: &mut A, pos: BlockPos, channel: LightChannel) -> Result<(), LightError> {
        let Ok(source) = access.blocks().source_level(pos, channel) else {
            return Ok(());
        };
        if source > 0 {
            access.set_light(pos, channel, source)?;
            self.increase_queue
                .enqueue(pos, QueueEntry::increase_from_source(source));
        }
        Ok(())
    }

    /// Walks down from `start` while sky exposure and sky light disagree.
    ///
    /// An exposure change at one block shifts every block below it down to the next opaque
    /// block, so the first block that agrees ends the walk. Unloaded sections are stepped
    /// over, since loaded ones further down the column still see the change.
    fn check_sky_column<A: LightAccess>(&mut self, access: &mut A, start: BlockPos) -> Result<(), LightError> {
        let ambient = access.blocks().sky_light_level();
        if ambient == 0 {
            return Ok(());
        }
        let mut pos = start;
        loop {
            let section = SectionPos::from_block(pos);
            if section.0.y < self.min_section_y {
                break;
            }
            let level = match probe(access, pos, LightChannel::Sky)? {
                Probe::Value(level) => level,
                Probe::Missing => {
                    pos = BlockPos::new(pos.0.x, section.min_block().0.y - 1, pos.0.z);
                    continue;
                }
                Probe::Busy => {
                    self.defer(UpdateRequest::Recheck {
                        pos,
                        channel: LightChannel::Sky,
                    });
                    break;
                }
            };
            let Ok(exposed) = access.blocks().is_sky_exposed(pos) else {
                break;
            };
            if exposed == (level == ambient) {
                break;
            }
            self.check_block(access, pos, LightChannel::Sky)?;
            pos = pos.below();
        }
        Ok(())
    }

    fn check_sky_below<A: LightAccess>(&mut self, access: &mut A, section: SectionPos) -> Result<(), LightError> {
        let below = section.min_block().below();
        for z in 0..SECTION_SIZE {
            for x in 0..SECTION_SIZE {
                self.check_sky_column(access, below.offset(x, 0, z))?;
            }
        }
        Ok(())
    }

    fn propagate_decreases<A: LightAccess>(&mut self, access: &mut A, channel: LightChannel) -> Result<(), LightError> {
        while let Some((pos, entry)) = self.decrease_queue.dequeue() {
            self.stats.decreases += 1;
            let from_level = entry.level();

            for dir in Direction::ALL {
                if !entry.should_propagate(dir) {
                    continue;
                }
                let neighbour = dir.relative(pos);
                let level = match probe(access, neighbour, channel)? {
                    Probe::Value(0) | Probe::Missing => continue,
                    Probe::Value(level) => level,
                    Probe::Busy => {
                        self.defer(UpdateRequest::LightDecrease {
                            pos,
                            channel,
                            old_value: from_level,
                        });
                        continue;
                    }
                };
                let Ok(opacity) = access.blocks().opacity(neighbour) else {
                    continue;
                };

                if i16::from(level) <= i16::from(from_level) - 1 - i16::from(opacity) {
                    // Only the removed light could have produced this value
                    access.set_light(neighbour, channel, 0)?;
                    self.decrease_queue
                        .enqueue(neighbour, QueueEntry::decrease_skip_one_direction(level, dir.opposite()));
                    self.reseed_source(access, neighbour, channel)?;
                } else {
                    // Held up by another source, flow back into the darkened area
                    self.increase_queue
                        .enqueue(neighbour, QueueEntry::increase_only_one_direction(level, dir.opposite()));
                }
            }
        }
        Ok(())
    }

    fn propagate_increases<A: LightAccess>(&mut self, access: &mut A, channel: LightChannel) -> Result<(), LightError> {
        while let Some((pos, entry)) = self.increase_queue.dequeue() {
            let level = entry.level();
            match probe(access, pos, channel)? {
                Probe::Value(current) if current == level => {}
                _ => continue,
            }
            self.stats.increases += 1;
            if level <= 1 {
                continue;
            }

            for dir in Direction::ALL {
                if !entry.should_propagate(dir) {
                    continue;
                }
                let neighbour = dir.relative(pos);
                let Ok(opacity) = access.blocks().opacity(neighbour) else {
                    continue;
                };
                let candidate = level.saturating_sub(1 + opacity);
                if candidate == 0 {
                    continue;
                }
                match probe(access, neighbour, channel)? {
                    Probe::Value(current) if candidate > current => {
                        access.set_light(neighbour, channel, candidate)?;
                        self.increase_queue
                            .enqueue(neighbour, QueueEntry::increase_skip_one_direction(candidate, dir.opposite()));
                    }
                    Probe::Value(_) | Probe::Missing => {}
                    Probe::Busy => self.defer(UpdateRequest::LightIncrease {
                        pos: neighbour,
                        channel,
                        value: candidate,
                    }),
                }
            }
        }
        Ok(())
    }

    fn defer(&mut self, request: UpdateRequest) {
        if !self.deferred.contains(&request) {
            log::trace!("Deferring {request:?}");
            self.deferred.push(request);
        }
    }
}

impl Default for PropagationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocks just outside each face of `section`.
fn boundary_neighbours(section: SectionPos) -> impl Iterator<Item = BlockPos> {
    let min = section.min_block();
    (0..SECTION_SIZE).flat_map(move |a| {
        (0..SECTION_SIZE).flat_map(move |b| {
            [
                min.offset(-1, a, b),
                min.offset(SECTION_SIZE, a, b),
                min.offset(a, -1, b),
                min.offset(a, SECTION_SIZE, b),
                min.offset(a, b, -1),
                min.offset(a, b, SECTION_SIZE),
            ]
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rustc_hash::FxHashMap;

    use super::*;
    use crate::{
        chunk::light_storage::LightStorage,
        world::{BlockLight, MemoryWorld},
    };

    /// Unlocked access over plain storage, loaded wherever the world is.
    struct GridAccess {
        world: Arc<MemoryWorld>,
        blocks: BlockView,
        light: FxHashMap<SectionPos, LightStorage>,
        busy: Option<SectionPos>,
    }

    impl GridAccess {
        fn new(sections: &[SectionPos], has_sky: bool) -> Self {
            let world = Arc::new(MemoryWorld::new(-64));
            let mut light = FxHashMap::default();
            for &section in sections {
                world.load_section(section);
                light.insert(section, LightStorage::new());
            }
            let blocks = BlockView::new(world.clone(), has_sky, MAX_LIGHT);
            Self {
                world,
                blocks,
                light,
                busy: None,
            }
        }

        fn get(&self, pos: BlockPos, channel: LightChannel) -> u8 {
            self.light[&SectionPos::from_block(pos)].get(pos, channel)
        }

        fn place(&mut self, engine: &mut PropagationEngine, pos: BlockPos, block: BlockLight) -> PassStats {
            let old = self.world.set_block(pos, block);
            let request = UpdateRequest::BlockChanged {
                pos,
                old_opacity: old.opacity,
                old_emission: old.emission,
            };
            engine.process(self, &request).unwrap()
        }

        fn load_all(&mut self, engine: &mut PropagationEngine) {
            let mut sections: Vec<_> = self.light.keys().copied().collect();
            sections.sort_unstable();
            for section in sections {
                engine
                    .process(self, &UpdateRequest::SectionLoaded(section))
                    .unwrap();
            }
        }

        fn assert_invariant(&self) {
            for (&section, storage) in &self.light {
                for pos in section.blocks() {
                    for channel in LightChannel::ALL {
                        let source = self.blocks.source_level(pos, channel).unwrap();
                        let opacity = self.blocks.opacity(pos).unwrap();
                        let mut expected = source;
                        for dir in Direction::ALL {
                            let neighbour = dir.relative(pos);
                            if let Some(light) = self.light.get(&SectionPos::from_block(neighbour)) {
                                expected = expected.max(light.get(neighbour, channel).saturating_sub(1 + opacity));
                            }
                        }
                        assert_eq!(storage.get(pos, channel), expected, "{channel:?} at {pos}");
                    }
                }
            }
        }
    }

    impl LightAccess for GridAccess {
        fn light(&mut self, pos: BlockPos, channel: LightChannel) -> Result<u8, LightError> {
            let section = SectionPos::from_block(pos);
            if self.busy == Some(section) {
                return Err(LightError::SectionBusy(section));
            }
            self.light
                .get(&section)
                .map(|storage| storage.get(pos, channel))
                .ok_or(LightError::NotLoaded(pos))
        }

        fn set_light(&mut self, pos: BlockPos, channel: LightChannel, level: u8) -> Result<(), LightError> {
            let storage = self
                .light
                .get_mut(&SectionPos::from_block(pos))
                .ok_or(LightError::NotLoaded(pos))?;
            storage.set(pos, channel, level);
            Ok(())
        }

        fn blocks(&self) -> &BlockView {
            &self.blocks
        }
    }

    fn cube(radius: i32) -> Vec<SectionPos> {
        let mut sections = Vec::new();
        for x in -radius..=radius {
            for y in -radius..=radius {
                for z in -radius..=radius {
                    sections.push(SectionPos::new(x, y, z));
                }
            }
        }
        sections
    }

    #[test]
    fn test_source_spreads_by_distance() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0)], false);
        let mut engine = PropagationEngine::new();
        let origin = BlockPos::new(8, 8, 8);
        grid.place(&mut engine, origin, BlockLight::new(0, 12));

        assert_eq!(grid.get(origin, LightChannel::Block), 12);
        assert_eq!(grid.get(BlockPos::new(8, 8, 12), LightChannel::Block), 8);
        assert_eq!(grid.get(BlockPos::new(10, 5, 9), LightChannel::Block), 6);
        assert_eq!(grid.get(BlockPos::new(0, 0, 0), LightChannel::Block), 0);
        grid.assert_invariant();
    }

    #[test]
    fn test_removing_source_clears_light() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0)], false);
        let mut engine = PropagationEngine::new();
        let origin = BlockPos::new(8, 8, 8);
        grid.place(&mut engine, origin, BlockLight::new(0, 14));
        let stats = grid.place(&mut engine, origin, BlockLight::AIR);

        assert!(stats.decreases > 0);
        for pos in SectionPos::new(0, 0, 0).blocks() {
            assert_eq!(grid.get(pos, LightChannel::Block), 0);
        }
    }

    #[test]
    fn test_light_flows_around_removed_path() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0)], false);
        let mut engine = PropagationEngine::new();
        grid.place(&mut engine, BlockPos::new(2, 8, 8), BlockLight::new(0, 10));
        grid.place(&mut engine, BlockPos::new(12, 8, 8), BlockLight::new(0, 8));
        assert_eq!(grid.get(BlockPos::new(9, 8, 8), LightChannel::Block), 5);

        // The nearer source goes away, the farther one must take over
        grid.place(&mut engine, BlockPos::new(12, 8, 8), BlockLight::AIR);
        assert_eq!(grid.get(BlockPos::new(9, 8, 8), LightChannel::Block), 3);
        grid.assert_invariant();
    }

    #[test]
    fn test_opacity_attenuates_receiving_block() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0)], false);
        let mut engine = PropagationEngine::new();
        grid.place(&mut engine, BlockPos::new(5, 5, 5), BlockLight::new(3, 0));
        grid.place(&mut engine, BlockPos::new(4, 5, 5), BlockLight::new(0, 15));

        assert_eq!(grid.get(BlockPos::new(5, 5, 5), LightChannel::Block), 11);
        grid.assert_invariant();
    }

    #[test]
    fn test_crosses_loaded_sections_and_truncates_at_unloaded() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0), SectionPos::new(1, 0, 0)], false);
        let mut engine = PropagationEngine::new();
        grid.place(&mut engine, BlockPos::new(15, 8, 8), BlockLight::new(0, 15));

        assert_eq!(grid.get(BlockPos::new(16, 8, 8), LightChannel::Block), 14);
        assert_eq!(grid.get(BlockPos::new(27, 8, 8), LightChannel::Block), 3);
        assert_eq!(grid.get(BlockPos::new(0, 8, 8), LightChannel::Block), 0);
        assert!(engine.take_deferred().is_empty());
        grid.assert_invariant();
    }

    #[test]
    fn test_busy_neighbour_defers_crossing() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0), SectionPos::new(1, 0, 0)], false);
        grid.busy = Some(SectionPos::new(1, 0, 0));
        let mut engine = PropagationEngine::new();
        grid.place(&mut engine, BlockPos::new(14, 8, 8), BlockLight::new(0, 15));

        let deferred = engine.take_deferred();
        assert!(deferred.contains(&UpdateRequest::LightIncrease {
            pos: BlockPos::new(16, 8, 8),
            channel: LightChannel::Block,
            value: 13,
        }));
        assert_eq!(grid.get(BlockPos::new(16, 8, 8), LightChannel::Block), 0);

        // Replaying the deferred work once the section is free completes the field
        grid.busy = None;
        let mut pending = deferred.into_vec();
        while let Some(request) = pending.pop() {
            engine.process(&mut grid, &request).unwrap();
            pending.extend(engine.take_deferred());
        }
        grid.assert_invariant();
    }

    #[test]
    fn test_section_load_fills_sky() {
        let mut grid = GridAccess::new(&cube(0), true);
        let mut engine = PropagationEngine::new();
        grid.load_all(&mut engine);

        assert_eq!(grid.get(BlockPos::new(3, 3, 3), LightChannel::Sky), 15);
        grid.assert_invariant();
    }

    #[test]
    fn test_roof_shades_column() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0), SectionPos::new(0, 1, 0)], true);
        let mut engine = PropagationEngine::new();
        grid.load_all(&mut engine);

        let roof = BlockPos::new(5, 20, 5);
        grid.place(&mut engine, roof, BlockLight::new(15, 0));
        assert_eq!(grid.get(roof, LightChannel::Sky), 0);
        assert_eq!(grid.get(roof.below(), LightChannel::Sky), 14);
        assert_eq!(grid.get(BlockPos::new(5, 0, 5), LightChannel::Sky), 14);
        grid.assert_invariant();

        grid.place(&mut engine, roof, BlockLight::AIR);
        assert_eq!(grid.get(BlockPos::new(5, 0, 5), LightChannel::Sky), 15);
        grid.assert_invariant();
    }

    #[test]
    fn test_reloading_stable_section_changes_nothing() {
        let mut grid = GridAccess::new(&cube(0), true);
        let mut engine = PropagationEngine::new();
        grid.load_all(&mut engine);
        grid.place(&mut engine, BlockPos::new(4, 4, 4), BlockLight::new(0, 13));
        let before = grid.light.clone();

        let stats = engine
            .process(&mut grid, &UpdateRequest::SectionLoaded(SectionPos::new(0, 0, 0)))
            .unwrap();
        assert_eq!(stats.increases, 0);
        assert_eq!(stats.decreases, 0);
        assert_eq!(grid.light, before);
    }

    #[test]
    fn test_unchanged_block_skips_block_channel() {
        let mut grid = GridAccess::new(&[SectionPos::new(0, 0, 0)], false);
        let mut engine = PropagationEngine::new();
        let pos = BlockPos::new(1, 1, 1);
        grid.place(&mut engine, pos, BlockLight::new(0, 9));
        let stats = engine
            .process(
                &mut grid,
                &UpdateRequest::BlockChanged {
                    pos,
                    old_opacity: 0,
                    old_emission: 9,
                },
            )
            .unwrap();
        assert_eq!(stats, PassStats::default());
    }
}
