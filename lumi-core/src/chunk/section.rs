//! Lifecycle of the light data attached to a loaded chunk section.

use std::sync::Arc;

use crossbeam::atomic::AtomicCell;
use lumi_utils::SectionPos;
use parking_lot::Mutex;

use crate::{chunk::light_storage::LightStorage, error::LightError};

/// Lifecycle state of a [`ChunkLightSection`].
///
/// Sections move `Unloaded -> Loading -> Loaded -> Unloading -> Unloaded` and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionState {
    /// Not present, or retired.
    Unloaded,
    /// Storage allocated, not yet seeded.
    Loading,
    /// Accepting requests and propagation.
    Loaded,
    /// Rejecting new requests, waiting to be retired.
    Unloading,
}

impl SectionState {
    /// Whether `self -> to` is an edge of the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Unloaded, Self::Loading)
                | (Self::Loading, Self::Loaded)
                | (Self::Loaded, Self::Unloading)
                | (Self::Unloading, Self::Unloaded)
        )
    }

    /// Whether propagation may read and write this section's light.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Loaded | Self::Unloading)
    }
}

/// The light data of one loaded chunk section.
#[derive(Debug)]
pub struct ChunkLightSection {
    pos: SectionPos,
    state: AtomicCell<SectionState>,
    light: Arc<Mutex<LightStorage>>,
}

impl ChunkLightSection {
    /// Creates a dark, unloaded section.
    #[must_use]
    pub fn new(pos: SectionPos) -> Self {
        Self::with_light(pos, LightStorage::new())
    }

    /// Creates an unloaded section holding previously stored light.
    #[must_use]
    pub fn with_light(pos: SectionPos, light: LightStorage) -> Self {
        Self {
            pos,
            state: AtomicCell::new(SectionState::Unloaded),
            light: Arc::new(Mutex::new(light)),
        }
    }

    /// The position of this section.
    #[must_use]
    pub fn pos(&self) -> SectionPos {
        self.pos
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SectionState {
        self.state.load()
    }

    /// Moves the section to `to`, failing if the lifecycle has no such edge.
    pub fn transition(&self, to: SectionState) -> Result<(), LightError> {
        let from = self.state.load();
        if !from.can_transition_to(to) || self.state.compare_exchange(from, to).is_err() {
            return Err(LightError::IllegalTransition {
                section: self.pos,
                from,
                to,
            });
        }
        log::debug!("{} moved from {from:?} to {to:?}", self.pos);
        Ok(())
    }

    /// The lock guarding this section's light.
    #[must_use]
    pub fn light(&self) -> &Arc<Mutex<LightStorage>> {
        &self.light
    }

    /// A copy of the current light.
    #[must_use]
    pub fn snapshot(&self) -> LightStorage {
        self.light.lock().clone()
    }
}

/// All sections that currently hold light, keyed by position.
pub struct SectionMap {
    sections: scc::HashMap<SectionPos, Arc<ChunkLightSection>>,
    // Serializes lifecycle changes so a retire never removes a newer replacement.
    lifecycle: Mutex<()>,
}

/// What [`SectionMap::load`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A new section was created.
    Created,
    /// The section was already loaded and keeps its light.
    AlreadyLoaded,
    /// A section still unloading was replaced by a fresh one.
    Replaced,
}

impl SectionMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: scc::HashMap::new(),
            lifecycle: Mutex::new(()),
        }
    }

    /// The section at `pos`, in any state.
    #[must_use]
    pub fn get(&self, pos: SectionPos) -> Option<Arc<ChunkLightSection>> {
        self.sections.read_sync(&pos, |_, section| section.clone())
    }

    /// The state of the section at `pos`, `Unloaded` if absent.
    #[must_use]
    pub fn state(&self, pos: SectionPos) -> SectionState {
        self.get(pos)
            .map_or(SectionState::Unloaded, |section| section.state())
    }

    /// Whether the section at `pos` accepts propagation.
    #[must_use]
    pub fn is_live(&self, pos: SectionPos) -> bool {
        self.state(pos).is_live()
    }

    /// Brings the section at `pos` to `Loaded`.
    ///
    /// `light` seeds a newly created section. An already loaded section keeps its light.
    pub fn load(&self, pos: SectionPos, light: Option<LightStorage>) -> Result<LoadOutcome, LightError> {
        let _guard = self.lifecycle.lock();
        let previous = self.get(pos);
        let outcome = match previous.as_ref().map(|section| section.state()) {
            Some(SectionState::Loaded) => return Ok(LoadOutcome::AlreadyLoaded),
            Some(SectionState::Unloading) => LoadOutcome::Replaced,
            _ => LoadOutcome::Created,
        };

        let section = Arc::new(ChunkLightSection::with_light(pos, light.unwrap_or_default()));
        section.transition(SectionState::Loading)?;
        if let Some(previous) = previous {
            previous.transition(SectionState::Unloaded).ok();
            self.sections.remove_sync(&pos);
        }
        let _ = self.sections.insert_sync(pos, section.clone());
        section.transition(SectionState::Loaded)?;
        Ok(outcome)
    }

    /// Moves the section at `pos` from `Loaded` to `Unloading`.
    pub fn begin_unload(&self, pos: SectionPos) -> Result<(), LightError> {
        let _guard = self.lifecycle.lock();
        match self.get(pos) {
            Some(section) => section.transition(SectionState::Unloading),
            None => Err(LightError::IllegalTransition {
                section: pos,
                from: SectionState::Unloaded,
                to: SectionState::Unloading,
            }),
        }
    }

    /// Removes the section at `pos` if it is still unloading. Returns whether it was removed.
    pub fn retire(&self, pos: SectionPos) -> bool {
        let _guard = self.lifecycle.lock();
        let Some(section) = self.get(pos) else {
            return false;
        };
        if section.transition(SectionState::Unloaded).is_err() {
            return false;
        }
        self.sections.remove_sync(&pos);
        true
    }

    /// Positions of every section in the given state.
    #[must_use]
    pub fn positions_in(&self, state: SectionState) -> Vec<SectionPos> {
        let mut positions = Vec::new();
        self.sections.iter_sync(|pos, section| {
            if section.state() == state {
                positions.push(*pos);
            }
            true
        });
        positions.sort_unstable();
        positions
    }

    /// Number of sections in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Default for SectionMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_edges() {
        let section = ChunkLightSection::new(SectionPos::new(0, 0, 0));
        assert_eq!(section.state(), SectionState::Unloaded);
        assert!(section.transition(SectionState::Loaded).is_err());
        section.transition(SectionState::Loading).unwrap();
        section.transition(SectionState::Loaded).unwrap();
        assert!(section.transition(SectionState::Loading).is_err());
        section.transition(SectionState::Unloading).unwrap();
        section.transition(SectionState::Unloaded).unwrap();
    }

    #[test]
    fn test_map_load_and_retire() {
        let map = SectionMap::new();
        let pos = SectionPos::new(1, 2, 3);

        assert_eq!(map.load(pos, None).unwrap(), LoadOutcome::Created);
        assert_eq!(map.load(pos, None).unwrap(), LoadOutcome::AlreadyLoaded);
        assert!(map.is_live(pos));

        // Retiring a loaded section is not allowed
        assert!(!map.retire(pos));
        map.begin_unload(pos).unwrap();
        assert_eq!(map.state(pos), SectionState::Unloading);
        assert!(map.retire(pos));
        assert!(map.is_empty());
        assert!(!map.retire(pos));
    }

    #[test]
    fn test_reload_while_unloading_replaces() {
        let map = SectionMap::new();
        let pos = SectionPos::new(0, 0, 0);
        map.load(pos, None).unwrap();
        let old = map.get(pos).unwrap();
        map.begin_unload(pos).unwrap();

        assert_eq!(map.load(pos, None).unwrap(), LoadOutcome::Replaced);
        assert_eq!(old.state(), SectionState::Unloaded);
        // A late retire for the old section must not remove the replacement
        assert!(!map.retire(pos));
        assert_eq!(map.state(pos), SectionState::Loaded);
    }

    #[test]
    fn test_begin_unload_requires_loaded() {
        let map = SectionMap::new();
        let pos = SectionPos::new(0, 0, 0);
        assert!(matches!(
            map.begin_unload(pos),
            Err(LightError::IllegalTransition { .. })
        ));
    }
}
