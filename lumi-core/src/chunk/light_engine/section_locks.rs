//! Section locks held by a single light pass.
//!
//! Sections are ordered by [`SectionPos`]'s derived order (x, then y, then z). A pass may
//! wait for a section above everything it holds. Below that it may only try, so two passes
//! spreading toward each other can never wait on each other.

use std::{collections::BTreeMap, time::Duration};

use lumi_utils::SectionPos;
use parking_lot::{RawMutex, lock_api::ArcMutexGuard};

use crate::{
    chunk::{light_storage::LightStorage, section::ChunkLightSection},
    error::LightError,
};

type SectionGuard = ArcMutexGuard<RawMutex, LightStorage>;

/// The section guards of one pass, released together when dropped.
pub struct SectionLocks {
    held: BTreeMap<SectionPos, SectionGuard>,
    wait: Duration,
}

impl SectionLocks {
    /// Creates an empty lock set.
    ///
    /// # Arguments
    /// * `wait` - How long an in-order acquisition may wait before reporting the section busy
    #[must_use]
    pub fn new(wait: Duration) -> Self {
        Self {
            held: BTreeMap::new(),
            wait,
        }
    }

    /// Whether this pass holds `pos`.
    #[must_use]
    pub fn holds(&self, pos: SectionPos) -> bool {
        self.held.contains_key(&pos)
    }

    /// The highest section held.
    #[must_use]
    pub fn highest(&self) -> Option<SectionPos> {
        self.held.keys().next_back().copied()
    }

    /// Locks `section` following the lock order.
    ///
    /// Waits up to the configured duration when `section` is above every held section, and
    /// only tries otherwise. Fails with `SectionBusy` when the lock is not obtained.
    pub fn acquire(&mut self, section: &ChunkLightSection) -> Result<(), LightError> {
        let pos = section.pos();
        if self.holds(pos) {
            return Ok(());
        }
        let in_order = self.highest().is_none_or(|highest| pos > highest);
        let guard = if in_order {
            self.acquire_waiting(section)?
        } else {
            section.light().try_lock_arc()
        };
        self.insert(pos, guard)
    }

    /// Locks `section` with a bounded wait. Waiting is only legal above every held section.
    ///
    /// Fails with `LockOrderViolation` when called out of order.
    pub fn acquire_waiting(&self, section: &ChunkLightSection) -> Result<Option<SectionGuard>, LightError> {
        let pos = section.pos();
        if let Some(held) = self.highest().filter(|&held| pos <= held) {
            log::error!("Light pass waited for {pos} while holding {held}");
            return Err(LightError::LockOrderViolation { held, requested: pos });
        }
        Ok(section.light().try_lock_arc_for(self.wait))
    }

    fn insert(&mut self, pos: SectionPos, guard: Option<SectionGuard>) -> Result<(), LightError> {
        let guard = guard.ok_or(LightError::SectionBusy(pos))?;
        self.held.insert(pos, guard);
        Ok(())
    }

    /// The locked storage of `pos`, if held.
    pub fn get_mut(&mut self, pos: SectionPos) -> Option<&mut LightStorage> {
        self.held.get_mut(&pos).map(|guard| &mut **guard)
    }
}
