use lumi_utils::{BlockPos, SectionPos};

use super::{
    base::{LightAccess, PropagationEngine},
    request::UpdateRequest,
    section_locks::SectionLocks,
    threaded_level_light_engine::EngineShared,
};
use crate::{
    chunk::{
        light_storage::{LightChannel, LightStorage},
        section::{SectionMap, SectionState},
    },
    error::LightError,
    world::BlockView,
};

/// Light access for one pass, locking sections as propagation reaches them.
///
/// Every lock is held until the access is dropped, so no reader sees a half finished pass.
pub struct LockedLightAccess<'a> {
    sections: &'a SectionMap,
    blocks: &'a BlockView,
    locks: SectionLocks,
}

impl<'a> LockedLightAccess<'a> {
    /// Creates an access that holds nothing yet.
    #[must_use]
    pub fn new(sections: &'a SectionMap, blocks: &'a BlockView, locks: SectionLocks) -> Self {
        Self {
            sections,
            blocks,
            locks,
        }
    }

    /// Locks the section a request belongs to.
    ///
    /// Fails with `NotLoaded` once the section has started unloading, so claimed work for it
    /// is dropped like queued work.
    pub fn lock_home(&mut self, section: SectionPos) -> Result<(), LightError> {
        match self.sections.get(section) {
            Some(home) if home.state() == SectionState::Loaded => self.locks.acquire(&home),
            _ => Err(LightError::NotLoaded(section.min_block())),
        }
    }

    fn storage(&mut self, pos: BlockPos) -> Result<&mut LightStorage, LightError> {
        let section = SectionPos::from_block(pos);
        if !self.locks.holds(section) {
            match self.sections.get(section) {
                Some(neighbour) if neighbour.state().is_live() => self.locks.acquire(&neighbour)?,
                _ => return Err(LightError::NotLoaded(pos)),
            }
        }
        self.locks.get_mut(section).ok_or(LightError::NotLoaded(pos))
    }
}

impl LightAccess for LockedLightAccess<'_> {
    fn light(&mut self, pos: BlockPos, channel: LightChannel) -> Result<u8, LightError> {
        Ok(self.storage(pos)?.get(pos, channel))
    }

    fn set_light(&mut self, pos: BlockPos, channel: LightChannel, level: u8) -> Result<(), LightError> {
        self.storage(pos)?.set(pos, channel, level);
        Ok(())
    }

    fn blocks(&self) -> &BlockView {
        self.blocks
    }
}

enum Outcome {
    Done,
    Retry,
}

/// Drains claimed sections from the scheduler.
pub struct LightWorker<'a> {
    shared: &'a EngineShared,
    engine: PropagationEngine,
}

impl<'a> LightWorker<'a> {
    /// Creates a worker over the engine's shared state.
    #[must_use]
    pub fn new(shared: &'a EngineShared) -> Self {
        Self {
            shared,
            engine: PropagationEngine::with_capacity(shared.config.queue_capacity)
                .with_min_section_y(shared.config.min_section_y),
        }
    }

    /// Claims and processes sections until nothing is ready.
    ///
    /// Returns the number of requests consumed. Stops at the first fatal error.
    pub fn drain(&mut self) -> Result<usize, LightError> {
        let mut processed = 0;
        while !self.shared.is_shutting_down() {
            let Some(batch) = self.shared.scheduler.claim(self.shared.config.batch_size) else {
                break;
            };
            let mut requests = batch.requests;
            let mut completed = 0;
            let mut failure = None;

            while let Some(request) = requests.pop_front() {
                match self.process(&request) {
                    Ok(Outcome::Done) => completed += 1,
                    Ok(Outcome::Retry) => {
                        requests.push_front(request);
                        break;
                    }
                    Err(err) => {
                        // The failed request is consumed so the queue cannot wedge on it
                        completed += 1;
                        failure = Some(err);
                        break;
                    }
                }
            }

            self.shared
                .scheduler
                .release(batch.section, completed, requests);
            processed += completed;
            if let Some(err) = failure {
                return Err(err);
            }
        }
        Ok(processed)
    }

    fn process(&mut self, request: &UpdateRequest) -> Result<Outcome, LightError> {
        let home = request.section();
        if !self.shared.config.contains_section(home) {
            log::warn!("Dropping light request outside the world: {request:?}");
            return Ok(Outcome::Done);
        }

        let _span = tracing::trace_span!("light_pass", section = %home).entered();
        let mut access = LockedLightAccess::new(
            &self.shared.sections,
            &self.shared.blocks,
            SectionLocks::new(self.shared.config.lock_wait()),
        );

        if let UpdateRequest::SectionUnloaded(section) = *request {
            if !self.shared.sections.retire(section) {
                log::debug!("{section} was reloaded before it was retired");
                return Ok(Outcome::Done);
            }
        } else {
            match access.lock_home(home) {
                Ok(()) => {}
                Err(LightError::SectionBusy(_)) => return Ok(Outcome::Retry),
                Err(LightError::NotLoaded(_)) => {
                    log::trace!("Dropping light request for unloaded {home}: {request:?}");
                    return Ok(Outcome::Done);
                }
                Err(err) => return Err(err),
            }
        }

        let stats = self.engine.process(&mut access, request)?;
        debug_assert!(!self.engine.has_work());
        // Release every section before handing work back
        drop(access);

        for deferred in self.engine.take_deferred() {
            self.shared.enqueue_derived(deferred);
        }
        log::trace!(
            "{request:?} done: {} increases, {} decreases, {} deferred",
            stats.increases,
            stats.decreases,
            stats.deferred
        );
        Ok(Outcome::Done)
    }
}
