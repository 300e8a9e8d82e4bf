//! The light engine as seen by the world: notifications in, light queries out.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Context;
use lumi_utils::{BlockPos, SectionPos, math::Vector3};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{request::UpdateRequest, scheduler::UpdateScheduler, worker::LightWorker};
use crate::{
    chunk::{
        light_storage::{LightChannel, LightStorage},
        section::{LoadOutcome, SectionMap, SectionState},
    },
    config::LightConfig,
    error::LightError,
    world::{BlockView, LumiWorld},
};

/// State shared between the engine handle and its workers.
pub struct EngineShared {
    pub(crate) config: LightConfig,
    pub(crate) sections: SectionMap,
    pub(crate) blocks: BlockView,
    pub(crate) scheduler: UpdateScheduler,
    fatal: Mutex<Option<LightError>>,
    shutting_down: AtomicBool,
}

impl EngineShared {
    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Queues work produced by a pass, dropping it if its section is gone.
    pub(crate) fn enqueue_derived(&self, request: UpdateRequest) {
        if self.sections.is_live(request.section()) {
            self.scheduler.enqueue(request);
        } else {
            log::trace!("Dropping derived request for unloaded section: {request:?}");
        }
    }

    fn record_fatal(&self, err: LightError) {
        log::error!("Light worker stopped: {err}");
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(err);
        }
    }

    fn has_fatal(&self) -> bool {
        self.fatal.lock().is_some()
    }
}

/// The light engine.
///
/// Notifications only enqueue and never block. Work runs on a rayon pool of
/// `worker_threads` threads, or on the caller's thread through [`run_pending`](Self::run_pending)
/// when the pool size is 0.
pub struct ThreadedLevelLightEngine {
    shared: Arc<EngineShared>,
    pool: Option<ThreadPool>,
    active_workers: Arc<AtomicUsize>,
}

impl ThreadedLevelLightEngine {
    /// Creates an engine reading block data from `world`.
    pub fn new(world: Arc<dyn LumiWorld>, config: LightConfig) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let pool = if config.worker_threads == 0 {
            None
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.worker_threads)
                .thread_name(|index| format!("lumi-light-{index}"))
                .build()
                .context("failed to build the light worker pool")?;
            Some(pool)
        };

        let blocks = BlockView::new(world, config.has_sky, config.sky_light_level);
        log::debug!(
            "Light engine started with {} workers, sky: {}",
            config.worker_threads,
            config.has_sky
        );
        Ok(Self {
            shared: Arc::new(EngineShared {
                config,
                sections: SectionMap::new(),
                blocks,
                scheduler: UpdateScheduler::new(),
                fatal: Mutex::new(None),
                shutting_down: AtomicBool::new(false),
            }),
            pool,
            active_workers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The configuration the engine runs with.
    #[must_use]
    pub fn config(&self) -> &LightConfig {
        &self.shared.config
    }

    /// Reports that the block at `pos` changed.
    ///
    /// # Arguments
    /// * `pos` - The changed block
    /// * `old_opacity` - Opacity before the change
    /// * `old_emission` - Emission before the change
    ///
    /// Returns whether the request was accepted. Blocks outside loaded sections are ignored.
    pub fn notify_block_changed(&self, pos: BlockPos, old_opacity: u8, old_emission: u8) -> bool {
        let section = SectionPos::from_block(pos);
        if !self.accepts(section) {
            return false;
        }
        self.submit(UpdateRequest::BlockChanged {
            pos,
            old_opacity,
            old_emission,
        });
        true
    }

    /// Reports that a section's block data became available.
    ///
    /// Loading a section that is already loaded re-seeds it.
    pub fn notify_section_loaded(&self, section: SectionPos) -> bool {
        self.load(section, None)
    }

    /// Reports that a section became available together with previously stored light.
    ///
    /// The stored light is corrected by the following seeding pass. It is ignored when the
    /// section is already loaded.
    pub fn notify_section_loaded_with_light(&self, section: SectionPos, light: LightStorage) -> bool {
        self.load(section, Some(light))
    }

    fn load(&self, section: SectionPos, light: Option<LightStorage>) -> bool {
        if !self.in_bounds(section) {
            return false;
        }
        match self.shared.sections.load(section, light) {
            Ok(outcome) => {
                if outcome != LoadOutcome::Created {
                    log::debug!("{section} loaded again: {outcome:?}");
                }
                self.submit(UpdateRequest::SectionLoaded(section));
                true
            }
            Err(err) => {
                log::warn!("Could not load light for {section}: {err}");
                false
            }
        }
    }

    /// Reports that a section's block data is going away.
    ///
    /// Pending requests for the section are purged. Its light is retired by a worker.
    pub fn notify_section_unloaded(&self, section: SectionPos) -> bool {
        if !self.in_bounds(section) {
            return false;
        }
        match self.shared.sections.begin_unload(section) {
            Ok(()) => {
                self.submit(UpdateRequest::SectionUnloaded(section));
                true
            }
            Err(err) => {
                log::debug!("Ignoring unload: {err}");
                false
            }
        }
    }

    /// Queues a re-derivation of one block.
    pub fn schedule_recheck(&self, pos: BlockPos, channel: LightChannel) -> bool {
        if !self.accepts(SectionPos::from_block(pos)) {
            return false;
        }
        self.submit(UpdateRequest::Recheck { pos, channel });
        true
    }

    /// Queues a re-derivation of every block in the box spanned by `from` and `to`.
    ///
    /// Returns how many blocks were queued. Blocks in sections that are not loaded are skipped.
    pub fn schedule_recheck_range(&self, channel: LightChannel, from: BlockPos, to: BlockPos) -> usize {
        let (from, to) = (from.0, to.0);
        let min = Vector3::new(from.x.min(to.x), from.y.min(to.y), from.z.min(to.z));
        let max = Vector3::new(from.x.max(to.x), from.y.max(to.y), from.z.max(to.z));
        let mut queued = 0;
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    let pos = BlockPos::new(x, y, z);
                    if self.shared.sections.state(SectionPos::from_block(pos)) == SectionState::Loaded {
                        self.shared
                            .scheduler
                            .enqueue(UpdateRequest::Recheck { pos, channel });
                        queued += 1;
                    }
                }
            }
        }
        if queued > 0 {
            self.kick();
        }
        queued
    }

    /// The stored light at `pos`.
    ///
    /// Waits for a pass that holds the section, so the value never shows a half finished pass.
    /// It may still lag requests that have not run yet.
    pub fn query_light(&self, pos: BlockPos, channel: LightChannel) -> Result<u8, LightError> {
        let section = SectionPos::from_block(pos);
        if !self.shared.config.contains_section(section) {
            return Err(LightError::MalformedRequest(section));
        }
        match self.shared.sections.get(section) {
            Some(light) if light.state().is_live() => Ok(light.light().lock().get(pos, channel)),
            _ => Err(LightError::NotLoaded(pos)),
        }
    }

    /// Whether `section` is loaded, has nothing queued and is not being processed.
    #[must_use]
    pub fn is_section_light_stable(&self, section: SectionPos) -> bool {
        self.shared.sections.state(section) == SectionState::Loaded
            && self.shared.scheduler.is_section_idle(section)
    }

    /// A copy of a live section's light.
    #[must_use]
    pub fn section_snapshot(&self, section: SectionPos) -> Option<LightStorage> {
        self.shared
            .sections
            .get(section)
            .filter(|light| light.state().is_live())
            .map(|light| light.snapshot())
    }

    /// The lifecycle state of `section`.
    #[must_use]
    pub fn section_state(&self, section: SectionPos) -> SectionState {
        self.shared.sections.state(section)
    }

    /// Every loaded section, in lock order.
    #[must_use]
    pub fn loaded_sections(&self) -> Vec<SectionPos> {
        self.shared.sections.positions_in(SectionState::Loaded)
    }

    /// The ambient sky strength.
    #[must_use]
    pub fn sky_light_level(&self) -> u8 {
        self.shared.blocks.sky_light_level()
    }

    /// Changes the ambient sky strength and rechecks every loaded section.
    pub fn set_sky_light_level(&self, level: u8) {
        let previous = self.shared.blocks.set_sky_light_level(level);
        if !self.shared.blocks.has_sky() || previous == self.shared.blocks.sky_light_level() {
            return;
        }
        let sections = self.loaded_sections();
        log::debug!(
            "Sky light changed from {previous} to {}, rechecking {} sections",
            self.shared.blocks.sky_light_level(),
            sections.len()
        );
        for section in sections {
            self.shared
                .scheduler
                .enqueue(UpdateRequest::SectionLoaded(section));
        }
        self.kick();
    }

    /// Requests accepted but not yet finished.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.shared.scheduler.len()
    }

    /// Drains ready requests on the calling thread. Returns how many were consumed.
    pub fn run_pending(&self) -> usize {
        match LightWorker::new(&self.shared).drain() {
            Ok(processed) => processed,
            Err(err) => {
                self.shared.record_fatal(err);
                0
            }
        }
    }

    /// Blocks until every accepted request has finished, or a worker failed.
    pub fn wait_until_idle(&self) {
        if self.pool.is_none() {
            while !self.shared.scheduler.is_empty() && !self.shared.has_fatal() {
                if self.run_pending() == 0 && !self.shared.scheduler.has_ready_work() {
                    break;
                }
            }
            return;
        }
        while !self.shared.scheduler.is_empty() && !self.shared.has_fatal() {
            self.kick();
            self.shared.scheduler.wait_idle(Duration::from_millis(10));
        }
    }

    /// Takes the error that stopped a worker, if any.
    pub fn take_fatal_error(&self) -> Option<LightError> {
        self.shared.fatal.lock().take()
    }

    fn in_bounds(&self, section: SectionPos) -> bool {
        let in_bounds = self.shared.config.contains_section(section);
        if !in_bounds {
            log::warn!("Dropping malformed light request for {section} outside the world");
        }
        in_bounds
    }

    fn accepts(&self, section: SectionPos) -> bool {
        if !self.in_bounds(section) {
            return false;
        }
        match self.shared.sections.state(section) {
            SectionState::Loaded => true,
            SectionState::Unloading => {
                log::debug!("Rejecting light request for unloading {section}");
                false
            }
            SectionState::Unloaded | SectionState::Loading => false,
        }
    }

    fn submit(&self, request: UpdateRequest) {
        self.shared.scheduler.enqueue(request);
        self.kick();
    }

    /// Starts another drain job if the pool has an idle thread.
    fn kick(&self) {
        let Some(pool) = &self.pool else {
            return;
        };
        let limit = pool.current_num_threads();
        if !reserve_worker(&self.active_workers, limit) {
            return;
        }
        let shared = self.shared.clone();
        let active = self.active_workers.clone();
        pool.spawn(move || drain_job(&shared, &active, limit));
    }
}

impl Drop for ThreadedLevelLightEngine {
    fn drop(&mut self) {
        self.shared.shutting_down.store(true, Ordering::Release);
    }
}

fn reserve_worker(active: &AtomicUsize, limit: usize) -> bool {
    active
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
            (count < limit).then_some(count + 1)
        })
        .is_ok()
}

fn drain_job(shared: &EngineShared, active: &AtomicUsize, limit: usize) {
    loop {
        let result = LightWorker::new(shared).drain();
        active.fetch_sub(1, Ordering::AcqRel);
        if let Err(err) = result {
            shared.record_fatal(err);
            return;
        }
        // Work queued after the last claim but before the slot was given back
        if shared.is_shutting_down() || !shared.scheduler.has_ready_work() || !reserve_worker(active, limit) {
            return;
        }
    }
}
