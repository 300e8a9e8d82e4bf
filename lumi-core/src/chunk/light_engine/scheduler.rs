//! Per-section request queues.
//!
//! Enqueueing pushes onto a lock-free inbox and never blocks. Workers move the inbox into
//! per-section FIFO queues (`pump`) and claim whole sections, so at most one worker drains a
//! section at a time and requests touching the same block keep their arrival order.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use crossbeam::queue::SegQueue;
use lumi_utils::SectionPos;
use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};

use super::request::UpdateRequest;

/// Requests taken from one section's queue by one worker.
#[derive(Debug)]
pub struct Batch {
    /// The claimed section.
    pub section: SectionPos,
    /// The claimed requests, in arrival order.
    pub requests: VecDeque<UpdateRequest>,
}

#[derive(Default)]
struct QueueState {
    queues: FxHashMap<SectionPos, VecDeque<UpdateRequest>>,
    /// Sections with queued requests that no worker holds, oldest first.
    ready: VecDeque<SectionPos>,
    claimed: FxHashSet<SectionPos>,
}

/// Orders, coalesces and hands out pending light requests.
pub struct UpdateScheduler {
    inbox: SegQueue<UpdateRequest>,
    state: Mutex<QueueState>,
    /// Requests accepted but not yet completed, coalesced or purged.
    outstanding: AtomicUsize,
    idle: Condvar,
}

impl UpdateScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inbox: SegQueue::new(),
            state: Mutex::new(QueueState::default()),
            outstanding: AtomicUsize::new(0),
            idle: Condvar::new(),
        }
    }

    /// Queues a request without blocking.
    pub fn enqueue(&self, request: UpdateRequest) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.inbox.push(request);
    }

    /// Requests accepted but not yet finished.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Whether every accepted request has finished.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sections that currently have a queue.
    #[must_use]
    pub fn queued_sections(&self) -> usize {
        let mut state = self.state.lock();
        self.pump(&mut state);
        state.queues.len()
    }

    /// Whether a worker could claim something right now.
    #[must_use]
    pub fn has_ready_work(&self) -> bool {
        !self.inbox.is_empty() || !self.state.lock().ready.is_empty()
    }

    /// Whether `section` has nothing queued and no worker holds it.
    #[must_use]
    pub fn is_section_idle(&self, section: SectionPos) -> bool {
        let mut state = self.state.lock();
        self.pump(&mut state);
        !state.claimed.contains(&section) && !state.queues.contains_key(&section)
    }

    /// Claims the oldest ready section and takes up to `max` of its requests.
    pub fn claim(&self, max: usize) -> Option<Batch> {
        let mut state = self.state.lock();
        self.pump(&mut state);
        let section = state.ready.pop_front()?;
        let queue = state.queues.get_mut(&section)?;
        let take = max.max(1).min(queue.len());
        let requests: VecDeque<_> = queue.drain(..take).collect();
        state.claimed.insert(section);
        Some(Batch { section, requests })
    }

    /// Returns a claimed section.
    ///
    /// # Arguments
    /// * `section` - The section from [`claim`](Self::claim)
    /// * `completed` - How many claimed requests were consumed
    /// * `unfinished` - Claimed requests to put back at the front, in order
    pub fn release(&self, section: SectionPos, completed: usize, unfinished: VecDeque<UpdateRequest>) {
        let mut state = self.state.lock();
        state.claimed.remove(&section);

        let has_queue = if let Some(queue) = state.queues.get_mut(&section) {
            for request in unfinished.into_iter().rev() {
                queue.push_front(request);
            }
            !queue.is_empty()
        } else {
            false
        };
        if has_queue {
            state.ready.push_back(section);
        } else {
            state.queues.remove(&section);
        }
        self.finish(completed);
    }

    /// Blocks until every accepted request has finished or `timeout` passes.
    ///
    /// Returns whether the scheduler is idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if self.is_empty() {
            return true;
        }
        self.idle.wait_for(&mut state, timeout);
        self.is_empty()
    }

    fn finish(&self, count: usize) {
        if count == 0 {
            return;
        }
        if self.outstanding.fetch_sub(count, Ordering::AcqRel) == count {
            self.idle.notify_all();
        }
    }

    /// Moves the inbox into section queues. Must be called with the state lock held.
    fn pump(&self, state: &mut QueueState) {
        while let Some(request) = self.inbox.pop() {
            let section = request.section();
            let claimed = state.claimed.contains(&section);
            let queue = state.queues.entry(section).or_default();
            let was_empty = queue.is_empty();

            match request {
                UpdateRequest::SectionUnloaded(_) => {
                    let purged = queue.len();
                    queue.clear();
                    if purged > 0 {
                        log::debug!("Purged {purged} pending light requests for unloading {section}");
                    }
                    self.finish(purged);
                }
                UpdateRequest::BlockChanged { pos, .. } => {
                    // The earliest change still carries the block's original properties
                    let pending = queue.iter().rev().find(|queued| queued.touches(pos));
                    if matches!(pending, Some(UpdateRequest::BlockChanged { .. })) {
                        self.finish(1);
                        continue;
                    }
                }
                _ => {}
            }

            queue.push_back(request);
            if was_empty && !claimed {
                state.ready.push_back(section);
            }
        }
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}
