//! A [`Scheduler`] backed by a single-threaded `tokio` runtime.
//!
//! Posted events are kept in an ordered queue rather than as one spawned
//! task per event: `Scheduler::post`'s contract ("events posted with equal
//! delay are delivered in post order") is a property of that queue's sort
//! key `(ready_at, post_sequence)`, not of however `tokio` happens to
//! schedule concurrent tasks. `run` drives the queue with
//! `tokio::time::sleep_until` to wait for the next ready entry.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use case_harness::{CancelOutcome, Event, Scheduler, SchedulerError, SchedulerHandle};

struct QueueEntry {
    id: u64,
    ready_at: Instant,
    event: Event,
}

struct Inner {
    next_id: u64,
    queue: Vec<QueueEntry>,
}

/// `tokio`-backed [`Scheduler`]. Not `Send`/`Sync`: it is single-owner,
/// driven from one thread via interior mutability, matching [`Scheduler`]'s
/// `&self` methods.
pub struct TokioScheduler {
    runtime: tokio::runtime::Runtime,
    inner: RefCell<Inner>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("failed to build current-thread tokio runtime");
        TokioScheduler {
            runtime,
            inner: RefCell::new(Inner {
                next_id: 0,
                queue: Vec::new(),
            }),
        }
    }

    /// The earliest-ready entry still in the queue, if any, as `(index, ready_at)`.
    fn next_ready(&self) -> Option<(usize, Instant)> {
        self.inner
            .borrow()
            .queue
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| (e.ready_at, e.id))
            .map(|(i, e)| (i, e.ready_at))
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn init(&self) -> Result<(), SchedulerError> {
        Ok(())
    }

    fn post(&self, event: Event, delay_ms: u32) -> SchedulerHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let ready_at = Instant::now() + Duration::from_millis(u64::from(delay_ms));
        inner.queue.push(QueueEntry { id, ready_at, event });
        SchedulerHandle(id)
    }

    fn cancel(&self, handle: SchedulerHandle) -> CancelOutcome {
        let mut inner = self.inner.borrow_mut();
        match inner.queue.iter().position(|e| e.id == handle.0) {
            Some(pos) => {
                inner.queue.remove(pos);
                CancelOutcome::Removed
            }
            None => CancelOutcome::AlreadyFired,
        }
    }

    fn run(&self, dispatch: &mut dyn FnMut(Event)) {
        let drain = async {
            while let Some((index, ready_at)) = self.next_ready() {
                let now = Instant::now();
                if ready_at > now {
                    tokio::time::sleep_until(tokio::time::Instant::from_std(ready_at)).await;
                }

                let event = self.inner.borrow_mut().queue.remove(index).event;
                let finished = matches!(event, Event::Finished);
                dispatch(event);
                if finished {
                    break;
                }
            }
        };
        self.runtime.block_on(drain);
    }
}
