//! A deterministic virtual-time [`Scheduler`] for exercising the harness
//! without real delays: `post`'s `delay_ms` advances a virtual clock rather
//! than a wall clock, so a scenario with a 300 ms timeout runs instantly.

use std::cell::RefCell;

use case_harness::{CancelOutcome, Event, Scheduler, SchedulerError, SchedulerHandle};

struct Entry {
    id: u64,
    ready_at: u64,
    event: Event,
}

struct Inner {
    next_id: u64,
    now: u64,
    queue: Vec<Entry>,
}

pub struct VirtualScheduler {
    inner: RefCell<Inner>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        VirtualScheduler {
            inner: RefCell::new(Inner {
                next_id: 0,
                now: 0,
                queue: Vec::new(),
            }),
        }
    }

    /// The virtual clock's current position: how far `run` has advanced it
    /// dispatching events so far. Not every test binary that includes this
    /// shared `support` module uses it.
    #[allow(dead_code)]
    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }
}

impl Scheduler for VirtualScheduler {
    fn init(&self) -> Result<(), SchedulerError> {
        Ok(())
    }

    fn post(&self, event: Event, delay_ms: u32) -> SchedulerHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let ready_at = inner.now + u64::from(delay_ms);
        inner.queue.push(Entry { id, ready_at, event });
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
        loop {
            let next = {
                let inner = self.inner.borrow();
                inner
                    .queue
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| (e.ready_at, e.id))
                    .map(|(i, e)| (i, e.ready_at))
            };
            let (index, ready_at) = match next {
                Some(next) => next,
                None => break,
            };

            let event = {
                let mut inner = self.inner.borrow_mut();
                inner.now = ready_at;
                inner.queue.remove(index).event
            };

            let finished = matches!(event, Event::Finished);
            dispatch(event);
            if finished {
                break;
            }
        }
    }
}
