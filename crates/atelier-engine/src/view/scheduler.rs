//! Frame scheduling seam between the stage and the host loop.
//!
//! The stage never paints synchronously on invalidation; it asks the
//! scheduler for a frame callback and paints everything dirty at once when
//! the host calls back. Hosts plug in their own scheduler (vsync timer,
//! event-loop wakeup); tests drive frames by hand.

use std::cell::Cell;
use std::rc::Rc;

/// Requests that the host run a frame soon.
pub trait FrameScheduler {
    fn schedule_frame(&self);
}

/// Test and headless scheduler: counts requests, the caller decides when a
/// frame actually runs.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    requests: Rc<Cell<usize>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for observing requests after the scheduler is boxed away.
    #[inline]
    pub fn request_counter(&self) -> Rc<Cell<usize>> {
        self.requests.clone()
    }

    #[inline]
    pub fn requested_frames(&self) -> usize {
        self.requests.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_requests_through_clones() {
        let scheduler = ManualScheduler::new();
        let counter = scheduler.request_counter();
        let boxed: Box<dyn FrameScheduler> = Box::new(scheduler);
        boxed.schedule_frame();
        boxed.schedule_frame();
        assert_eq!(counter.get(), 2);
    }
}
