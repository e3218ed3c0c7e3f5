//! Timers and animation frames behind a small trait so animation chains can be
//! driven by the browser or by virtual time.

use std::cell::RefCell;
use std::collections::BTreeMap;

/// Nominal animation frame length used by frame-stepped animations.
pub const FRAME_INTERVAL_MS: u32 = 16;

pub type Task = Box<dyn FnOnce()>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerHandle {
    Timeout(i32),
    Frame(i32),
}

pub trait Scheduler {
    fn set_timeout(&self, delay_ms: u32, task: Task) -> TimerHandle;

    fn request_frame(&self, task: Task) -> TimerHandle;

    /// Cancelling a handle that already fired is a no-op.
    fn cancel(&self, handle: TimerHandle);
}

/// Deterministic scheduler over virtual milliseconds. Frames are due one
/// `FRAME_INTERVAL_MS` after they are requested.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: u64,
    next_id: i32,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), (TimerHandle, Task)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.state
            .borrow()
            .queue
            .values()
            .filter(|(handle, _)| matches!(handle, TimerHandle::Frame(_)))
            .count()
    }

    /// Moves virtual time forward, running every task that falls due in order.
    /// Tasks scheduled while advancing run too if they land inside the window.
    pub fn advance(&self, ms: u64) {
        let deadline = self.now().saturating_add(ms);

        while let Some(task) = self.pop_due(deadline) {
            task();
        }

        self.state.borrow_mut().now = deadline;
    }

    /// Runs a single animation frame step (advances one frame interval).
    pub fn next_frame(&self) {
        self.advance(u64::from(FRAME_INTERVAL_MS));
    }

    fn pop_due(&self, deadline: u64) -> Option<Task> {
        let mut state = self.state.borrow_mut();
        let key = *state.queue.keys().next()?;
        if key.0 > deadline {
            return None;
        }

        let (_, task) = state.queue.remove(&key)?;
        state.now = key.0;
        Some(task)
    }

    fn push(&self, delay_ms: u32, make_handle: fn(i32) -> TimerHandle, task: Task) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.next_seq += 1;

        let handle = make_handle(state.next_id);
        let due = state.now + u64::from(delay_ms);
        let seq = state.next_seq;
        state.queue.insert((due, seq), (handle, task));
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: u32, task: Task) -> TimerHandle {
        self.push(delay_ms, TimerHandle::Timeout, task)
    }

    fn request_frame(&self, task: Task) -> TimerHandle {
        self.push(FRAME_INTERVAL_MS, TimerHandle::Frame, task)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.state
            .borrow_mut()
            .queue
            .retain(|_, (queued, _)| *queued != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn tasks_run_in_due_order_then_insertion_order() {
        let scheduler = ManualScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(300, "c"), (100, "a"), (100, "b")] {
            let seen = seen.clone();
            scheduler.set_timeout(delay, Box::new(move || seen.borrow_mut().push(label)));
        }

        scheduler.advance(99);
        assert!(seen.borrow().is_empty());

        scheduler.advance(1);
        assert_eq!(*seen.borrow(), vec!["a", "b"]);

        scheduler.advance(500);
        assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.now(), 600);
    }

    #[test]
    fn chained_tasks_scheduled_during_advance_still_run_inside_window() {
        let scheduler = Rc::new(ManualScheduler::new());
        let fired_at = Rc::new(RefCell::new(None));

        {
            let inner_scheduler = scheduler.clone();
            let fired_at = fired_at.clone();
            scheduler.set_timeout(
                100,
                Box::new(move || {
                    let clock = inner_scheduler.clone();
                    inner_scheduler.set_timeout(
                        50,
                        Box::new(move || *fired_at.borrow_mut() = Some(clock.now())),
                    );
                }),
            );
        }

        scheduler.advance(200);
        assert_eq!(*fired_at.borrow(), Some(150));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(RefCell::new(false));

        let handle = {
            let fired = fired.clone();
            scheduler.set_timeout(10, Box::new(move || *fired.borrow_mut() = true))
        };
        scheduler.cancel(handle);
        scheduler.advance(100);

        assert!(!*fired.borrow());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn frames_are_counted_separately_from_timeouts() {
        let scheduler = ManualScheduler::new();
        scheduler.request_frame(Box::new(|| {}));
        scheduler.set_timeout(1_000, Box::new(|| {}));

        assert_eq!(scheduler.pending_frames(), 1);
        scheduler.next_frame();
        assert_eq!(scheduler.pending_frames(), 0);
        assert_eq!(scheduler.pending(), 1);
    }
}
