#![forbid(unsafe_code)]

//! Single-threaded timer service with a virtual clock.
//!
//! A [`TimerQueue`] owns a set of pending one-shot timers and a monotonic
//! virtual clock. The host decides when time passes: call
//! [`advance`](TimerQueue::advance) with an explicit duration (tests,
//! deterministic hosts) or [`tick`](TimerQueue::tick) to advance by real
//! elapsed time on each turn of the host loop. `tick` measures elapsed time
//! with [`web_time::Instant`], so it behaves on `wasm32-unknown-unknown`
//! the same as on native targets.
//!
//! Due timers fire in deadline order, and the clock lands on each timer's
//! deadline as it fires, so a callback reading [`now`](TimerQueue::now)
//! observes its own scheduled time. A callback may schedule further timers;
//! zero-delay timers scheduled from inside a firing callback run within the
//! same `advance` call.
//!
//! Cancellation is RAII: dropping a [`TimerHandle`] (or calling
//! [`cancel`](TimerHandle::cancel)) guarantees the callback never fires.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use web_time::Instant;

/// Shared handle to a timer queue. Clones pump the same queue.
#[derive(Clone)]
pub struct TimerQueue {
    inner: Rc<RefCell<QueueInner>>,
}

struct QueueInner {
    now: Duration,
    last_tick: Option<Instant>,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

struct PendingTimer {
    id: u64,
    deadline: Duration,
    run: Box<dyn FnOnce()>,
}

impl TimerQueue {
    /// Create an empty queue with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(QueueInner {
                now: Duration::ZERO,
                last_tick: None,
                next_id: 0,
                pending: Vec::new(),
            })),
        }
    }

    /// Schedule `run` to fire once, `delay` after the current clock.
    ///
    /// The returned handle cancels the timer when dropped; hold it for as
    /// long as the callback should stay scheduled.
    pub fn schedule(&self, delay: Duration, run: impl FnOnce() + 'static) -> TimerHandle {
        let mut queue = self.inner.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        let deadline = queue.now + delay;
        queue.pending.push(PendingTimer {
            id,
            deadline,
            run: Box::new(run),
        });
        tracing::trace!(id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        TimerHandle {
            queue: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Advance the clock by `by`, firing every timer that falls due.
    ///
    /// Timers fire in deadline order (insertion order on ties); the clock
    /// is set to each deadline as its timer fires and ends at the target.
    /// Callbacks run with no internal borrow held, so they may schedule or
    /// cancel freely.
    pub fn advance(&self, by: Duration) {
        let target = self.inner.borrow().now + by;
        loop {
            let due = {
                let mut queue = self.inner.borrow_mut();
                match queue.pop_due(target) {
                    Some(timer) => timer,
                    None => {
                        queue.now = target;
                        break;
                    }
                }
            };
            (due.run)();
        }
    }

    /// Advance the clock by the real time elapsed since the previous call.
    ///
    /// The first call establishes the epoch and advances by zero (still
    /// firing already-due timers). Intended to be called once per turn of
    /// the host loop.
    pub fn tick(&self) {
        let elapsed = {
            let mut queue = self.inner.borrow_mut();
            let now = Instant::now();
            match queue.last_tick.replace(now) {
                Some(prev) => now.duration_since(prev),
                None => Duration::ZERO,
            }
        };
        self.advance(elapsed);
    }

    /// The current virtual clock reading.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl QueueInner {
    fn pop_due(&mut self, target: Duration) -> Option<PendingTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= target)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        let timer = self.pending.swap_remove(index);
        self.now = timer.deadline;
        Some(timer)
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.inner.borrow();
        f.debug_struct("TimerQueue")
            .field("now", &queue.now)
            .field("pending", &queue.pending.len())
            .finish()
    }
}

/// RAII handle to a scheduled timer. Dropping it cancels the timer.
#[must_use = "dropping this handle cancels the timer"]
pub struct TimerHandle {
    queue: Weak<RefCell<QueueInner>>,
    id: u64,
}

impl TimerHandle {
    /// Cancel the timer if it has not fired yet. Idempotent.
    pub fn cancel(&self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.borrow_mut().pending.retain(|t| t.id != self.id);
        }
    }

    /// Whether the timer is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.queue
            .upgrade()
            .is_some_and(|queue| queue.borrow().pending.iter().any(|t| t.id == self.id))
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn timer_fires_after_advance() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let _handle = timers.schedule(Duration::from_millis(100), move || f.set(true));

        timers.advance(Duration::from_millis(99));
        assert!(!fired.get());

        timers.advance(Duration::from_millis(1));
        assert!(fired.get());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let timers = TimerQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        let _b = timers.schedule(Duration::from_millis(20), move || o.borrow_mut().push("b"));
        let o = Rc::clone(&order);
        let _a = timers.schedule(Duration::from_millis(10), move || o.borrow_mut().push("a"));
        let o = Rc::clone(&order);
        let _c = timers.schedule(Duration::from_millis(30), move || o.borrow_mut().push("c"));

        timers.advance(Duration::from_millis(50));
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_deadlines_fire_in_schedule_order() {
        let timers = TimerQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let o = Rc::clone(&order);
            // Leak the handle: the test wants all three to stay scheduled.
            std::mem::forget(timers.schedule(Duration::from_millis(5), move || {
                o.borrow_mut().push(label);
            }));
        }

        timers.advance(Duration::from_millis(5));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn clock_lands_on_deadline_while_firing() {
        let timers = TimerQueue::new();
        let observed = Rc::new(Cell::new(Duration::ZERO));

        let o = Rc::clone(&observed);
        let q = timers.clone();
        let _handle = timers.schedule(Duration::from_millis(10), move || o.set(q.now()));

        timers.advance(Duration::from_millis(25));
        assert_eq!(observed.get(), Duration::from_millis(10));
        assert_eq!(timers.now(), Duration::from_millis(25));
    }

    #[test]
    fn cancel_prevents_firing() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let handle = timers.schedule(Duration::from_millis(10), move || f.set(true));

        handle.cancel();
        timers.advance(Duration::from_millis(20));
        assert!(!fired.get());
        assert!(!handle.is_pending());
    }

    #[test]
    fn dropping_handle_cancels() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        drop(timers.schedule(Duration::from_millis(10), move || f.set(true)));

        timers.advance(Duration::from_millis(20));
        assert!(!fired.get());
    }

    #[test]
    fn callback_may_schedule_followup() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(0));

        let f = Rc::clone(&fired);
        let q = timers.clone();
        let _handle = timers.schedule(Duration::from_millis(10), move || {
            f.set(f.get() + 1);
            let f2 = Rc::clone(&f);
            std::mem::forget(q.schedule(Duration::from_millis(10), move || f2.set(f2.get() + 1)));
        });

        timers.advance(Duration::from_millis(15));
        assert_eq!(fired.get(), 1, "followup deadline is 20ms, not yet due");

        timers.advance(Duration::from_millis(5));
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn zero_delay_fires_on_zero_advance() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let _handle = timers.schedule(Duration::ZERO, move || f.set(true));

        timers.advance(Duration::ZERO);
        assert!(fired.get());
    }

    #[test]
    fn tick_establishes_epoch_then_advances() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let _handle = timers.schedule(Duration::ZERO, move || f.set(true));

        // First tick advances by zero but still fires already-due timers.
        timers.tick();
        assert!(fired.get());
    }

    #[test]
    fn handle_outliving_queue_is_inert() {
        let fired = Rc::new(Cell::new(false));
        let handle = {
            let timers = TimerQueue::new();
            let f = Rc::clone(&fired);
            timers.schedule(Duration::from_millis(1), move || f.set(true))
        };
        assert!(!handle.is_pending());
        handle.cancel();
        drop(handle);
        assert!(!fired.get());
    }
}
