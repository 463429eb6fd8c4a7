#![forbid(unsafe_code)]

//! Trailing-edge debounce over a [`TimerQueue`].
//!
//! A [`Debounced<T>`] wraps a sink function. Each [`call`](Debounced::call)
//! cancels any previously scheduled delivery and schedules a new one after
//! the configured delay with the latest value — only the most recent call
//! within a window ever reaches the sink (last write wins; earlier values
//! are discarded, not queued).
//!
//! Dropping the `Debounced` cancels a pending delivery, so a sink can never
//! fire after its owner is gone.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use qbind_reactive::{TimerHandle, TimerQueue};

/// A debounced sink: delivers only the latest value per quiet window.
pub struct Debounced<T: 'static> {
    timers: TimerQueue,
    delay: Duration,
    sink: Rc<dyn Fn(T)>,
    slot: Rc<RefCell<Slot<T>>>,
}

struct Slot<T> {
    latest: Option<T>,
    pending: Option<TimerHandle>,
}

impl<T: 'static> Debounced<T> {
    /// Wrap `sink` with a debounce window of `delay` on `timers`.
    ///
    /// A zero delay still defers delivery to the next queue pump; callers
    /// that want synchronous pass-through for zero should invoke the sink
    /// directly instead of constructing a `Debounced`.
    pub fn new(timers: &TimerQueue, delay: Duration, sink: impl Fn(T) + 'static) -> Self {
        Self {
            timers: timers.clone(),
            delay,
            sink: Rc::new(sink),
            slot: Rc::new(RefCell::new(Slot {
                latest: None,
                pending: None,
            })),
        }
    }

    /// Record `value` and (re)start the delay window.
    ///
    /// Any previously scheduled delivery is cancelled; `value` replaces the
    /// stored one.
    pub fn call(&self, value: T) {
        {
            let mut slot = self.slot.borrow_mut();
            slot.latest = Some(value);
            // Dropping the old handle cancels the previously scheduled run.
            slot.pending = None;
        }

        let sink = Rc::clone(&self.sink);
        let slot_weak = Rc::downgrade(&self.slot);
        let handle = self.timers.schedule(self.delay, move || {
            let Some(slot) = slot_weak.upgrade() else {
                return;
            };
            let value = {
                let mut slot = slot.borrow_mut();
                slot.pending = None;
                slot.latest.take()
            };
            if let Some(value) = value {
                sink(value);
            }
        });
        self.slot.borrow_mut().pending = Some(handle);
    }

    /// Discard the stored value and cancel any pending delivery.
    pub fn cancel(&self) {
        let mut slot = self.slot.borrow_mut();
        slot.latest = None;
        slot.pending = None;
    }

    /// Whether a delivery is currently scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.borrow().pending.is_some()
    }

    /// The configured delay window.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> fmt::Debug for Debounced<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("delay", &self.delay)
            .field("pending", &self.slot.borrow().pending.is_some())
            .finish()
    }
}
