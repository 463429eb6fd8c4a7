#![forbid(unsafe_code)]

//! Version-tracked observable cells.
//!
//! An [`Observable<T>`] is a shared mutable cell that notifies subscribers
//! when its value changes. Clones share the same underlying cell, so any
//! clone can read, write, or subscribe.
//!
//! ```
//! use qbind_reactive::Observable;
//!
//! let count = Observable::new(0);
//! let seen = count.clone();
//! let _sub = count.subscribe(move |v| assert_eq!(*v, seen.get()));
//!
//! count.set(5);
//! assert_eq!(count.get(), 5);
//! assert_eq!(count.version(), 1);
//! ```
//!
//! # Invariants
//!
//! 1. The version increments exactly once per value-changing mutation.
//! 2. Subscribers are notified in registration order.
//! 3. `set` with an equal value is a no-op: no version bump, no
//!    notifications.
//! 4. Dropping a [`Subscription`] removes its callback before the next
//!    notification cycle.
//! 5. No borrow is held across a subscriber callback, so callbacks may
//!    re-enter `set`, subscribe, or drop their own subscription.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A shared, version-tracked value with change notification.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

struct ObservableInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber<T>>>,
}

struct Subscriber<T> {
    id: u64,
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value`, at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                next_id: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Set the value, notifying subscribers if it changed.
    ///
    /// Setting a value equal to the current one is a no-op.
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }
        *self.inner.value.borrow_mut() = value.clone();
        self.inner.version.set(self.inner.version.get() + 1);
        self.notify(&value);
    }

    /// Mutate the value in place, notifying subscribers if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Current version counter. Starts at 0; bumps on every change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Subscribe to value changes.
    ///
    /// The callback fires after each value-changing mutation with a
    /// reference to the new value. Drop the returned [`Subscription`] to
    /// unsubscribe.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push(Subscriber {
            id,
            callback: Rc::new(callback),
        });

        let weak: Weak<ObservableInner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|s| s.id != id);
            }
        })
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn notify(&self, value: &T) {
        // Snapshot the callbacks so subscribers can mutate the list (or the
        // value) from inside a callback without tripping a borrow.
        let callbacks: Vec<Rc<dyn Fn(&T)>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|s| Rc::clone(&s.callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

/// RAII guard for an active subscription.
///
/// Dropping the guard removes the callback. [`Subscription::new`] is public
/// so external event sources (e.g. custom routers) can hand out guards with
/// their own release logic.
#[must_use = "dropping this guard cancels the subscription"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a release action to run once, on drop or [`unsubscribe`].
    ///
    /// [`unsubscribe`]: Subscription::unsubscribe
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Explicitly release the subscription now.
    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
