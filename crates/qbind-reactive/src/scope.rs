#![forbid(unsafe_code)]

//! Lifecycle scopes for reactive resources.
//!
//! A [`BindingScope`] collects the [`Subscription`]s and [`TimerHandle`]s
//! created on behalf of a logical scope — typically one view — so that
//! tearing the view down releases every observer *and* cancels every
//! pending timer in one place. This is what guarantees a disposed binding
//! cannot fire a stale debounce callback.
//!
//! # Invariants
//!
//! 1. After the scope drops (or [`clear`](BindingScope::clear) runs), none
//!    of its callbacks fire again — subscriptions and timers both.
//! 2. Resources are released in reverse order of registration.
//! 3. A cleared scope is empty and reusable.

use std::fmt;

use crate::observable::{Observable, Subscription};
use crate::timer::TimerHandle;

/// Owns subscriptions and timer handles for one logical scope.
#[derive(Default)]
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
    timers: Vec<TimerHandle>,
}

impl BindingScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold a subscription until the scope is dropped or cleared.
    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Hold a timer handle until the scope is dropped or cleared.
    ///
    /// The timer is cancelled when the scope releases it, whether or not it
    /// has fired.
    pub fn hold_timer(&mut self, handle: TimerHandle) {
        self.timers.push(handle);
    }

    /// Subscribe to an observable within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        let subscription = source.subscribe(callback);
        self.subscriptions.push(subscription);
        self
    }

    /// Number of held resources (subscriptions plus timers).
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len() + self.timers.len()
    }

    /// Whether the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty() && self.timers.is_empty()
    }

    /// Release everything immediately; the scope stays usable.
    pub fn clear(&mut self) {
        while self.timers.pop().is_some() {}
        while self.subscriptions.pop().is_some() {}
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("subscriptions", &self.subscriptions.len())
            .field("timers", &self.timers.len())
            .finish()
    }
}
