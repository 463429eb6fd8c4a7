#![forbid(unsafe_code)]

//! Reactive primitives for query-state bindings.
//!
//! This crate provides the change-tracking machinery that `qbind` runs on:
//!
//! - [`Observable`]: a shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`BindingScope`]: collects subscriptions and timer handles for a
//!   logical scope (typically a view), releasing them all on drop.
//! - [`TimerQueue`]: a single-threaded timer service with a virtual clock,
//!   pumped by the host either deterministically ([`TimerQueue::advance`])
//!   or from real elapsed time ([`TimerQueue::tick`]).
//!
//! # Architecture
//!
//! Everything here assumes the single-threaded, cooperative model of a
//! client-side UI host. `Observable<T>` uses `Rc<RefCell<..>>` for shared
//! ownership; there are no locks and no threads. Timer callbacks run on
//! whatever turn of the host loop pumps the queue.
//!
//! # Invariants
//!
//! 1. An observable's version increments exactly once per mutation that
//!    changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. A notification never holds a borrow across a callback: callbacks may
//!    re-enter `set`, subscribe, or unsubscribe.
//! 6. A cancelled or dropped [`TimerHandle`](timer::TimerHandle) guarantees
//!    its callback never fires.

pub mod observable;
pub mod scope;
pub mod timer;

pub use observable::{Observable, Subscription};
pub use scope::BindingScope;
pub use timer::{TimerHandle, TimerQueue};
