#![forbid(unsafe_code)]

//! Router boundary for qbind.
//!
//! The binding layer never talks to a concrete router. It sees three
//! primitives, gathered here as the [`Router`] trait:
//!
//! - [`Router::query`] — an owned snapshot of the current query parameters,
//! - [`Router::navigate`] — submit an updated query as a push or replace,
//! - [`Router::on_query_change`] — observe router-driven query changes
//!   (back/forward, other bindings, programmatic navigation).
//!
//! [`MemoryRouter`] implements the trait over an in-memory history stack
//! for headless hosts and tests; real hosts wrap their routing library in
//! the same three methods.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | [`NavigationError::Blocked`] | a navigation guard rejected the update | query unchanged, no notification |
//! | [`NavigationError::Closed`] | router torn down | query unchanged, no notification |

pub mod memory;
pub mod query;

pub use memory::MemoryRouter;
pub use query::{Query, QueryValue};

use qbind_reactive::Subscription;

/// How an outgoing navigation manipulates the history stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavigationMode {
    /// Add a new navigable history entry.
    Push,
    /// Overwrite the current history entry.
    Replace,
}

/// Why a navigation was not applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationError {
    /// A navigation guard rejected the transition.
    Blocked,
    /// The router no longer accepts navigations.
    Closed,
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blocked => write!(f, "navigation blocked by guard"),
            Self::Closed => write!(f, "router is closed"),
        }
    }
}

impl std::error::Error for NavigationError {}

/// The three router primitives the binding layer is written against.
///
/// Implementations are single-threaded; callbacks registered through
/// [`on_query_change`](Router::on_query_change) fire synchronously from
/// whatever call applied the change.
pub trait Router {
    /// An owned snapshot of the current query parameters.
    ///
    /// Callers mutate the clone and hand it back to
    /// [`navigate`](Router::navigate); the router's own copy is never
    /// edited in place.
    fn query(&self) -> Query;

    /// Apply an updated query, adding or replacing a history entry.
    ///
    /// # Errors
    ///
    /// - [`NavigationError::Blocked`] if a guard rejected the transition.
    /// - [`NavigationError::Closed`] if the router was shut down.
    fn navigate(&self, query: Query, mode: NavigationMode) -> Result<(), NavigationError>;

    /// Observe query changes. Fires for every applied navigation, including
    /// history moves. Drop the subscription to stop observing.
    fn on_query_change(&self, callback: Box<dyn Fn(&Query)>) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_error_display() {
        assert_eq!(
            NavigationError::Blocked.to_string(),
            "navigation blocked by guard"
        );
        assert_eq!(NavigationError::Closed.to_string(), "router is closed");
    }
}
