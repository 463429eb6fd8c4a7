#![forbid(unsafe_code)]

//! In-memory [`Router`] for headless hosts and tests.
//!
//! [`MemoryRouter`] keeps a browser-style history stack of [`Query`]
//! snapshots: `Push` truncates any forward entries and appends, `Replace`
//! rewrites the current entry, [`back`](MemoryRouter::back) and
//! [`forward`](MemoryRouter::forward) move the cursor. Every applied change
//! notifies `on_query_change` subscribers synchronously.
//!
//! A navigation guard can be installed to model guarded routes
//! ([`set_guard`](MemoryRouter::set_guard)); a rejecting guard surfaces as
//! [`NavigationError::Blocked`]. [`close`](MemoryRouter::close) models host
//! teardown: every later navigation fails with
//! [`NavigationError::Closed`].

use std::cell::{Cell, RefCell};
use std::fmt;

use qbind_reactive::{Observable, Subscription};

use crate::query::Query;
use crate::{NavigationError, NavigationMode, Router};

/// Predicate deciding whether a `(from, to)` transition may proceed.
pub type NavigationGuard = Box<dyn Fn(&Query, &Query) -> bool>;

/// An in-memory router with a history stack.
pub struct MemoryRouter {
    history: RefCell<Vec<Query>>,
    cursor: Cell<usize>,
    guard: RefCell<Option<NavigationGuard>>,
    closed: Cell<bool>,
    current: Observable<Query>,
}

impl MemoryRouter {
    /// Create a router whose history starts with an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::with_query(Query::new())
    }

    /// Create a router whose history starts at `query`.
    #[must_use]
    pub fn with_query(query: Query) -> Self {
        Self {
            history: RefCell::new(vec![query.clone()]),
            cursor: Cell::new(0),
            guard: RefCell::new(None),
            closed: Cell::new(false),
            current: Observable::new(query),
        }
    }

    /// Move one entry back in history. Returns whether the cursor moved.
    pub fn back(&self) -> bool {
        self.step(-1)
    }

    /// Move one entry forward in history. Returns whether the cursor moved.
    pub fn forward(&self) -> bool {
        self.step(1)
    }

    /// Install a navigation guard; replaces any previous guard.
    pub fn set_guard(&self, guard: impl Fn(&Query, &Query) -> bool + 'static) {
        *self.guard.borrow_mut() = Some(Box::new(guard));
    }

    /// Remove the navigation guard.
    pub fn clear_guard(&self) {
        *self.guard.borrow_mut() = None;
    }

    /// Refuse all further navigations and history moves.
    pub fn close(&self) {
        self.closed.set(true);
    }

    /// Number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    /// Current cursor position within the history (0-based).
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.get()
    }

    fn step(&self, delta: isize) -> bool {
        if self.closed.get() {
            return false;
        }
        let cursor = self.cursor.get() as isize + delta;
        let len = self.history.borrow().len() as isize;
        if cursor < 0 || cursor >= len {
            return false;
        }
        let cursor = cursor as usize;
        self.cursor.set(cursor);
        let query = self.history.borrow()[cursor].clone();
        tracing::trace!(cursor, query = %query, "history move");
        self.current.set(query);
        true
    }
}

impl Router for MemoryRouter {
    fn query(&self) -> Query {
        self.current.get()
    }

    fn navigate(&self, query: Query, mode: NavigationMode) -> Result<(), NavigationError> {
        if self.closed.get() {
            return Err(NavigationError::Closed);
        }
        if let Some(guard) = self.guard.borrow().as_ref() {
            let from = self.current.get();
            if !guard(&from, &query) {
                tracing::debug!(to = %query, "navigation blocked by guard");
                return Err(NavigationError::Blocked);
            }
        }

        {
            let mut history = self.history.borrow_mut();
            let cursor = self.cursor.get();
            match mode {
                NavigationMode::Push => {
                    history.truncate(cursor + 1);
                    history.push(query.clone());
                    self.cursor.set(cursor + 1);
                }
                NavigationMode::Replace => {
                    history[cursor] = query.clone();
                }
            }
        }
        tracing::trace!(?mode, query = %query, "navigated");
        self.current.set(query);
        Ok(())
    }

    fn on_query_change(&self, callback: Box<dyn Fn(&Query)>) -> Subscription {
        self.current.subscribe(move |query| callback(query))
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRouter")
            .field("history_len", &self.history.borrow().len())
            .field("position", &self.cursor.get())
            .field("closed", &self.closed.get())
            .finish()
    }
}
