#![forbid(unsafe_code)]

//! Reactive bindings between in-memory state and URL query parameters.
//!
//! Declare that a reactive value is read from and written to one query
//! parameter — with a default, optional custom coercion, a debounce window
//! and a push-or-replace navigation mode — and the binding keeps the two in
//! sync in both directions:
//!
//! ```
//! use std::rc::Rc;
//! use qbind::{Context, MemoryRouter, QueryStateOptions, Router, bind_query_state};
//!
//! let router = Rc::new(MemoryRouter::new());
//! let ctx = Context::new(router.clone());
//!
//! let page = bind_query_state(&ctx, "page", 1.0, QueryStateOptions::new());
//! page.mount();
//!
//! // Program writes sync to the URL...
//! page.set(3.0);
//! assert_eq!(router.query().encode(), "page=3");
//!
//! // ...and router-driven changes sync back.
//! router.back();
//! assert_eq!(page.get(), 1.0);
//! ```
//!
//! # Architecture
//!
//! - [`coerce`] converts between the query string's text world and the
//!   closed family of supported state types.
//! - [`debounce`] coalesces rapid writes into one trailing navigation.
//! - [`state`] is the sync controller: [`bind_query_state`] wires an
//!   [`Observable`] to a [`Router`] key and returns the owning
//!   [`QueryState`] handle.
//!
//! The reactive primitives live in [`qbind_reactive`](reactive) and the
//! router boundary in [`qbind_router`](router); both are re-exported here.

pub mod coerce;
pub mod debounce;
pub mod state;

pub use qbind_reactive as reactive;
pub use qbind_router as router;

pub use coerce::{
    ParseFn, QueryParam, RawValue, SerializeFn, default_parser, default_serializer, normalize,
};
pub use debounce::Debounced;
pub use state::{Context, QueryState, QueryStateOptions, bind_query_state};

pub use qbind_reactive::{BindingScope, Observable, Subscription, TimerHandle, TimerQueue};
pub use qbind_router::{
    MemoryRouter, NavigationError, NavigationMode, Query, QueryValue, Router,
};
