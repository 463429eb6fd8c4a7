#![forbid(unsafe_code)]

//! Two-way sync between a reactive cell and a query parameter.
//!
//! [`bind_query_state`] wires an [`Observable`] to one query-string key
//! through a [`Router`]:
//!
//! - program writes to the cell serialize into an updated query and are
//!   submitted as a push or replace navigation (optionally debounced);
//! - router-driven query changes (back/forward, other bindings) parse back
//!   into the cell.
//!
//! The returned [`QueryState`] owns the whole arrangement: dropping it
//! detaches both observers and cancels any pending debounced navigation.
//!
//! # Lifecycle
//!
//! A binding starts unmounted: the cell holds the default and both
//! observers are live, but the URL has not been read. [`QueryState::mount`]
//! performs the one-shot initial read — hosts call it from their
//! view-mounted hook. After that the binding is in steady state until drop.
//!
//! # Convergence
//!
//! Query-driven cell updates carry an origin tag that suppresses the
//! mirrored cell→query write, the write path skips navigation when the
//! recomputed query equals the current one, and setting an observable to an
//! equal value is already a no-op. With the built-in coercions every sync
//! therefore settles immediately. A custom parse/serialize pair for which
//! `serialize(parse(x))` never reaches a fixed point can still ping-pong —
//! that hazard comes with replacing the coercions wholesale.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Navigation rejected | guard, closed router | logged at debug, dropped |
//! | Unparseable query text | user-edited URL | cell falls back per coercion rules |
//! | Panic in custom parse/serialize | caller bug | propagates |

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use qbind_reactive::{BindingScope, Observable, Subscription, TimerQueue};
use qbind_router::{NavigationMode, Query, Router};

use crate::coerce::{
    ParseFn, QueryParam, RawValue, SerializeFn, default_parser, default_serializer, normalize,
};
use crate::debounce::Debounced;

/// Explicit host handles a binding is created against: the router plus the
/// timer queue debounced writes schedule on.
#[derive(Clone)]
pub struct Context {
    router: Rc<dyn Router>,
    timers: TimerQueue,
}

impl Context {
    /// Create a context with its own timer queue.
    #[must_use]
    pub fn new(router: Rc<dyn Router>) -> Self {
        Self {
            router,
            timers: TimerQueue::new(),
        }
    }

    /// Create a context sharing an existing timer queue (hosts that already
    /// pump one).
    #[must_use]
    pub fn with_timers(router: Rc<dyn Router>, timers: TimerQueue) -> Self {
        Self { router, timers }
    }

    /// The router handle.
    #[must_use]
    pub fn router(&self) -> &Rc<dyn Router> {
        &self.router
    }

    /// The timer queue. Hosts pump this to make debounced writes fire.
    #[must_use]
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("timers", &self.timers)
            .finish_non_exhaustive()
    }
}

/// Configuration for one binding.
///
/// ```
/// use std::time::Duration;
/// use qbind::QueryStateOptions;
///
/// let options: QueryStateOptions<f64> = QueryStateOptions::new()
///     .replace(true)
///     .debounce(Duration::from_millis(150));
/// ```
pub struct QueryStateOptions<T> {
    parse: Option<ParseFn<T>>,
    serialize: Option<SerializeFn<T>>,
    replace: bool,
    debounce: Duration,
}

impl<T> QueryStateOptions<T> {
    /// Defaults: derived coercion, push navigation, no debounce.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parse: None,
            serialize: None,
            replace: false,
            debounce: Duration::ZERO,
        }
    }

    /// Replace the derived parser. The closure receives the normalized
    /// query input (`None` when the key is absent).
    #[must_use]
    pub fn parse(mut self, parse: impl Fn(Option<&RawValue>) -> T + 'static) -> Self {
        self.parse = Some(Rc::new(parse));
        self
    }

    /// Replace the derived serializer. Returning `None` omits the key.
    #[must_use]
    pub fn serialize(mut self, serialize: impl Fn(&T) -> Option<RawValue> + 'static) -> Self {
        self.serialize = Some(Rc::new(serialize));
        self
    }

    /// Navigate with `Replace` instead of `Push` (default: push).
    #[must_use]
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Debounce outgoing navigations by `delay`. Zero (the default) means
    /// writes navigate synchronously.
    #[must_use]
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }
}

impl<T> Default for QueryStateOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for QueryStateOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryStateOptions")
            .field("parse", if self.parse.is_some() { &"custom" } else { &"derived" })
            .field(
                "serialize",
                if self.serialize.is_some() { &"custom" } else { &"derived" },
            )
            .field("replace", &self.replace)
            .field("debounce", &self.debounce)
            .finish()
    }
}

enum Sink<T: 'static> {
    Direct(Rc<dyn Fn(T)>),
    Debounced(Debounced<T>),
}

/// A reactive cell bound to one query parameter.
///
/// Created by [`bind_query_state`]. Reads and writes go through the inner
/// [`Observable`]; dropping the handle tears the binding down (observers
/// detached, pending debounce cancelled).
pub struct QueryState<T: QueryParam> {
    state: Observable<T>,
    router: Rc<dyn Router>,
    key: String,
    parse: ParseFn<T>,
    origin: Rc<Cell<bool>>,
    mounted: Cell<bool>,
    scope: BindingScope,
}

impl<T: QueryParam> QueryState<T> {
    /// Perform the one-shot initial URL→state read.
    ///
    /// Call from the owning view's mounted hook. Until then the cell holds
    /// the default. A second call is a logged no-op.
    pub fn mount(&self) {
        if self.mounted.replace(true) {
            tracing::debug!(key = %self.key, "mount called more than once; ignoring");
            return;
        }
        let query = self.router.query();
        let raw = normalize(query.get(&self.key));
        let value = (self.parse)(raw.as_ref());
        self.origin.set(true);
        self.state.set(value);
        self.origin.set(false);
    }

    /// Whether [`mount`](QueryState::mount) has run.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// The bound query-parameter name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.state.get()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.state.with(f)
    }

    /// Set the value. A changed value syncs to the query string.
    pub fn set(&self, value: T) {
        self.state.set(value);
    }

    /// Mutate the value in place. A changed value syncs to the query string.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.state.update(f);
    }

    /// Subscribe to value changes (program writes and query-driven alike).
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.state.subscribe(callback)
    }

    /// The underlying observable, for hosts that bind UI to it directly.
    #[must_use]
    pub fn observable(&self) -> &Observable<T> {
        &self.state
    }
}

impl<T: QueryParam + fmt::Debug> fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("key", &self.key)
            .field("value", &self.state.get())
            .field("mounted", &self.mounted.get())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Bind a reactive cell to the query parameter `key`.
///
/// The cell starts at `default` synchronously; call
/// [`QueryState::mount`] once the owning view is up to pull the current
/// URL value in. Both sync directions are live from creation.
///
/// ```
/// use std::rc::Rc;
/// use qbind_router::{MemoryRouter, Router};
/// use qbind::state::{Context, QueryStateOptions, bind_query_state};
///
/// let router = Rc::new(MemoryRouter::new());
/// let ctx = Context::new(router.clone());
///
/// let page = bind_query_state(&ctx, "page", 1.0, QueryStateOptions::new());
/// page.mount();
///
/// page.set(3.0);
/// assert_eq!(router.query().encode(), "page=3");
///
/// router.back();
/// assert_eq!(page.get(), 1.0);
/// ```
pub fn bind_query_state<T: QueryParam>(
    ctx: &Context,
    key: impl Into<String>,
    default: T,
    options: QueryStateOptions<T>,
) -> QueryState<T> {
    let key = key.into();
    let parse = options
        .parse
        .unwrap_or_else(|| default_parser(default.clone()));
    let serialize = options
        .serialize
        .unwrap_or_else(|| default_serializer(default.clone()));
    let mode = if options.replace {
        NavigationMode::Replace
    } else {
        NavigationMode::Push
    };

    let state = Observable::new(default);
    let origin = Rc::new(Cell::new(false));
    let mut scope = BindingScope::new();

    // Cell → query: serialize, rewrite the one key on a fresh snapshot,
    // navigate fire-and-forget.
    let sync = {
        let router = Rc::clone(&ctx.router);
        let key = key.clone();
        move |value: T| {
            let serialized = serialize(&value);
            let current = router.query();
            let mut next = current.clone();
            if should_remove(serialized.as_ref()) {
                next.remove(&key);
            } else if let Some(raw) = serialized {
                next.set(key.clone(), raw);
            }
            if next == current {
                tracing::trace!(key = %key, "query already in sync; skipping navigation");
                return;
            }
            if let Err(error) = router.navigate(next, mode) {
                tracing::debug!(key = %key, %error, "navigation rejected; query update dropped");
            }
        }
    };

    let sink = if options.debounce.is_zero() {
        Sink::Direct(Rc::new(sync))
    } else {
        Sink::Debounced(Debounced::new(&ctx.timers, options.debounce, sync))
    };

    {
        let origin = Rc::clone(&origin);
        scope.subscribe(&state, move |value: &T| {
            if origin.get() {
                return; // query-driven update; the URL is already the source
            }
            match &sink {
                Sink::Direct(sync) => sync(value.clone()),
                Sink::Debounced(debounced) => debounced.call(value.clone()),
            }
        });
    }

    // Query → cell: normalize, parse, assign under the origin tag.
    {
        let parse = Rc::clone(&parse);
        let origin = Rc::clone(&origin);
        let state = state.clone();
        let key = key.clone();
        scope.hold(ctx.router.on_query_change(Box::new(move |query: &Query| {
            let raw = normalize(query.get(&key));
            let value = parse(raw.as_ref());
            origin.set(true);
            state.set(value);
            origin.set(false);
        })));
    }

    QueryState {
        state,
        router: Rc::clone(&ctx.router),
        key,
        parse,
        origin,
        mounted: Cell::new(false),
        scope,
    }
}

fn should_remove(raw: Option<&RawValue>) -> bool {
    match raw {
        None => true,
        Some(RawValue::Text(s)) => s.trim().is_empty(),
        Some(RawValue::List(items)) => items.is_empty(),
    }
}
