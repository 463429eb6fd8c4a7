//! End-to-end binding behavior over an in-memory router.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use qbind::{
    Context, MemoryRouter, NavigationMode, Query, QueryStateOptions, QueryValue, RawValue,
    Router, TimerQueue, bind_query_state,
};

fn setup() -> (Rc<MemoryRouter>, Context) {
    let router = Rc::new(MemoryRouter::new());
    let ctx = Context::new(router.clone());
    (router, ctx)
}

fn setup_with(query: &str) -> (Rc<MemoryRouter>, Context) {
    let router = Rc::new(MemoryRouter::with_query(Query::parse(query)));
    let ctx = Context::new(router.clone());
    (router, ctx)
}

#[test]
fn absent_key_mounts_to_default_for_every_type() {
    let (_router, ctx) = setup();

    let text = bind_query_state(&ctx, "a", String::from("home"), QueryStateOptions::new());
    let number = bind_query_state(&ctx, "b", 5.0, QueryStateOptions::new());
    let flag = bind_query_state(&ctx, "c", false, QueryStateOptions::new());
    let tags = bind_query_state(&ctx, "d", vec!["x".to_string()], QueryStateOptions::new());
    let ids = bind_query_state(&ctx, "e", vec![1.5_f64], QueryStateOptions::new());
    let opt = bind_query_state(&ctx, "f", None::<String>, QueryStateOptions::new());

    text.mount();
    number.mount();
    flag.mount();
    tags.mount();
    ids.mount();
    opt.mount();

    assert_eq!(text.get(), "home");
    assert_eq!(number.get(), 5.0);
    assert!(!flag.get());
    assert_eq!(tags.get(), vec!["x".to_string()]);
    assert_eq!(ids.get(), vec![1.5]);
    assert_eq!(opt.get(), None);
}

#[test]
fn typed_values_round_trip_through_the_url() {
    let (router, ctx) = setup();

    let number = bind_query_state(&ctx, "n", 0.0, QueryStateOptions::new());
    number.mount();
    number.set(2.5);

    // A second binding reading the same router sees the same value.
    let other = bind_query_state(&ctx, "n", 0.0, QueryStateOptions::new());
    other.mount();
    assert_eq!(other.get(), 2.5);
    assert_eq!(router.query().encode(), "n=2.5");
}

#[test]
fn boolean_coercion_from_url_text() {
    let (router, ctx) = setup_with("dark=true");
    let dark = bind_query_state(&ctx, "dark", false, QueryStateOptions::new());
    dark.mount();
    assert!(dark.get());

    router
        .navigate(Query::parse("dark=false"), NavigationMode::Push)
        .unwrap();
    assert!(!dark.get());

    router
        .navigate(Query::parse("dark=yes"), NavigationMode::Push)
        .unwrap();
    assert!(!dark.get(), "anything but the literal \"true\" is false");
}

#[test]
fn numeric_fallback_keeps_default() {
    let (_router, ctx) = setup_with("page=abc");
    let page = bind_query_state(&ctx, "page", 5.0, QueryStateOptions::new());
    page.mount();
    assert_eq!(page.get(), 5.0, "unparseable text falls back to the default");
}

#[test]
fn valueless_occurrences_are_filtered_before_parsing() {
    // `?tag=a&tag` reports List([Some("a"), None]); the bare occurrence
    // must be dropped, not parsed.
    let (_router, ctx) = setup_with("tag=a&tag");
    let tags = bind_query_state(&ctx, "tag", Vec::<String>::new(), QueryStateOptions::new());
    tags.mount();
    assert_eq!(tags.get(), vec!["a".to_string()]);
}

#[test]
fn structurally_equal_default_removes_key() {
    let (router, ctx) = setup_with("tag=x");
    let default = vec!["all".to_string()];
    let tags = bind_query_state(&ctx, "tag", default, QueryStateOptions::new());
    tags.mount();
    assert_eq!(tags.get(), vec!["x".to_string()]);

    // A fresh, structurally equal instance counts as the default.
    tags.set(vec!["all".to_string()]);
    assert!(!router.query().contains_key("tag"));
}

#[test]
fn debounced_writes_coalesce_into_one_navigation() {
    let (router, ctx) = setup();
    let navigations = Rc::new(Cell::new(0));
    let n = Rc::clone(&navigations);
    let _sub = router.on_query_change(Box::new(move |_| n.set(n.get() + 1)));

    let q = bind_query_state(
        &ctx,
        "q",
        String::new(),
        QueryStateOptions::new().debounce(Duration::from_millis(100)),
    );
    q.mount();

    q.set("r".into());
    ctx.timers().advance(Duration::from_millis(25));
    q.set("ru".into());
    ctx.timers().advance(Duration::from_millis(25));
    q.set("rust".into());

    assert_eq!(navigations.get(), 0, "nothing fires inside the window");
    ctx.timers().advance(Duration::from_millis(100));

    assert_eq!(navigations.get(), 1, "three writes, one navigation");
    assert_eq!(router.query().encode(), "q=rust");
    assert_eq!(router.history_len(), 2);
}

#[test]
fn dropping_a_binding_cancels_its_pending_debounce() {
    // A host-owned timer queue, shared with the context.
    let timers = TimerQueue::new();
    let router = Rc::new(MemoryRouter::new());
    let ctx = Context::with_timers(router.clone(), timers.clone());

    let q = bind_query_state(
        &ctx,
        "q",
        String::new(),
        QueryStateOptions::new().debounce(Duration::from_millis(100)),
    );
    q.mount();

    q.set("rust".into());
    assert_eq!(timers.pending(), 1);

    drop(q);
    assert_eq!(timers.pending(), 0, "teardown cancels the scheduled write");

    timers.advance(Duration::from_millis(200));
    assert!(router.query().is_empty(), "a disposed binding must not fire");
}

#[test]
fn debounce_window_sees_later_external_state() {
    let (router, ctx) = setup_with("sort=asc");
    let page = bind_query_state(
        &ctx,
        "page",
        1.0,
        QueryStateOptions::new().debounce(Duration::from_millis(50)),
    );
    page.mount();

    page.set(2.0);
    // Another actor rewrites an unrelated key before the window closes.
    router
        .navigate(Query::parse("sort=desc"), NavigationMode::Push)
        .unwrap();
    ctx.timers().advance(Duration::from_millis(50));

    // The debounced write clones the query at fire time, preserving the
    // newer unrelated entry.
    assert_eq!(router.query().encode(), "sort=desc&page=2");
}

#[test]
fn back_and_forward_propagate_into_the_cell() {
    let (router, ctx) = setup();
    let page = bind_query_state(&ctx, "page", 1.0, QueryStateOptions::new());
    page.mount();

    page.set(2.0);
    page.set(3.0);

    router.back();
    assert_eq!(page.get(), 2.0);

    router.back();
    assert_eq!(page.get(), 1.0, "oldest entry has no key; default applies");

    router.forward();
    assert_eq!(page.get(), 2.0);
}

#[test]
fn cell_subscribers_observe_query_driven_updates() {
    let (router, ctx) = setup();
    let page = bind_query_state(&ctx, "page", 1.0, QueryStateOptions::new());
    page.mount();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let _sub = page.subscribe(move |v| s.borrow_mut().push(*v));

    router
        .navigate(Query::parse("page=4"), NavigationMode::Push)
        .unwrap();
    router.back();

    assert_eq!(*seen.borrow(), vec![4.0, 1.0]);
}

#[test]
fn nullable_text_binding_round_trips() {
    let (router, ctx) = setup();
    let filter = bind_query_state(&ctx, "filter", None::<String>, QueryStateOptions::new());
    filter.mount();

    filter.set(Some("open".into()));
    assert_eq!(router.query().encode(), "filter=open");

    filter.set(None);
    assert!(router.query().is_empty(), "None removes the key");
}

#[test]
fn list_binding_writes_repeated_keys() {
    let (router, ctx) = setup();
    let tags = bind_query_state(&ctx, "tag", Vec::<String>::new(), QueryStateOptions::new());
    tags.mount();

    tags.set(vec!["a".into(), "b".into()]);
    assert_eq!(router.query().encode(), "tag=a&tag=b");
    assert_eq!(
        router.query().get("tag"),
        Some(&QueryValue::List(vec![Some("a".into()), Some("b".into())]))
    );
}

#[test]
fn custom_pair_with_stable_fixed_point_converges() {
    // An uppercasing serializer paired with a pass-through parser: stable
    // after one navigation because re-serializing the parsed value yields
    // the same query.
    let (router, ctx) = setup();
    let q = bind_query_state(
        &ctx,
        "q",
        String::new(),
        QueryStateOptions::new()
            .parse(|raw| match raw {
                Some(RawValue::Text(s)) => s.clone(),
                _ => String::new(),
            })
            .serialize(|value: &String| {
                if value.is_empty() {
                    None
                } else {
                    Some(RawValue::Text(value.to_uppercase()))
                }
            }),
    );
    q.mount();

    q.set("rust".into());
    assert_eq!(router.query().encode(), "q=RUST");
    assert_eq!(q.get(), "RUST", "the echoed query re-parses into the cell");
    assert_eq!(
        router.history_len(),
        2,
        "the re-parsed value is origin-tagged and must not navigate again"
    );
}
