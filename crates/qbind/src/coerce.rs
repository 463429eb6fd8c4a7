#![forbid(unsafe_code)]

//! Value coercion between query strings and typed state.
//!
//! The query string side of a binding only knows text. This module converts
//! between that external representation and the closed family of supported
//! state types: `String`, `bool`, `f64`, `i64`, `Vec<String>`, `Vec<f64>`,
//! `Vec<i64>` and `Option<String>` (nullable text). The family is sealed —
//! the coercion rules below are the contract, and a type outside the family
//! has no meaningful query representation.
//!
//! Two layers:
//!
//! - [`normalize`] turns a router-reported [`QueryValue`] into the
//!   [`RawValue`] form parsers consume: valueless entries become absent,
//!   valueless occurrences inside a repeated key are dropped.
//! - [`QueryParam`] gives each supported type its `decode`/`encode` rules;
//!   [`default_parser`] and [`default_serializer`] wrap them into the
//!   closures a binding actually runs, closing over the default value.
//!
//! # Coercion rules
//!
//! Decoding (absent input always yields the default):
//!
//! - numbers parse as decimal, falling back to the default on any failure;
//!   a singleton list parses as its one element, a longer list falls back
//! - `bool` is `true` iff the input is exactly the text `"true"`
//! - list types wrap a scalar into a singleton; numeric lists drop
//!   elements that fail to parse
//! - `String`/`Option<String>` pass text through; from a list they take
//!   the first element
//!
//! Encoding:
//!
//! - a value **structurally equal** to the default encodes to `None`
//!   ("omit from the query string") — distinct-but-equal lists count as
//!   default; this is an explicit, tested contract
//! - `bool` encodes as `"true"`/`"false"`, numbers as decimal text
//!   (round-trippable), lists element-wise, `Option::None` as `None`
//!
//! Custom parse/serialize closures supplied through binding options fully
//! replace these defaults; no merging.

use std::rc::Rc;

use qbind_router::QueryValue;

/// Normalized query input handed to parsers.
///
/// Absence is represented as `Option::None` at the call site, so a parser
/// receives `Option<&RawValue>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawValue {
    /// A single textual value.
    Text(String),
    /// A repeated parameter, valueless occurrences already dropped.
    List(Vec<String>),
}

impl From<RawValue> for QueryValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Text(s) => QueryValue::Text(s),
            RawValue::List(items) => QueryValue::List(items.into_iter().map(Some).collect()),
        }
    }
}

/// Parser closure: normalized query input to typed value.
pub type ParseFn<T> = Rc<dyn Fn(Option<&RawValue>) -> T>;

/// Serializer closure: typed value to query output; `None` omits the key.
pub type SerializeFn<T> = Rc<dyn Fn(&T) -> Option<RawValue>>;

/// Normalize a router-reported entry into parser input.
///
/// Valueless entries (`?flag`, or an absent key) map to `None`; valueless
/// occurrences inside a repeated key are filtered out.
#[must_use]
pub fn normalize(value: Option<&QueryValue>) -> Option<RawValue> {
    match value {
        None | Some(QueryValue::Null) => None,
        Some(QueryValue::Text(s)) => Some(RawValue::Text(s.clone())),
        Some(QueryValue::List(items)) => Some(RawValue::List(
            items.iter().flatten().cloned().collect(),
        )),
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A type that can live on both sides of a query-string binding.
///
/// Sealed: the supported family is `String`, `bool`, `f64`, `i64`,
/// `Vec<String>`, `Vec<f64>`, `Vec<i64>` and `Option<String>`.
pub trait QueryParam: Clone + PartialEq + sealed::Sealed + 'static {
    /// Decode a present raw value, falling back to `default` where the
    /// input does not coerce.
    fn decode(raw: &RawValue, default: &Self) -> Self;

    /// Encode into a raw query value; `None` means "omit the key".
    fn encode(&self) -> Option<RawValue>;
}

impl sealed::Sealed for String {}
impl QueryParam for String {
    fn decode(raw: &RawValue, default: &Self) -> Self {
        match raw {
            RawValue::Text(s) => s.clone(),
            RawValue::List(items) => items.first().cloned().unwrap_or_else(|| default.clone()),
        }
    }

    fn encode(&self) -> Option<RawValue> {
        Some(RawValue::Text(self.clone()))
    }
}

impl sealed::Sealed for Option<String> {}
impl QueryParam for Option<String> {
    fn decode(raw: &RawValue, default: &Self) -> Self {
        match raw {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::List(items) => match items.first() {
                Some(first) => Some(first.clone()),
                None => default.clone(),
            },
        }
    }

    fn encode(&self) -> Option<RawValue> {
        self.as_ref().map(|s| RawValue::Text(s.clone()))
    }
}

impl sealed::Sealed for bool {}
impl QueryParam for bool {
    fn decode(raw: &RawValue, _default: &Self) -> Self {
        matches!(raw, RawValue::Text(s) if s == "true")
    }

    fn encode(&self) -> Option<RawValue> {
        let text = if *self { "true" } else { "false" };
        Some(RawValue::Text(text.to_owned()))
    }
}

impl sealed::Sealed for Vec<String> {}
impl QueryParam for Vec<String> {
    fn decode(raw: &RawValue, _default: &Self) -> Self {
        match raw {
            RawValue::Text(s) => vec![s.clone()],
            RawValue::List(items) => items.clone(),
        }
    }

    fn encode(&self) -> Option<RawValue> {
        Some(RawValue::List(self.clone()))
    }
}

macro_rules! numeric_query_param {
    ($ty:ty) => {
        impl sealed::Sealed for $ty {}
        impl QueryParam for $ty {
            fn decode(raw: &RawValue, default: &Self) -> Self {
                let text = match raw {
                    RawValue::Text(s) => Some(s.as_str()),
                    RawValue::List(items) if items.len() == 1 => Some(items[0].as_str()),
                    RawValue::List(_) => None,
                };
                text.and_then(|s| s.trim().parse::<$ty>().ok())
                    .unwrap_or(*default)
            }

            fn encode(&self) -> Option<RawValue> {
                Some(RawValue::Text(self.to_string()))
            }
        }

        impl sealed::Sealed for Vec<$ty> {}
        impl QueryParam for Vec<$ty> {
            fn decode(raw: &RawValue, _default: &Self) -> Self {
                let items: Vec<&str> = match raw {
                    RawValue::Text(s) => vec![s.as_str()],
                    RawValue::List(items) => items.iter().map(String::as_str).collect(),
                };
                // Unparseable elements are dropped, not kept as NaN: the
                // sync controller relies on PartialEq to detect settled
                // state, and NaN is never equal to itself.
                items
                    .into_iter()
                    .filter_map(|s| s.trim().parse::<$ty>().ok())
                    .collect()
            }

            fn encode(&self) -> Option<RawValue> {
                Some(RawValue::List(self.iter().map(|v| v.to_string()).collect()))
            }
        }
    };
}

numeric_query_param!(f64);
numeric_query_param!(i64);

/// Build the default parser for `default`'s type.
///
/// Absent input yields the default; present input decodes per the
/// [`QueryParam`] rules, falling back to the default where coercion fails.
pub fn default_parser<T: QueryParam>(default: T) -> ParseFn<T> {
    Rc::new(move |raw| match raw {
        None => default.clone(),
        Some(raw) => T::decode(raw, &default),
    })
}

/// Build the default serializer for `default`'s type.
///
/// A value structurally equal to the default serializes to `None`, keeping
/// default-valued state out of the URL.
pub fn default_serializer<T: QueryParam>(default: T) -> SerializeFn<T> {
    Rc::new(move |value| {
        if *value == default {
            return None;
        }
        value.encode()
    })
}
