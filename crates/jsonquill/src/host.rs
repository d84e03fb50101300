//! Host-side values and the field lookup protocols a scripting runtime exposes.

use alloc::string::String;
use core::fmt;

use crate::{number, view::JsonView};

/// A value handed to or returned from the scripting runtime.
///
/// This is the tagged value that lazy lookups produce and that capability
/// based lookups return. Containers never appear here as materialized trees;
/// they stay behind a [`JsonView`].
#[derive(Clone, Debug, Default)]
pub enum HostValue {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    Int(i64),
    String(String),
    View(JsonView),
}

impl HostValue {
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// The numeric value of a `Number` or `Int`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            #[expect(clippy::cast_precision_loss)]
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_view(&self) -> Option<&JsonView> {
        if let Self::View(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Name of the variant, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::View(_) => "view",
        }
    }
}

/// The runtime's string conversion: `nil`, `true`/`false`, shortest numbers,
/// strings as-is and views as their JSON text.
impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::Number(n) => number::fmt_f64(f, *n),
            Self::Int(n) => f.write_str(itoa::Buffer::new().format(*n)),
            Self::String(s) => f.write_str(s),
            Self::View(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::View(a), Self::View(b)) => a.same_node(b),
            _ => false,
        }
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for HostValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

impl From<String> for HostValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<JsonView> for HostValue {
    fn from(v: JsonView) -> Self {
        Self::View(v)
    }
}

/// Field lookup by string name (the runtime's `__index` with a string key).
pub trait NameIndex<C: ?Sized> {
    fn index(&self, cx: &C, key: &str) -> HostValue;
}

/// Field lookup by an arbitrary key value.
pub trait KeyIndex<C: ?Sized> {
    fn meta(&self, cx: &C, key: &HostValue) -> HostValue;
}

/// Field lookup routed through the value's metatable.
pub trait TableIndex<C: ?Sized> {
    fn meta_table(&self, cx: &C, key: &str) -> HostValue;
}
