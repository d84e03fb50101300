//! Uniform "get field by name" over heterogeneous sources.

use alloc::{
    borrow::ToOwned,
    boxed::Box,
    collections::BTreeMap,
    string::{String, ToString},
};
use core::fmt;

use bstr::ByteSlice;

use crate::{
    error::ExtractError,
    host::{HostValue, KeyIndex, NameIndex, TableIndex},
};

/// Something an [`Extractor`] can read fields from.
///
/// `C` is the runtime context handed to capability based lookups.
pub enum Source<'a, C: ?Sized> {
    /// Looked up by name; the result is stringified.
    Index(&'a dyn NameIndex<C>),
    /// Looked up with the name as a string key value; the result is
    /// stringified.
    Meta(&'a dyn KeyIndex<C>),
    /// Looked up through the metatable; the result is stringified.
    MetaTable(&'a dyn TableIndex<C>),
    /// Missing keys give `""`.
    StrMap(&'a BTreeMap<String, String>),
    /// Values are stringified, missing keys give `""`.
    ValueMap(&'a BTreeMap<String, HostValue>),
    /// Every name gives this string.
    Str(&'a str),
    /// Every name gives these bytes, decoded lossily.
    Bytes(&'a [u8]),
    /// Strings behave like [`Source::Str`] and views like [`Source::Index`].
    /// Other variants are unsupported.
    Host(&'a HostValue),
}

impl<'a, C: ?Sized> From<&'a BTreeMap<String, String>> for Source<'a, C> {
    fn from(v: &'a BTreeMap<String, String>) -> Self {
        Self::StrMap(v)
    }
}

impl<'a, C: ?Sized> From<&'a BTreeMap<String, HostValue>> for Source<'a, C> {
    fn from(v: &'a BTreeMap<String, HostValue>) -> Self {
        Self::ValueMap(v)
    }
}

impl<'a, C: ?Sized> From<&'a str> for Source<'a, C> {
    fn from(v: &'a str) -> Self {
        Self::Str(v)
    }
}

impl<'a, C: ?Sized> From<&'a [u8]> for Source<'a, C> {
    fn from(v: &'a [u8]) -> Self {
        Self::Bytes(v)
    }
}

impl<'a, C: ?Sized> From<&'a HostValue> for Source<'a, C> {
    fn from(v: &'a HostValue) -> Self {
        Self::Host(v)
    }
}

type Lookup<'a> = Box<dyn Fn(&str) -> String + 'a>;

/// A field reader bound to one lookup strategy.
///
/// The strategy is picked once, in [`Extractor::new`], and never changes.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// use jsonquill::{Extractor, Source};
///
/// let mut map = BTreeMap::new();
/// map.insert("x".to_string(), "y".to_string());
/// let ex = Extractor::new(Source::<()>::StrMap(&map), &()).unwrap();
/// assert_eq!(ex.peek("x"), "y");
/// assert_eq!(ex.peek("missing"), "");
/// ```
#[derive(Default)]
pub struct Extractor<'a> {
    function: Option<Lookup<'a>>,
}

impl<'a> Extractor<'a> {
    /// Resolves the lookup strategy for `source`.
    ///
    /// # Errors
    ///
    /// [`ExtractError::Unsupported`] when `source` is a host value other than
    /// a string or a view.
    pub fn new<C: ?Sized>(source: Source<'a, C>, cx: &'a C) -> Result<Self, ExtractError> {
        let function: Lookup<'a> = match source {
            Source::Index(entry) => Box::new(move |key| entry.index(cx, key).to_string()),
            Source::Meta(entry) => Box::new(move |key| entry.meta(cx, &HostValue::from(key)).to_string()),
            Source::MetaTable(entry) => Box::new(move |key| entry.meta_table(cx, key).to_string()),
            Source::StrMap(map) => Box::new(move |key| map.get(key).cloned().unwrap_or_default()),
            Source::ValueMap(map) => Box::new(move |key| map.get(key).map(ToString::to_string).unwrap_or_default()),
            Source::Str(s) => constant(s.to_owned()),
            Source::Bytes(b) => constant(b.to_str_lossy().into_owned()),
            Source::Host(HostValue::String(s)) => constant(s.clone()),
            Source::Host(HostValue::View(view)) => Box::new(move |key| view.get(key).to_string()),
            Source::Host(other) => {
                tracing::debug!(source = other.type_name(), "no field lookup for source");
                return Err(ExtractError::Unsupported(other.type_name()));
            }
        };
        Ok(Self {
            function: Some(function),
        })
    }

    /// The field `name` as a string; `""` when no strategy is bound.
    #[must_use]
    pub fn peek(&self, name: &str) -> String {
        self.function.as_ref().map_or_else(String::new, |f| f(name))
    }
}

fn constant<'a>(value: String) -> Lookup<'a> {
    Box::new(move |_| value.clone())
}

impl fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("bound", &self.function.is_some())
            .finish()
    }
}
