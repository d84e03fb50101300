//! Streaming JSON encoder.
//!
//! Overview
//! - [`JsonEncoder`] appends JSON text to a [`ByteSink`]. There is no tree and
//!   no structural stack: the caller opens containers with
//!   [`JsonEncoder::open_object`] / [`JsonEncoder::open_array`] and closes them
//!   with [`JsonEncoder::close`], in the right order.
//! - Every keyed or element emission ends with a `,`. [`JsonEncoder::close`]
//!   drops one trailing `,` before writing the closer, which is what keeps the
//!   output well formed without tracking "first element" state.
//! - Text goes through [`JsonEncoder::write_byte`], which escapes exactly five
//!   bytes: `\`, `"`, `\r`, `\n` and `\t`. Everything else, including other
//!   control bytes and multi-byte UTF-8, is copied as is.
//!
//! Dispatch
//! - [`JsonEncoder::v`] and [`JsonEncoder::kv`] take a [`Value`] and pick the
//!   encoding from its variant. The variants are listed, and matched, in
//!   precedence order; the serde fallback comes last.
//! - A failed fallback marshal contributes nothing in the unkeyed path and
//!   degrades to the error message in the keyed path.
//! - In the keyed path, a value that ends up writing nothing takes its key
//!   with it, so the output never holds a dangling `"key":`.

use alloc::{string::ToString, vec::Vec};
use core::fmt;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::Serialize;

use crate::{
    error::EncodeError,
    host::HostValue,
    number,
    options::{EncoderOptions, PrettyOptions},
    pretty,
    sink::ByteSink,
};

pub(crate) const TRUE: &[u8] = b"true";
pub(crate) const FALSE: &[u8] = b"false";

/// A structured host value that encodes itself through a nested encoder.
///
/// Implementations write one complete JSON value; a trailing separator is
/// allowed and is trimmed by the caller.
pub trait EncodeTable {
    /// # Errors
    ///
    /// Any error makes the dispatcher drop the value.
    fn encode_table(&self, enc: &mut JsonEncoder) -> Result<(), EncodeError>;
}

/// A value that produces its own JSON text.
pub trait MarshalJson {
    /// # Errors
    ///
    /// Any error makes the dispatcher drop the value.
    fn marshal_json(&self) -> Result<Vec<u8>, EncodeError>;
}

/// Object-safe bridge to the general purpose marshaller.
///
/// Implemented for every [`Serialize`] type.
pub trait SerializeJson {
    /// # Errors
    ///
    /// Returns [`EncodeError::Marshal`] with the marshaller's message.
    fn to_json_vec(&self) -> Result<Vec<u8>, EncodeError>;
}

impl<T: Serialize + ?Sized> SerializeJson for T {
    fn to_json_vec(&self) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(self).map_err(|e| EncodeError::Marshal(e.to_string()))
    }
}

/// A value for [`JsonEncoder::v`] / [`JsonEncoder::kv`].
///
/// Variants are in dispatch precedence order.
#[derive(Clone, Copy)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    /// A scripting-runtime value. Strings, booleans and numbers encode as
    /// themselves, `nil` as the string `"nil"`, views as their JSON.
    Host(&'a HostValue),
    Table(&'a dyn EncodeTable),
    Bytes(&'a [u8]),
    Strs(&'a [&'a str]),
    List(&'a [Value<'a>]),
    Time(DateTime<FixedOffset>),
    Error(&'a dyn core::error::Error),
    Marshal(&'a dyn MarshalJson),
    Display(&'a dyn fmt::Display),
    Serialize(&'a dyn SerializeJson),
}

impl<'a> Value<'a> {
    pub fn table(v: &'a dyn EncodeTable) -> Self {
        Self::Table(v)
    }

    pub fn error(v: &'a dyn core::error::Error) -> Self {
        Self::Error(v)
    }

    pub fn marshal(v: &'a dyn MarshalJson) -> Self {
        Self::Marshal(v)
    }

    pub fn display(v: &'a dyn fmt::Display) -> Self {
        Self::Display(v)
    }

    pub fn serialize<T: Serialize>(v: &'a T) -> Self {
        Self::Serialize(v)
    }

    pub fn time<Tz: TimeZone>(t: &DateTime<Tz>) -> Self {
        Self::Time(t.fixed_offset())
    }
}

macro_rules! value_from {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value<'_> {
                fn from(v: $t) -> Self {
                    Self::$variant(<$wide>::from(v))
                }
            }
        )*
    };
}

value_from!(Int as i64: i8, i16, i32, i64);
value_from!(Uint as u64: u8, u16, u32, u64);

impl From<isize> for Value<'_> {
    fn from(v: isize) -> Self {
        // isize is at most 64 bits on every supported target.
        Self::Int(v as i64)
    }
}

impl From<usize> for Value<'_> {
    fn from(v: usize) -> Self {
        Self::Uint(v as u64)
    }
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value<'_> {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Self::Str(v)
    }
}

impl<'a> From<&'a alloc::string::String> for Value<'a> {
    fn from(v: &'a alloc::string::String) -> Self {
        Self::Str(v)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Self::Bytes(v)
    }
}

impl<'a> From<&'a [&'a str]> for Value<'a> {
    fn from(v: &'a [&'a str]) -> Self {
        Self::Strs(v)
    }
}

impl<'a> From<&'a [Value<'a>]> for Value<'a> {
    fn from(v: &'a [Value<'a>]) -> Self {
        Self::List(v)
    }
}

impl<'a> From<&'a HostValue> for Value<'a> {
    fn from(v: &'a HostValue) -> Self {
        Self::Host(v)
    }
}

impl From<DateTime<FixedOffset>> for Value<'_> {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::Time(v)
    }
}

impl From<DateTime<Utc>> for Value<'_> {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Time(v.fixed_offset())
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Incremental JSON writer over a [`ByteSink`].
///
/// # Examples
///
/// ```rust
/// use jsonquill::{JsonEncoder, Value};
///
/// let mut enc = JsonEncoder::new();
/// enc.open_array("");
/// enc.v(Value::from(1));
/// enc.v(Value::from("two"));
/// enc.v(Value::Null);
/// enc.close(b']');
/// assert_eq!(enc.bytes(), br#"[1,"two",null]"#);
/// ```
#[derive(Debug, Clone)]
pub struct JsonEncoder {
    sink: ByteSink,
    options: EncoderOptions,
    depth: usize,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonEncoder {
    /// An encoder with a 4 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EncoderOptions::default())
    }

    #[must_use]
    pub fn with_options(options: EncoderOptions) -> Self {
        Self {
            sink: ByteSink::with_capacity(options.capacity),
            options,
            depth: 0,
        }
    }

    /// Continues writing after whatever `sink` already holds.
    #[must_use]
    pub fn with_sink(sink: ByteSink) -> Self {
        Self {
            sink,
            options: EncoderOptions::default(),
            depth: 0,
        }
    }

    /// Writes a byte without escaping. For structural characters.
    #[inline]
    pub fn char(&mut self, ch: u8) {
        self.sink.write_byte(ch);
    }

    /// Writes a byte, escaping `\`, `"`, `\r`, `\n` and `\t`.
    #[inline]
    pub fn write_byte(&mut self, ch: u8) {
        match ch {
            b'\\' => self.sink.write_bytes(b"\\\\"),
            b'\r' => self.sink.write_bytes(b"\\r"),
            b'\n' => self.sink.write_bytes(b"\\n"),
            b'\t' => self.sink.write_bytes(b"\\t"),
            b'"' => self.sink.write_bytes(b"\\\""),
            _ => self.sink.write_byte(ch),
        }
    }

    pub fn write_str(&mut self, val: &str) {
        self.write_bytes(val.as_bytes());
    }

    pub fn write_bytes(&mut self, val: &[u8]) {
        for &b in val {
            self.write_byte(b);
        }
    }

    /// `"key":`
    pub fn key(&mut self, key: &str) {
        self.char(b'"');
        self.write_str(key);
        self.char(b'"');
        self.char(b':');
    }

    /// A quoted, escaped string.
    pub fn val(&mut self, v: &str) {
        self.char(b'"');
        self.write_str(v);
        self.char(b'"');
    }

    /// A quoted string whose content is written verbatim. For fragments that
    /// are already JSON-safe.
    pub fn insert(&mut self, v: &[u8]) {
        self.char(b'"');
        self.sink.write_bytes(v);
        self.char(b'"');
    }

    pub fn int(&mut self, n: i32) {
        number::write_integer(&mut self.sink, n);
    }

    pub fn long(&mut self, n: i64) {
        number::write_integer(&mut self.sink, n);
    }

    pub fn uint(&mut self, n: u32) {
        number::write_integer(&mut self.sink, n);
    }

    pub fn ulong(&mut self, n: u64) {
        number::write_integer(&mut self.sink, n);
    }

    /// Shortest round-trip form; `null` for NaN and infinities.
    pub fn float(&mut self, n: f64) {
        number::write_f64(&mut self.sink, n);
    }

    pub fn bool(&mut self, v: bool) {
        self.sink.write_bytes(if v { TRUE } else { FALSE });
    }

    /// Writes `"name":` when `name` is not empty, then `{`.
    pub fn open_object(&mut self, name: &str) {
        self.open(name, b'{');
    }

    /// Writes `"name":` when `name` is not empty, then `[`.
    pub fn open_array(&mut self, name: &str) {
        self.open(name, b'[');
    }

    fn open(&mut self, name: &str, opener: u8) {
        if !name.is_empty() {
            self.key(name);
        }
        self.char(opener);
        if self.options.track_depth {
            self.depth += 1;
        }
    }

    /// Drops one trailing `,` and writes `closer`.
    pub fn close(&mut self, closer: u8) {
        if self.options.track_depth {
            debug_assert!(self.depth > 0, "close({}) without a matching open", closer as char);
            self.depth = self.depth.saturating_sub(1);
        }
        self.trim_trailing_separator();
        self.char(closer);
    }

    /// Open containers not yet closed. Always zero unless
    /// [`EncoderOptions::track_depth`] is set.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Removes one trailing `,`. Calling it again does nothing.
    pub fn trim_trailing_separator(&mut self) {
        self.sink.pop_if(b',');
    }

    pub fn k_str(&mut self, key: &str, v: &str) {
        self.key(key);
        self.val(v);
        self.char(b',');
    }

    /// Like [`JsonEncoder::k_str`]; the bytes are escaped but not validated.
    pub fn k_bytes(&mut self, key: &str, v: &[u8]) {
        self.key(key);
        self.char(b'"');
        self.write_bytes(v);
        self.char(b'"');
        self.char(b',');
    }

    pub fn k_int(&mut self, key: &str, n: i32) {
        self.key(key);
        self.int(n);
        self.char(b',');
    }

    pub fn k_long(&mut self, key: &str, n: i64) {
        self.key(key);
        self.long(n);
        self.char(b',');
    }

    pub fn k_ulong(&mut self, key: &str, n: u64) {
        self.key(key);
        self.ulong(n);
        self.char(b',');
    }

    pub fn k_f64(&mut self, key: &str, n: f64) {
        self.key(key);
        self.float(n);
        self.char(b',');
    }

    pub fn k_bool(&mut self, key: &str, v: bool) {
        self.key(key);
        self.bool(v);
        self.char(b',');
    }

    pub fn k_true(&mut self, key: &str) {
        self.k_bool(key, true);
    }

    pub fn k_false(&mut self, key: &str) {
        self.k_bool(key, false);
    }

    /// RFC 3339 with nanoseconds. Timestamps whose year is outside
    /// `0..=9999` are skipped entirely, key included.
    pub fn k_time<Tz: TimeZone>(&mut self, key: &str, t: &DateTime<Tz>) {
        if !number::rfc3339_year_in_range(t) {
            return;
        }
        self.key(key);
        self.time(t);
        self.char(b',');
    }

    fn time<Tz: TimeZone>(&mut self, t: &DateTime<Tz>) {
        self.char(b'"');
        number::write_rfc3339_nanos(&mut self.sink, t);
        self.char(b'"');
    }

    /// `"key":["a","b"],`
    pub fn join<S: AsRef<str>>(&mut self, key: &str, items: &[S]) {
        self.key(key);
        self.no_key_join(items);
    }

    /// `["a","b"],` for use as an array element.
    pub fn no_key_join<S: AsRef<str>>(&mut self, items: &[S]) {
        self.char(b'[');
        for item in items {
            self.val(item.as_ref());
            self.char(b',');
        }
        self.trim_trailing_separator();
        self.char(b']');
        self.char(b',');
    }

    /// `"key":[...],` with every element dispatched through [`JsonEncoder::v`].
    pub fn join_any(&mut self, key: &str, items: &[Value<'_>]) {
        self.key(key);
        self.no_key_join_any(items);
    }

    pub fn no_key_join_any(&mut self, items: &[Value<'_>]) {
        self.char(b'[');
        for &item in items {
            self.v(item);
        }
        self.trim_trailing_separator();
        self.char(b']');
        self.char(b',');
    }

    /// `"key":<v>,` where `v` is already JSON. Empty input writes nothing.
    pub fn raw(&mut self, key: &str, v: &[u8]) {
        if v.is_empty() {
            return;
        }
        self.key(key);
        self.sink.write_bytes(v);
        self.char(b',');
    }

    /// `<v>,` where `v` is already JSON. Empty input writes nothing.
    pub fn append(&mut self, v: &[u8]) {
        if v.is_empty() {
            return;
        }
        self.sink.write_bytes(v);
        self.char(b',');
    }

    /// Copies `v` verbatim, no separator.
    pub fn copy_raw(&mut self, v: &[u8]) {
        self.sink.write_bytes(v);
    }

    /// Marshals `v` with the general purpose marshaller and writes it under
    /// `key`.
    ///
    /// # Errors
    ///
    /// [`EncodeError::NilValue`] for `None`, [`EncodeError::Marshal`] when
    /// marshalling fails. Nothing is written on error.
    pub fn marshal<T: Serialize + ?Sized>(&mut self, key: &str, v: Option<&T>) -> Result<(), EncodeError> {
        let v = v.ok_or(EncodeError::NilValue)?;
        let chunk = v.to_json_vec()?;
        self.raw(key, &chunk);
        Ok(())
    }

    /// Writes `v` followed by `,`.
    ///
    /// Values that cannot be encoded (an out-of-range timestamp, a failing
    /// table or marshaller) write nothing.
    pub fn v(&mut self, v: Value<'_>) {
        match v {
            Value::Null => self.v_text(b"null"),
            Value::Bool(b) => self.v_text(if b { TRUE } else { FALSE }),
            Value::Int(n) => {
                self.long(n);
                self.char(b',');
            }
            Value::Uint(n) => {
                self.ulong(n);
                self.char(b',');
            }
            Value::F32(n) => {
                number::write_f32(&mut self.sink, n);
                self.char(b',');
            }
            Value::F64(n) => {
                self.float(n);
                self.char(b',');
            }
            Value::Str(s) => self.v_str(s),
            Value::Host(h) => self.v_host(h),
            Value::Table(t) => {
                if let Some(chunk) = Self::sub_encode(t) {
                    self.append(&chunk);
                }
            }
            Value::Bytes(b) => {
                self.char(b'"');
                self.write_bytes(b);
                self.char(b'"');
                self.char(b',');
            }
            Value::Strs(items) => self.no_key_join(items),
            Value::List(items) => self.no_key_join_any(items),
            Value::Time(t) => {
                if number::rfc3339_year_in_range(&t) {
                    self.time(&t);
                    self.char(b',');
                }
            }
            Value::Error(e) => self.v_str(&e.to_string()),
            Value::Marshal(m) => match m.marshal_json() {
                Ok(chunk) => self.append(&chunk),
                Err(e) => tracing::trace!(error = %e, "dropping value: custom marshal failed"),
            },
            Value::Display(d) => self.v_display(d),
            Value::Serialize(s) => match s.to_json_vec() {
                Ok(chunk) => self.append(&chunk),
                Err(e) => tracing::trace!(error = %e, "dropping value: marshal failed"),
            },
        }
    }

    /// Writes `"key":<v>,`.
    ///
    /// Dispatch matches [`JsonEncoder::v`] except that a failing serde
    /// fallback writes its error message as the value. When nothing would be
    /// written for the value the key is rolled back too.
    pub fn kv(&mut self, key: &str, v: Value<'_>) {
        let mark = self.sink.len();
        self.key(key);
        let body = self.sink.len();
        match v {
            Value::Serialize(s) => match s.to_json_vec() {
                Ok(chunk) => self.append(&chunk),
                Err(e) => {
                    tracing::debug!(key, error = %e, "marshal failed, writing the error instead");
                    self.v_str(&e.to_string());
                }
            },
            other => self.v(other),
        }
        if self.sink.len() == body {
            tracing::debug!(key, "no value written, dropping key");
            self.sink.truncate(mark);
        }
    }

    fn v_text(&mut self, text: &[u8]) {
        self.sink.write_bytes(text);
        self.char(b',');
    }

    fn v_str(&mut self, s: &str) {
        self.val(s);
        self.char(b',');
    }

    fn v_display(&mut self, d: &dyn fmt::Display) {
        self.v_str(&d.to_string());
    }

    fn v_host(&mut self, h: &HostValue) {
        match h {
            HostValue::Nil => self.v_str("nil"),
            HostValue::Bool(b) => self.v_text(if *b { TRUE } else { FALSE }),
            HostValue::Number(n) => {
                self.float(*n);
                self.char(b',');
            }
            HostValue::Int(n) => {
                self.long(*n);
                self.char(b',');
            }
            HostValue::String(s) => self.v_str(s),
            HostValue::View(view) => self.v(Value::Table(view)),
        }
    }

    /// Runs a table through a fresh encoder and returns its text without the
    /// trailing separator.
    fn sub_encode(t: &dyn EncodeTable) -> Option<Vec<u8>> {
        let mut sub = JsonEncoder::with_options(EncoderOptions {
            capacity: 256,
            ..EncoderOptions::default()
        });
        if let Err(e) = t.encode_table(&mut sub) {
            tracing::trace!(error = %e, "dropping value: table encoding failed");
            return None;
        }
        sub.trim_trailing_separator();
        Some(sub.into_bytes())
    }

    /// The encoded bytes so far.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.sink.as_bytes()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.sink.into_inner()
    }

    #[must_use]
    pub fn sink(&self) -> &ByteSink {
        &self.sink
    }

    /// Hands the buffer back, e.g. to start a new encoder over it.
    #[must_use]
    pub fn into_sink(self) -> ByteSink {
        self.sink
    }

    /// An indented copy of the bytes so far.
    #[must_use]
    pub fn pretty(&self) -> Vec<u8> {
        pretty::pretty(self.bytes())
    }

    #[must_use]
    pub fn pretty_with(&self, options: &PrettyOptions) -> Vec<u8> {
        pretty::pretty_with(self.bytes(), options)
    }
}
