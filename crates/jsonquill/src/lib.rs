//! Low-level JSON production and consumption for embedded scripting hosts.
//!
//! The crate has three pieces that compose but do not depend on each other's
//! internals:
//!
//! - [`JsonEncoder`] writes JSON text straight into a growable [`ByteSink`]
//!   with explicit key/value primitives. It keeps no structural stack; the
//!   caller pairs every `open_*` with a [`JsonEncoder::close`].
//! - [`JsonView`] wraps a parsed document and hands out scalars or child views
//!   on demand, so only the fields a script touches turn into host values.
//! - [`Extractor`] binds one "get field by name" strategy for a heterogeneous
//!   source and exposes it as [`Extractor::peek`].
//!
//! ```rust
//! use jsonquill::JsonEncoder;
//!
//! let mut enc = JsonEncoder::new();
//! enc.open_object("");
//! enc.k_str("name", "Bob");
//! enc.k_int("age", 30);
//! enc.join("tags", &["a", "b"]);
//! enc.close(b'}');
//! assert_eq!(enc.bytes(), br#"{"name":"Bob","age":30,"tags":["a","b"]}"#);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod document;
mod encoder;
mod error;
mod extract;
mod host;
mod number;
mod options;
mod pretty;
mod sink;
mod view;

#[cfg(test)]
mod tests;

pub use document::NodeKind;
pub use encoder::{EncodeTable, JsonEncoder, MarshalJson, SerializeJson, Value};
pub use error::{EncodeError, ExtractError, ParseError, SyntaxError, ViewError};
pub use extract::{Extractor, Source};
pub use host::{HostValue, KeyIndex, NameIndex, TableIndex};
pub use options::{EncoderOptions, PrettyOptions};
pub use pretty::{pretty, pretty_with};
pub use sink::ByteSink;
pub use view::JsonView;
