/// Configuration for [`JsonEncoder`](crate::JsonEncoder).
///
/// # Examples
///
/// ```rust
/// use jsonquill::{EncoderOptions, JsonEncoder};
///
/// let enc = JsonEncoder::with_options(EncoderOptions {
///     capacity: 256,
///     ..Default::default()
/// });
/// assert!(enc.bytes().is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Initial capacity of the backing buffer, in bytes.
    ///
    /// # Default
    ///
    /// `4096`
    pub capacity: usize,

    /// Count `open_*`/`close` calls and `debug_assert!` on a close without a
    /// matching open.
    ///
    /// The encoder never validates nesting otherwise; a mismatched sequence is
    /// the caller's bug and produces malformed output silently.
    ///
    /// # Default
    ///
    /// `false`
    pub track_depth: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            capacity: 4096,
            track_depth: false,
        }
    }
}

/// Layout used by [`pretty`](crate::pretty()).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrettyOptions {
    /// One level of indentation.
    ///
    /// # Default
    ///
    /// Two spaces.
    pub indent: &'static str,

    /// Written at the start of every line.
    ///
    /// # Default
    ///
    /// Empty.
    pub prefix: &'static str,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent: "  ",
            prefix: "",
        }
    }
}
