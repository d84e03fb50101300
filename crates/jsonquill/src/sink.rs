use alloc::vec::Vec;
use core::fmt;

use bstr::BStr;

/// Append-only growable byte buffer backing a [`JsonEncoder`].
///
/// Growth is delegated to `Vec<u8>`, so the length never exceeds the capacity
/// and a full buffer reallocates and copies on the next write.
///
/// [`JsonEncoder`]: crate::JsonEncoder
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteSink {
    buf: Vec<u8>,
}

impl ByteSink {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    #[inline]
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The last byte written, if any.
    #[must_use]
    pub fn last(&self) -> Option<u8> {
        self.buf.last().copied()
    }

    /// Current content without copying.
    ///
    /// The slice borrows the sink, so any further write invalidates it; copy it
    /// if a stable snapshot is needed.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Drops the content but keeps the allocation for reuse.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Removes the last byte when it equals `b`. Returns whether it did.
    pub(crate) fn pop_if(&mut self, b: u8) -> bool {
        if self.buf.last() == Some(&b) {
            self.buf.pop();
            true
        } else {
            false
        }
    }

    /// Rolls the content back to an earlier length.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }
}

impl From<Vec<u8>> for ByteSink {
    fn from(buf: Vec<u8>) -> Self {
        Self { buf }
    }
}

impl AsRef<[u8]> for ByteSink {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl fmt::Write for ByteSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl fmt::Debug for ByteSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSink")
            .field("buf", &BStr::new(&self.buf))
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec};
    use core::fmt::Write;

    use super::*;

    #[test]
    fn writes_accumulate() {
        let mut sink = ByteSink::with_capacity(2);
        sink.write_byte(b'a');
        sink.write_str("bc");
        sink.write_bytes(b"de");
        assert_eq!(sink.as_bytes(), b"abcde");
        assert_eq!(sink.len(), 5);
        assert!(sink.capacity() >= sink.len());
    }

    #[test]
    fn reuses_caller_buffer() {
        let mut sink = ByteSink::from(vec![b'[']);
        sink.write_byte(b']');
        assert_eq!(sink.into_inner(), b"[]");
    }

    #[test]
    fn pop_if_only_removes_matching_byte() {
        let mut sink = ByteSink::from(b"1,".to_vec());
        assert!(sink.pop_if(b','));
        assert!(!sink.pop_if(b','));
        assert_eq!(sink.as_bytes(), b"1");
    }

    #[test]
    fn fmt_write_and_debug() {
        let mut sink = ByteSink::new();
        write!(sink, "{}-{:02}", 7, 3).unwrap();
        assert_eq!(sink.as_bytes(), b"7-03");
        assert!(format!("{sink:?}").contains("\"7-03\""));
    }
}
