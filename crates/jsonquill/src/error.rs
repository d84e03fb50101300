use alloc::string::String;

use thiserror::Error;

/// A malformed document, with the 1-based position of the offending byte.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source} at {line}:{column}")]
pub struct ParseError {
    pub(crate) source: SyntaxError,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl ParseError {
    pub(crate) fn at(source: SyntaxError, input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line = 1 + before.iter().filter(|&&b| b == b'\n').count();
        let column = 1 + before
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n')
            .count();
        Self {
            source,
            line,
            column,
        }
    }

    /// The kind of syntax error.
    #[must_use]
    pub fn kind(&self) -> &SyntaxError {
        &self.source
    }

    /// 1-based line of the offending byte.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column (in bytes) of the offending byte.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("invalid escape character '{0}'")]
    InvalidEscape(char),
    #[error("invalid unicode escape sequence")]
    InvalidUnicodeEscape,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("unexpected trailing characters")]
    TrailingCharacters,
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("input is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors surfaced by [`JsonView`](crate::JsonView) mutation and parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ViewError {
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("cannot store non-finite number {0}")]
    NonFinite(f64),
}

/// Errors surfaced by the explicit marshalling entry points of
/// [`JsonEncoder`](crate::JsonEncoder).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("nil value")]
    NilValue,
    #[error("{0}")]
    Marshal(String),
    #[error("table encoding failed: {0}")]
    Table(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    #[error("extractor cannot read fields from {0}")]
    Unsupported(&'static str),
}
