//! Arena-backed parsed JSON document.
//!
//! Overview
//! - Parsing validates the whole input once and records every value as a
//!   [`Node`] in a flat arena. Containers refer to their children by
//!   [`NodeId`], never by pointer, so a subtree can be attached elsewhere by
//!   rewriting one handle.
//! - String nodes keep their text exactly as it appeared between the quotes.
//!   Escape sequences are decoded only when a caller asks for the decoded form
//!   ([`Document::decoded_str`]); raw reads hand back the escaped text.
//! - Object keys are decoded at parse time because every lookup compares
//!   against them.
//!
//! Invariants
//! - Node ids are indices into `nodes` and are never removed. A scalar
//!   replaced by a scalar reuses its slot ([`Document::set_scalar`]); a
//!   replaced container may still be held by a view, so it stays in the arena
//!   until the document is dropped.
//! - Scalar nodes have exactly one parent slot. Only containers are shared.
//! - Walks over the graph (`contains`, copying, serialization) use an
//!   explicit stack, since `set` can nest deeper than the parser allows.
//! - The node graph is acyclic. A node may have several parents once a
//!   handle is attached in a second place; [`Document::contains`] lets callers
//!   refuse a handle that would point at one of its own ancestors.

use alloc::{boxed::Box, string::String, vec, vec::Vec};
use core::fmt::{self, Write};

use crate::error::{ParseError, SyntaxError};

/// Maximum container nesting accepted by the parser.
pub(crate) const MAX_DEPTH: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The JSON type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Null,
    Bool(bool),
    /// Number literal text as written.
    Number(Box<str>),
    /// String contents between the quotes, escapes not decoded.
    String(Box<str>),
    Array(Vec<NodeId>),
    /// Decoded keys in document order. Duplicate keys are kept; lookups see
    /// the first.
    Object(Vec<(Box<str>, NodeId)>),
}

impl Node {
    pub(crate) fn is_scalar(&self) -> bool {
        !matches!(self, Node::Array(_) | Node::Object(_))
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Node::Null => NodeKind::Null,
            Node::Bool(_) => NodeKind::Bool,
            Node::Number(_) => NodeKind::Number,
            Node::String(_) => NodeKind::String,
            Node::Array(_) => NodeKind::Array,
            Node::Object(_) => NodeKind::Object,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    pub(crate) fn parse(input: &str) -> Result<Self, ParseError> {
        Self::parse_bytes(input.as_bytes())
    }

    pub(crate) fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        if let Err(e) = core::str::from_utf8(input) {
            return Err(ParseError::at(
                SyntaxError::InvalidUtf8,
                input,
                e.valid_up_to(),
            ));
        }
        let mut nodes = Vec::new();
        let root = parse_fragment(input, &mut nodes)?;
        Ok(Self { nodes, root })
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Parses `input` as one more value inside this arena and returns its id.
    /// Nothing is added on error.
    pub(crate) fn parse_into(&mut self, input: &[u8]) -> Result<NodeId, ParseError> {
        let mark = self.nodes.len();
        parse_fragment(input, &mut self.nodes).inspect_err(|_| self.nodes.truncate(mark))
    }

    /// Looks up an object member, or an array element by decimal index.
    pub(crate) fn child(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.node(id) {
            Node::Object(members) => members
                .iter()
                .find(|(k, _)| &**k == key)
                .map(|(_, child)| *child),
            Node::Array(items) => parse_index(key).and_then(|i| items.get(i).copied()),
            _ => None,
        }
    }

    pub(crate) fn element(&self, id: NodeId, index: usize) -> Option<NodeId> {
        match self.node(id) {
            Node::Array(items) => items.get(index).copied(),
            _ => None,
        }
    }

    /// Replaces or inserts `key` in an object, or replaces an in-range array
    /// element. Returns whether anything was attached.
    pub(crate) fn set_child(&mut self, id: NodeId, key: &str, child: NodeId) -> bool {
        match &mut self.nodes[id.index()] {
            Node::Object(members) => {
                match members.iter_mut().find(|(k, _)| &**k == key) {
                    Some((_, slot)) => *slot = child,
                    None => members.push((key.into(), child)),
                }
                true
            }
            Node::Array(items) => match parse_index(key).and_then(|i| items.get_mut(i)) {
                Some(slot) => {
                    *slot = child;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Parses a scalar fragment and assigns it to `key` of `id`.
    ///
    /// When the current child is a scalar its slot is overwritten, so
    /// repeated assignments to one key do not grow the arena. Nothing is
    /// kept when the parent cannot take the child.
    pub(crate) fn set_scalar(&mut self, id: NodeId, key: &str, input: &[u8]) -> Result<(), ParseError> {
        let fresh = self.parse_into(input)?;
        let reusable = self
            .child(id, key)
            .filter(|&old| self.node(old).is_scalar() && self.node(fresh).is_scalar());
        match reusable {
            Some(old) if fresh.index() + 1 == self.nodes.len() => {
                if let Some(node) = self.nodes.pop() {
                    self.nodes[old.index()] = node;
                }
            }
            _ => {
                if !self.set_child(id, key, fresh) {
                    self.nodes.truncate(fresh.index());
                }
            }
        }
        Ok(())
    }

    /// Number of nodes in the arena, reachable or not.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `needle` is `id` or lies somewhere below it.
    pub(crate) fn contains(&self, id: NodeId, needle: NodeId) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if cur == needle {
                return true;
            }
            if core::mem::replace(&mut seen[cur.index()], true) {
                continue;
            }
            match self.node(cur) {
                Node::Array(items) => stack.extend(items.iter().copied()),
                Node::Object(members) => stack.extend(members.iter().map(|&(_, c)| c)),
                _ => {}
            }
        }
        false
    }

    /// Deep-copies the subtree at `id` of `other` into this arena.
    pub(crate) fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        self.copy_subtree(id, |_, src| other.node(src).clone())
    }

    /// Deep-copies a subtree of this arena.
    pub(crate) fn duplicate(&mut self, id: NodeId) -> NodeId {
        self.copy_subtree(id, |this, src| this.node(src).clone())
    }

    /// Allocates a slot per source node before filling it, so children can be
    /// queued without recursion.
    fn copy_subtree(&mut self, id: NodeId, fetch: impl Fn(&Self, NodeId) -> Node) -> NodeId {
        let root = push(&mut self.nodes, Node::Null);
        let mut work = vec![(root, id)];
        while let Some((dst, src)) = work.pop() {
            let fetched = fetch(self, src);
            let mut slot = |child: NodeId| {
                let at = push(&mut self.nodes, Node::Null);
                work.push((at, child));
                at
            };
            let node = match fetched {
                Node::Array(items) => Node::Array(items.into_iter().map(&mut slot).collect()),
                Node::Object(members) => Node::Object(
                    members
                        .into_iter()
                        .map(|(k, c)| (k, slot(c)))
                        .collect(),
                ),
                scalar => scalar,
            };
            self.nodes[dst.index()] = node;
        }
        root
    }

    /// Decoded contents of a string node.
    pub(crate) fn decoded_str(&self, id: NodeId) -> Option<String> {
        match self.node(id) {
            Node::String(raw) => Some(unescape(raw)),
            _ => None,
        }
    }

    /// Writes the subtree at `id` as compact JSON.
    pub(crate) fn write_json<W: Write>(&self, id: NodeId, out: &mut W) -> fmt::Result {
        enum Step<'d> {
            Value(NodeId),
            Key(&'d str),
            Text(&'static str),
        }

        let mut stack = vec![Step::Value(id)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Text(text) => out.write_str(text)?,
                Step::Key(key) => {
                    out.write_char('"')?;
                    write_escaped_key(key, out)?;
                    out.write_str("\":")?;
                }
                Step::Value(id) => match self.node(id) {
                    Node::Null => out.write_str("null")?,
                    Node::Bool(b) => out.write_str(if *b { "true" } else { "false" })?,
                    Node::Number(text) => out.write_str(text)?,
                    Node::String(raw) => {
                        out.write_char('"')?;
                        out.write_str(raw)?;
                        out.write_char('"')?;
                    }
                    Node::Array(items) => {
                        out.write_char('[')?;
                        stack.push(Step::Text("]"));
                        for (i, &child) in items.iter().enumerate().rev() {
                            stack.push(Step::Value(child));
                            if i > 0 {
                                stack.push(Step::Text(","));
                            }
                        }
                    }
                    Node::Object(members) => {
                        out.write_char('{')?;
                        stack.push(Step::Text("}"));
                        for (i, (key, child)) in members.iter().enumerate().rev() {
                            stack.push(Step::Value(*child));
                            stack.push(Step::Key(key));
                            if i > 0 {
                                stack.push(Step::Text(","));
                            }
                        }
                    }
                },
            }
        }
        Ok(())
    }
}

fn push(nodes: &mut Vec<Node>, node: Node) -> NodeId {
    let id = NodeId(u32::try_from(nodes.len()).unwrap_or(u32::MAX));
    nodes.push(node);
    id
}

/// Decimal array index without sign, leading `+` or whitespace.
fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// Re-escapes a decoded object key.
fn write_escaped_key<W: Write>(src: &str, f: &mut W) -> fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04X}", c as u32)?,
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Decodes JSON escapes in already-validated string contents. Unpaired
/// surrogates become U+FFFD.
pub(crate) fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.into();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hi = read_hex4(&mut chars);
                let decoded = match hi {
                    Some(hi @ 0xD800..=0xDBFF) => {
                        let rest = chars.as_str();
                        let lo = rest
                            .strip_prefix("\\u")
                            .and_then(|r| r.get(..4))
                            .and_then(|h| u32::from_str_radix(h, 16).ok())
                            .filter(|lo| (0xDC00..=0xDFFF).contains(lo));
                        match lo {
                            Some(lo) => {
                                chars = rest[6..].chars();
                                char::from_u32(0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00))
                            }
                            None => None,
                        }
                    }
                    Some(code) => char::from_u32(code),
                    None => None,
                };
                out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn read_hex4(chars: &mut core::str::Chars<'_>) -> Option<u32> {
    let rest = chars.as_str();
    let code = rest.get(..4).and_then(|h| u32::from_str_radix(h, 16).ok())?;
    *chars = rest[4..].chars();
    Some(code)
}

fn parse_fragment(input: &[u8], nodes: &mut Vec<Node>) -> Result<NodeId, ParseError> {
    let mut p = Parser {
        input,
        pos: 0,
        nodes,
    };
    p.skip_ws();
    let root = p.value(0)?;
    p.skip_ws();
    if p.pos < input.len() {
        return Err(p.error(SyntaxError::TrailingCharacters));
    }
    Ok(root)
}

struct Parser<'src, 'a> {
    input: &'src [u8],
    pos: usize,
    nodes: &'a mut Vec<Node>,
}

impl<'src> Parser<'src, '_> {
    fn error(&self, source: SyntaxError) -> ParseError {
        ParseError::at(source, self.input, self.pos)
    }

    fn unexpected(&self) -> ParseError {
        match self.peek_char() {
            Some(c) => self.error(SyntaxError::InvalidCharacter(c)),
            None => self.error(SyntaxError::UnexpectedEndOfInput),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        // Input was validated as UTF-8 before parsing started.
        core::str::from_utf8(&self.input[self.pos..])
            .ok()
            .and_then(|s| s.chars().next())
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\n' | b'\r' | b'\t') = self.peek() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), ParseError> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn value(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        let node = match self.peek() {
            Some(b'{') => self.object(depth + 1)?,
            Some(b'[') => self.array(depth + 1)?,
            Some(b'"') => Node::String(self.string()?.into()),
            Some(b't') => self.literal(b"true", Node::Bool(true))?,
            Some(b'f') => self.literal(b"false", Node::Bool(false))?,
            Some(b'n') => self.literal(b"null", Node::Null)?,
            Some(b'-' | b'0'..=b'9') => self.number()?,
            _ => return Err(self.unexpected()),
        };
        Ok(push(self.nodes, node))
    }

    fn literal(&mut self, text: &'static [u8], node: Node) -> Result<Node, ParseError> {
        for &b in text {
            if self.peek() != Some(b) {
                return Err(self.unexpected());
            }
            self.pos += 1;
        }
        Ok(node)
    }

    fn object(&mut self, depth: usize) -> Result<Node, ParseError> {
        if depth > MAX_DEPTH {
            return Err(self.error(SyntaxError::TooDeep(MAX_DEPTH)));
        }
        self.pos += 1;
        let mut members = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Node::Object(members));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.unexpected());
            }
            let key = unescape(self.string()?);
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let child = self.value(depth)?;
            members.push((key.into_boxed_str(), child));
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Node::Object(members));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn array(&mut self, depth: usize) -> Result<Node, ParseError> {
        if depth > MAX_DEPTH {
            return Err(self.error(SyntaxError::TooDeep(MAX_DEPTH)));
        }
        self.pos += 1;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Node::Array(items));
        }
        loop {
            self.skip_ws();
            items.push(self.value(depth)?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Node::Array(items));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    /// Consumes a string literal and returns its raw contents. Escapes are
    /// validated but not decoded. Raw control bytes are tolerated.
    fn string(&mut self) -> Result<&'src str, ParseError> {
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
                Some(b'"') => break,
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                            self.pos += 1;
                        }
                        Some(b'u') => {
                            self.pos += 1;
                            let hex = self.input.get(self.pos..self.pos + 4);
                            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                                return Err(self.error(SyntaxError::InvalidUnicodeEscape));
                            }
                            self.pos += 4;
                        }
                        Some(_) => {
                            let c = self.peek_char().unwrap_or(char::REPLACEMENT_CHARACTER);
                            return Err(self.error(SyntaxError::InvalidEscape(c)));
                        }
                        None => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
        let end = self.pos;
        self.pos += 1;
        // Boundaries sit on ASCII quotes, so the slice stays valid UTF-8.
        let input = self.input;
        core::str::from_utf8(&input[start..end])
            .map_err(|_| ParseError::at(SyntaxError::InvalidUtf8, input, start))
    }

    fn number(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(self.error(SyntaxError::InvalidNumber)),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.error(SyntaxError::InvalidNumber));
            }
            self.digits();
        }
        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.error(SyntaxError::InvalidNumber));
            }
            self.digits();
        }
        let text = core::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| ParseError::at(SyntaxError::InvalidNumber, self.input, start))?;
        Ok(Node::Number(text.into()))
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use rstest::rstest;

    use super::*;

    fn json(doc: &Document, id: NodeId) -> String {
        let mut out = String::new();
        doc.write_json(id, &mut out).unwrap();
        out
    }

    #[rstest]
    #[case("null", NodeKind::Null)]
    #[case(" true ", NodeKind::Bool)]
    #[case("-0.5e+3", NodeKind::Number)]
    #[case(r#""aé""#, NodeKind::String)]
    #[case("[1, [2]]", NodeKind::Array)]
    #[case(r#"{"k": {}}"#, NodeKind::Object)]
    fn parses_each_kind(#[case] src: &str, #[case] kind: NodeKind) {
        let doc = Document::parse(src).unwrap();
        assert_eq!(doc.node(doc.root()).kind(), kind);
    }

    #[rstest]
    #[case("", SyntaxError::UnexpectedEndOfInput)]
    #[case("[1,]", SyntaxError::InvalidCharacter(']'))]
    #[case("{\"a\" 1}", SyntaxError::InvalidCharacter('1'))]
    #[case("01", SyntaxError::TrailingCharacters)]
    #[case("-", SyntaxError::InvalidNumber)]
    #[case("1.", SyntaxError::InvalidNumber)]
    #[case(r#""\x""#, SyntaxError::InvalidEscape('x'))]
    #[case(r#""\u12""#, SyntaxError::InvalidUnicodeEscape)]
    #[case("\"open", SyntaxError::UnexpectedEndOfInput)]
    #[case("nul", SyntaxError::UnexpectedEndOfInput)]
    #[case("{} {}", SyntaxError::TrailingCharacters)]
    fn rejects_malformed(#[case] src: &str, #[case] expected: SyntaxError) {
        let err = Document::parse(src).unwrap_err();
        assert_eq!(err.kind(), &expected, "{src}: {err}");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = Document::parse_bytes(b"\"\xff\"").unwrap_err();
        assert_eq!(err.kind(), &SyntaxError::InvalidUtf8);
        assert_eq!(err.column(), 2);
    }

    #[test]
    fn depth_limit() {
        let ok = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(Document::parse(&ok).is_ok());
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert_eq!(
            Document::parse(&deep).unwrap_err().kind(),
            &SyntaxError::TooDeep(MAX_DEPTH)
        );
    }

    #[test]
    fn strings_keep_escapes_until_decoded() {
        let doc = Document::parse(r#"{"a\nb": "x\"y\\z 😀"}"#).unwrap();
        let child = doc.child(doc.root(), "a\nb").unwrap();
        assert_eq!(doc.node(child), &Node::String(r#"x\"y\\z 😀"#.into()));
        assert_eq!(doc.decoded_str(child).unwrap(), "x\"y\\z \u{1F600}");
    }

    #[rstest]
    #[case(r"\ud83d", "\u{FFFD}")]
    #[case(r"\ude00x", "\u{FFFD}x")]
    #[case(r"\/\b\f", "/\u{8}\u{c}")]
    #[case("plain", "plain")]
    fn unescape_edge_cases(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(unescape(raw), expected);
    }

    #[test]
    fn array_children_by_decimal_key() {
        let doc = Document::parse("[10, 20]").unwrap();
        let root = doc.root();
        assert!(doc.child(root, "1").is_some());
        assert!(doc.child(root, "2").is_none());
        assert!(doc.child(root, "+1").is_none());
        assert!(doc.child(root, "").is_none());
        assert_eq!(doc.element(root, 0), doc.child(root, "0"));
    }

    #[test]
    fn write_json_is_compact_and_reescapes_keys() {
        let doc = Document::parse("{ \"q\\\"k\" : [ 1 , 2.50 , \"s\" ] , \"n\" : null }").unwrap();
        assert_eq!(json(&doc, doc.root()), r#"{"q\"k":[1,2.50,"s"],"n":null}"#);
    }

    #[test]
    fn set_child_replaces_inserts_and_ignores() {
        let mut doc = Document::parse(r#"{"a": 1, "b": [0]}"#).unwrap();
        let root = doc.root();
        let t = doc.parse_into(b"true").unwrap();
        assert!(doc.set_child(root, "a", t));
        assert!(doc.set_child(root, "c", t));
        let arr = doc.child(root, "b").unwrap();
        assert!(doc.set_child(arr, "0", t));
        assert!(!doc.set_child(arr, "5", t));
        assert!(!doc.set_child(t, "x", t));
        assert_eq!(json(&doc, root), r#"{"a":true,"b":[true],"c":true}"#);
    }

    #[test]
    fn parse_into_rolls_back_on_error() {
        let mut doc = Document::parse("{}").unwrap();
        let before = doc.nodes.len();
        assert!(doc.parse_into(b"[1, oops]").is_err());
        assert_eq!(doc.nodes.len(), before);
    }

    #[test]
    fn import_and_duplicate_copy_subtrees() {
        let src = Document::parse(r#"{"x": [1, {"y": "z"}]}"#).unwrap();
        let mut dst = Document::parse("{}").unwrap();
        let copied = dst.import(&src, src.root());
        assert_eq!(json(&dst, copied), r#"{"x":[1,{"y":"z"}]}"#);

        let again = dst.duplicate(copied);
        assert_ne!(again, copied);
        assert_eq!(json(&dst, again), json(&dst, copied));
        assert!(!dst.contains(copied, again));
    }

    #[test]
    fn contains_walks_descendants() {
        let doc = Document::parse(r#"{"a": {"b": [1]}}"#).unwrap();
        let root = doc.root();
        let a = doc.child(root, "a").unwrap();
        let b = doc.child(a, "b").unwrap();
        let one = doc.element(b, 0).unwrap();
        assert!(doc.contains(root, one));
        assert!(doc.contains(a, a));
        assert!(!doc.contains(b, a));
        assert_eq!(vec![doc.node(one).kind()], vec![NodeKind::Number]);
        assert_eq!(doc.node(one), &Node::Number("1".to_string().into()));
    }
    #[test]
    fn set_scalar_overwrites_scalar_slots() {
        let mut doc = Document::parse(r#"{"n": 0, "o": {}}"#).unwrap();
        let root = doc.root();
        let before = doc.node_count();
        for i in 1..1000 {
            doc.set_scalar(root, "n", i.to_string().as_bytes()).unwrap();
        }
        assert_eq!(doc.node_count(), before);

        doc.set_scalar(root, "o", b"true").unwrap();
        doc.set_scalar(root, "new", b"1").unwrap();
        assert_eq!(doc.node_count(), before + 2);

        let n = doc.child(root, "n").unwrap();
        doc.set_scalar(n, "x", b"1").unwrap();
        assert!(doc.set_scalar(root, "n", b"oops").is_err());
        assert_eq!(doc.node_count(), before + 2);
        assert_eq!(json(&doc, root), r#"{"n":999,"o":true,"new":1}"#);
    }

    #[test]
    fn walks_handle_chains_deeper_than_the_parser_accepts() {
        const LEVELS: usize = 100_000;
        let mut doc = Document::parse("{}").unwrap();
        let root = doc.root();
        let mut cur = root;
        for _ in 0..LEVELS {
            let next = doc.parse_into(b"{}").unwrap();
            assert!(doc.set_child(cur, "a", next));
            cur = next;
        }
        let text = json(&doc, root);
        assert_eq!(text.len(), LEVELS * 6 + 2);
        assert!(doc.contains(root, cur));
        assert!(!doc.contains(cur, root));

        let copy = doc.duplicate(root);
        assert_eq!(json(&doc, copy), text);
        let mut other = Document::parse("[]").unwrap();
        let imported = other.import(&doc, root);
        assert_eq!(json(&other, imported), text);
    }
}
