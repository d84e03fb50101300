//! Lazy navigation over a parsed document.
//!
//! A [`JsonView`] is a `(document, node)` handle. Reads turn exactly one node
//! into a [`HostValue`]: scalars are converted on the spot and containers come
//! back as new views over the same document. Nothing is cached, so reading the
//! same key twice locates the child twice.
//!
//! All views derived from one parse share the document. A [`JsonView::set`]
//! through any of them is visible through every other.

use alloc::{
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};
use core::{cell::RefCell, fmt, str::FromStr};

use crate::{
    document::{Document, Node, NodeId, NodeKind},
    encoder::{EncodeTable, JsonEncoder},
    error::{EncodeError, ViewError},
    host::{HostValue, KeyIndex, NameIndex},
};

/// A handle on one node of a shared, parsed document.
///
/// Cloning a view is cheap and yields another handle on the same node.
///
/// # Examples
///
/// ```rust
/// use jsonquill::{HostValue, JsonView};
///
/// let root: JsonView = r#"{"a": {"b": 1}}"#.parse().unwrap();
/// let a = root.get("a");
/// let a = a.as_view().unwrap();
/// assert_eq!(a.get("b"), HostValue::Number(1.0));
/// a.set("c", &HostValue::Bool(true)).unwrap();
/// assert_eq!(root.to_json(), r#"{"a":{"b":1,"c":true}}"#);
/// ```
#[derive(Clone, Default)]
pub struct JsonView {
    inner: Option<Handle>,
}

#[derive(Clone)]
struct Handle {
    doc: Rc<RefCell<Document>>,
    node: NodeId,
}

impl JsonView {
    /// An empty view. Every read returns [`HostValue::Nil`] until a document
    /// is parsed into it.
    #[must_use]
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// Replaces the view's root with a freshly parsed document. On error the
    /// previous root is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Parse`] for malformed input.
    pub fn parse(&mut self, text: &str) -> Result<(), ViewError> {
        self.parse_bytes(text.as_bytes())
    }

    /// Byte-slice variant of [`JsonView::parse`]. The input must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Parse`] for malformed input.
    pub fn parse_bytes(&mut self, body: &[u8]) -> Result<(), ViewError> {
        let doc = Document::parse_bytes(body)?;
        let node = doc.root();
        self.inner = Some(Handle {
            doc: Rc::new(RefCell::new(doc)),
            node,
        });
        Ok(())
    }

    /// Whether both views point at the same node of the same document.
    #[must_use]
    pub fn same_node(&self, other: &JsonView) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a.doc, &b.doc) && a.node == b.node,
            (None, None) => true,
            _ => false,
        }
    }

    /// JSON type of the wrapped node, `None` for an empty view.
    #[must_use]
    pub fn kind(&self) -> Option<NodeKind> {
        let h = self.inner.as_ref()?;
        Some(h.doc.borrow().node(h.node).kind())
    }

    /// Number of members or elements; zero for scalars and empty views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_node(|_, node| match node {
            Node::Array(items) => items.len(),
            Node::Object(members) => members.len(),
            _ => 0,
        })
        .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object keys in document order; empty for anything but an object.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.with_node(|_, node| match node {
            Node::Object(members) => members.iter().map(|(k, _)| k.to_string()).collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default()
    }

    /// Reads one child by key.
    ///
    /// Objects look the key up; arrays accept a decimal index such as `"0"`.
    /// Missing children, `null`s, scalar parents and empty views all give
    /// [`HostValue::Nil`].
    ///
    /// String values come back with their escape sequences still in place:
    /// only the surrounding quotes are removed. Use [`JsonView::get_string`]
    /// for the decoded text.
    #[must_use]
    pub fn get(&self, key: &str) -> HostValue {
        let Some(h) = &self.inner else {
            return HostValue::Nil;
        };
        let child = h.doc.borrow().child(h.node, key);
        child.map_or(HostValue::Nil, |id| Self::visit(h, id))
    }

    /// Reads one array element by position, with the same conversions as
    /// [`JsonView::get`].
    #[must_use]
    pub fn element(&self, index: usize) -> HostValue {
        let Some(h) = &self.inner else {
            return HostValue::Nil;
        };
        let child = h.doc.borrow().element(h.node, index);
        child.map_or(HostValue::Nil, |id| Self::visit(h, id))
    }

    /// Lookup keyed by an arbitrary host value, using its string form.
    #[must_use]
    pub fn meta(&self, key: &HostValue) -> HostValue {
        match key {
            HostValue::String(s) => self.get(s),
            other => self.get(&other.to_string()),
        }
    }

    fn visit(h: &Handle, id: NodeId) -> HostValue {
        let doc = h.doc.borrow();
        match doc.node(id) {
            Node::Null => HostValue::Nil,
            Node::Bool(b) => HostValue::Bool(*b),
            Node::String(raw) => HostValue::String(raw.to_string()),
            Node::Number(text) => text.parse().map_or(HostValue::Nil, HostValue::Number),
            Node::Array(_) | Node::Object(_) => HostValue::View(JsonView {
                inner: Some(Handle {
                    doc: Rc::clone(&h.doc),
                    node: id,
                }),
            }),
        }
    }

    fn with_node<R>(&self, f: impl FnOnce(&Document, &Node) -> R) -> Option<R> {
        let h = self.inner.as_ref()?;
        let doc = h.doc.borrow();
        Some(f(&doc, doc.node(h.node)))
    }

    fn with_child<R>(&self, key: &str, f: impl FnOnce(&Document, NodeId) -> Option<R>) -> Option<R> {
        let h = self.inner.as_ref()?;
        let doc = h.doc.borrow();
        let id = doc.child(h.node, key)?;
        f(&doc, id)
    }

    /// Integer value of `key`, or `0` when absent, not a number or not an
    /// integer in `i64` range.
    #[must_use]
    pub fn get_int(&self, key: &str) -> i64 {
        self.with_child(key, |doc, id| match doc.node(id) {
            Node::Number(text) => text.parse().ok(),
            _ => None,
        })
        .unwrap_or(0)
    }

    /// Floating point value of `key`, or `0.0`.
    #[must_use]
    pub fn get_float(&self, key: &str) -> f64 {
        self.with_child(key, |doc, id| match doc.node(id) {
            Node::Number(text) => text.parse().ok(),
            _ => None,
        })
        .unwrap_or(0.0)
    }

    /// Decoded string value of `key`, or the empty string.
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.with_child(key, Document::decoded_str).unwrap_or_default()
    }

    /// Boolean value of `key`, or `false`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.with_child(key, |doc, id| match doc.node(id) {
            Node::Bool(b) => Some(*b),
            _ => None,
        })
        .unwrap_or(false)
    }

    /// Assigns `key` in the wrapped object (or an in-range index of the
    /// wrapped array) in place.
    ///
    /// - `Nil` is ignored.
    /// - Numbers and booleans are written out and parsed back as a fragment.
    ///   A scalar replacing a scalar reuses its node.
    /// - A view attaches its node. Within one document the node is shared,
    ///   not copied, unless sharing would make the node its own ancestor; a
    ///   node from another document is copied in.
    /// - Strings are quoted verbatim and must form a valid JSON string
    ///   literal, so embedded quotes have to arrive already escaped.
    ///
    /// Scalar parents and empty views ignore the assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Parse`] when the value's text does not parse and
    /// [`ViewError::NonFinite`] for NaN or an infinity, which have no JSON
    /// spelling.
    pub fn set(&self, key: &str, value: &HostValue) -> Result<(), ViewError> {
        let Some(h) = &self.inner else {
            return Ok(());
        };
        let child = match value {
            HostValue::Nil => return Ok(()),
            HostValue::Number(n) if !n.is_finite() => return Err(ViewError::NonFinite(*n)),
            HostValue::Bool(_) | HostValue::Number(_) | HostValue::Int(_) => {
                let text = value.to_string();
                h.doc.borrow_mut().set_scalar(h.node, key, text.as_bytes())?;
                return Ok(());
            }
            HostValue::String(s) => {
                let mut quoted = String::with_capacity(s.len() + 2);
                quoted.push('"');
                quoted.push_str(s);
                quoted.push('"');
                h.doc.borrow_mut().set_scalar(h.node, key, quoted.as_bytes())?;
                return Ok(());
            }
            HostValue::View(other) => match &other.inner {
                None => return Ok(()),
                Some(o) if Rc::ptr_eq(&o.doc, &h.doc) => {
                    let mut doc = h.doc.borrow_mut();
                    if doc.contains(o.node, h.node) {
                        tracing::trace!(key, "set: copying a subtree that contains its new parent");
                        doc.duplicate(o.node)
                    } else {
                        o.node
                    }
                }
                Some(o) => {
                    tracing::trace!(key, "set: copying a subtree from another document");
                    let src = o.doc.borrow();
                    let mut doc = h.doc.borrow_mut();
                    doc.import(&src, o.node)
                }
            },
        };
        h.doc.borrow_mut().set_child(h.node, key, child);
        Ok(())
    }

    /// Compact JSON text of the wrapped node; empty for an empty view.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl FromStr for JsonView {
    type Err = ViewError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut view = Self::new();
        view.parse(text)?;
        Ok(view)
    }
}

impl fmt::Display for JsonView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(h) => h.doc.borrow().write_json(h.node, f),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for JsonView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(_) => write!(f, "JsonView({self})"),
            None => f.write_str("JsonView(<empty>)"),
        }
    }
}

impl<C: ?Sized> NameIndex<C> for JsonView {
    fn index(&self, _cx: &C, key: &str) -> HostValue {
        self.get(key)
    }
}

impl<C: ?Sized> KeyIndex<C> for JsonView {
    fn meta(&self, _cx: &C, key: &HostValue) -> HostValue {
        JsonView::meta(self, key)
    }
}

/// A view encodes as the JSON text of its node.
impl EncodeTable for JsonView {
    fn encode_table(&self, enc: &mut JsonEncoder) -> Result<(), EncodeError> {
        if self.inner.is_none() {
            return Err(EncodeError::Table("empty view".into()));
        }
        let text = self.to_string();
        enc.copy_raw(text.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use rstest::rstest;

    use super::*;

    fn view(text: &str) -> JsonView {
        text.parse().unwrap()
    }

    fn child(v: &JsonView, key: &str) -> JsonView {
        match v.get(key) {
            HostValue::View(child) => child,
            other => panic!("{key}: expected a view, got {other:?}"),
        }
    }

    #[test]
    fn nested_lookup() {
        let root = view(r#"{"a": {"b": 1}}"#);
        let a = child(&root, "a");
        assert_eq!(a.get("b"), HostValue::Number(1.0));
        assert_eq!(a.get_int("b"), 1);
        assert_eq!(root.get("missing"), HostValue::Nil);
        assert_eq!(a.get("b").to_string(), "1");
    }

    #[rstest]
    #[case("null", HostValue::Nil)]
    #[case("true", HostValue::Bool(true))]
    #[case("-2.5", HostValue::Number(-2.5))]
    #[case(r#""s""#, HostValue::from("s"))]
    fn scalar_children(#[case] json: &str, #[case] expected: HostValue) {
        let root = view(&alloc::format!(r#"{{"k": {json}}}"#));
        assert_eq!(root.get("k"), expected);
    }

    #[test]
    fn scalar_and_empty_views_do_not_navigate() {
        let scalar = view("5");
        assert_eq!(scalar.get("x"), HostValue::Nil);
        assert_eq!(scalar.kind(), Some(NodeKind::Number));
        assert_eq!(scalar.to_json(), "5");

        let empty = JsonView::new();
        assert_eq!(empty.get("x"), HostValue::Nil);
        assert_eq!(empty.kind(), None);
        assert!(empty.is_empty());
        assert_eq!(empty.to_json(), "");
        assert_eq!(alloc::format!("{empty:?}"), "JsonView(<empty>)");
        assert!(empty.set("x", &HostValue::Bool(true)).is_ok());
    }

    #[test]
    fn arrays_by_index() {
        let root = view(r#"[10, "x", [true]]"#);
        assert_eq!(root.len(), 3);
        assert_eq!(root.get("0"), HostValue::Number(10.0));
        assert_eq!(root.element(1), HostValue::from("x"));
        assert_eq!(root.element(3), HostValue::Nil);
        let inner = child(&root, "2");
        assert_eq!(inner.element(0), HostValue::Bool(true));
    }

    #[test]
    fn strings_raw_and_decoded() {
        let root = view(r#"{"s": "a\"bA"}"#);
        assert_eq!(root.get("s"), HostValue::from(r#"a\"bA"#));
        assert_eq!(root.get_string("s"), "a\"bA");
        assert_eq!(root.get_string("missing"), "");
    }

    #[test]
    fn typed_getters_default() {
        let root = view(r#"{"i": 12, "f": 1.5, "big": 1e300, "b": true, "s": "7"}"#);
        assert_eq!(root.get_int("i"), 12);
        assert_eq!(root.get_int("f"), 0);
        assert_eq!(root.get_int("s"), 0);
        assert!((root.get_float("f") - 1.5).abs() < f64::EPSILON);
        assert!((root.get_float("big") - 1e300).abs() < 1e285);
        assert!(root.get_bool("b"));
        assert!(!root.get_bool("i"));
    }

    #[test]
    fn keys_in_document_order() {
        let root = view(r#"{"z": 1, "a": 2}"#);
        assert_eq!(root.keys(), ["z", "a"]);
        assert!(view("[1]").keys().is_empty());
    }

    #[test]
    fn set_is_visible_through_every_view() {
        let root = view(r#"{"a": {"b": 1}}"#);
        child(&root, "a").set("c", &HostValue::Bool(true)).unwrap();
        assert_eq!(child(&root, "a").get("c"), HostValue::Bool(true));

        let a = child(&root, "a");
        a.set("b", &HostValue::Int(-3)).unwrap();
        a.set("n", &HostValue::Number(0.5)).unwrap();
        a.set("s", &HostValue::from("hi")).unwrap();
        a.set("skip", &HostValue::Nil).unwrap();
        assert_eq!(root.to_json(), r#"{"a":{"b":-3,"c":true,"n":0.5,"s":"hi"}}"#);
    }

    #[test]
    fn set_string_must_already_be_escaped() {
        let root = view("{}");
        let err = root.set("s", &HostValue::from("a\"b")).unwrap_err();
        assert!(matches!(err, ViewError::Parse(_)));
        assert_eq!(root.to_json(), "{}");

        root.set("s", &HostValue::from(r#"a\"b"#)).unwrap();
        assert_eq!(root.get_string("s"), "a\"b");
    }

    #[test]
    fn set_shares_nodes_within_a_document() {
        let root = view(r#"{"a": {"x": 1}, "b": {}}"#);
        let a = root.get("a");
        let b = child(&root, "b");
        b.set("link", &a).unwrap();
        assert_eq!(b.get("link"), a);

        child(&root, "a").set("y", &HostValue::Int(2)).unwrap();
        assert_eq!(child(&b, "link").get_int("y"), 2);
    }

    #[test]
    fn set_copies_instead_of_creating_a_cycle() {
        let root = view(r#"{"a": {"x": 1}}"#);
        let a = child(&root, "a");
        a.set("self", &HostValue::View(root.clone())).unwrap();
        assert_eq!(
            root.to_json(),
            r#"{"a":{"x":1,"self":{"a":{"x":1}}}}"#
        );
        assert_ne!(a.get("self"), HostValue::View(root.clone()));
    }

    #[test]
    fn set_imports_views_from_other_documents() {
        let root = view("{}");
        let other = view(r#"{"deep": [1, 2]}"#);
        root.set("o", &HostValue::View(other.clone())).unwrap();
        other.set("later", &HostValue::Bool(false)).unwrap();
        assert_eq!(root.to_json(), r#"{"o":{"deep":[1,2]}}"#);
    }

    #[test]
    fn failed_parse_keeps_previous_root() {
        let mut v = view("[1]");
        let err = v.parse("[1,").unwrap_err();
        assert!(matches!(err, ViewError::Parse(_)));
        assert_eq!(v.to_json(), "[1]");
        v.parse_bytes(b"{\"k\": null}").unwrap();
        assert_eq!(v.to_json(), r#"{"k":null}"#);
    }

    #[test]
    fn meta_uses_the_key_string_form() {
        let root = view(r#"{"1": "one", "true": "yes", "0": "zero"}"#);
        assert_eq!(root.meta(&HostValue::Int(1)), HostValue::from("one"));
        assert_eq!(root.meta(&HostValue::Bool(true)), HostValue::from("yes"));
        assert_eq!(KeyIndex::<()>::meta(&root, &(), &HostValue::from("0")), HostValue::from("zero"));
        assert_eq!(NameIndex::<()>::index(&root, &(), "1"), HostValue::from("one"));
    }

    #[test]
    fn encodes_as_table() {
        let root = view(r#"{"a": [1, {"b": "c"}]}"#);
        let mut enc = JsonEncoder::new();
        root.encode_table(&mut enc).unwrap();
        assert_eq!(enc.bytes(), br#"{"a":[1,{"b":"c"}]}"#);
        assert!(JsonView::new().encode_table(&mut enc).is_err());
    }

    fn node_count(v: &JsonView) -> usize {
        v.inner.as_ref().map_or(0, |h| h.doc.borrow().node_count())
    }

    #[test]
    fn repeated_scalar_sets_reuse_nodes() {
        let root = view(r#"{"counter": 0, "tag": "a"}"#);
        let before = node_count(&root);
        for i in 0..10_000 {
            root.set("counter", &HostValue::Int(i)).unwrap();
            root.set("tag", &HostValue::from("b")).unwrap();
            root.set("tag", &HostValue::Number(0.25)).unwrap();
        }
        assert_eq!(node_count(&root), before);
        assert_eq!(root.to_json(), r#"{"counter":9999,"tag":0.25}"#);

        root.set("fresh", &HostValue::Bool(true)).unwrap();
        assert_eq!(node_count(&root), before + 1);
        view("7").set("x", &HostValue::Int(1)).unwrap();
    }

    #[test]
    fn scalar_over_shared_container_leaves_other_links() {
        let root = view(r#"{"a": {"x": 1}, "b": {}}"#);
        let b = child(&root, "b");
        b.set("link", &root.get("a")).unwrap();
        root.set("a", &HostValue::Int(5)).unwrap();
        assert_eq!(root.to_json(), r#"{"a":5,"b":{"link":{"x":1}}}"#);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn set_rejects_non_finite_numbers(#[case] n: f64) {
        let root = view(r#"{"k": 1}"#);
        let err = root.set("k", &HostValue::Number(n)).unwrap_err();
        assert!(matches!(err, ViewError::NonFinite(_)), "{err}");
        assert!(root.set("new", &HostValue::Number(n)).is_err());
        assert_eq!(root.to_json(), r#"{"k":1}"#);
    }

    #[test]
    fn deep_chains_built_by_set() {
        const LEVELS: usize = 20_000;
        let root = view("{}");
        let mut cur = root.clone();
        for _ in 0..LEVELS {
            cur.set("a", &HostValue::View(view("{}"))).unwrap();
            cur = child(&cur, "a");
        }
        let text = root.to_json();
        assert_eq!(text.len(), LEVELS * 6 + 2);
        assert!(text.starts_with(r#"{"a":{"a":"#));

        let mut enc = JsonEncoder::new();
        root.encode_table(&mut enc).unwrap();
        assert_eq!(enc.bytes(), text.as_bytes());

        let copy = view("{}");
        copy.set("deep", &HostValue::View(root.clone())).unwrap();
        assert_eq!(copy.to_json().len(), text.len() + 9);

        cur.set("loop", &HostValue::View(root.clone())).unwrap();
        let looped = root.to_json();
        assert_eq!(looped.len(), 2 * text.len() + 7);
        assert!(looped.ends_with(&alloc::format!("{{\"loop\":{text}}}{}", "}".repeat(LEVELS))));
    }
}
