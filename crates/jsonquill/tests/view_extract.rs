#![expect(missing_docs)]

use std::collections::BTreeMap;

use jsonquill::{ExtractError, Extractor, HostValue, JsonView, NodeKind, Source};

const DOC: &str = r#"
{
    "service": "auth",
    "replicas": 3,
    "ratio": 0.5,
    "enabled": true,
    "owner": null,
    "note": "line\nbreak",
    "hosts": ["a.local", "b.local"],
    "limits": {"cpu": 2, "memory": {"soft": 512, "hard": 1024}}
}
"#;

fn view(parent: &JsonView, name: &str) -> JsonView {
    parent.get(name).as_view().cloned().unwrap()
}

#[test]
fn reads_only_what_is_asked_for() {
    let root: JsonView = DOC.parse().unwrap();
    assert_eq!(root.kind(), Some(NodeKind::Object));
    assert_eq!(root.get("service"), HostValue::from("auth"));
    assert_eq!(root.get("replicas"), HostValue::Number(3.0));
    assert_eq!(root.get_float("ratio"), 0.5);
    assert!(root.get_bool("enabled"));
    assert!(root.get("owner").is_nil());
    assert_eq!(root.get("note"), HostValue::from(r"line\nbreak"));
    assert_eq!(root.get_string("note"), "line\nbreak");

    let hosts = view(&root, "hosts");
    assert_eq!(hosts.kind(), Some(NodeKind::Array));
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts.get("1"), HostValue::from("b.local"));

    let memory = view(&view(&root, "limits"), "memory");
    assert_eq!(memory.get_int("hard"), 1024);
}

#[test]
fn nested_set_round_trip() {
    let root: JsonView = r#"{"a": {"b": 1}}"#.parse().unwrap();
    let a = view(&root, "a");
    assert_eq!(a.get("b"), HostValue::Number(1.0));
    assert!(root.get("missing").is_nil());

    a.set("c", &HostValue::Bool(true)).unwrap();
    assert_eq!(view(&root, "a").get("c"), HostValue::Bool(true));
    insta::assert_snapshot!(root.to_json(), @r#"{"a":{"b":1,"c":true}}"#);
}

#[test]
fn parse_errors_report_position() {
    let err = "{\n  \"a\": trux\n}".parse::<JsonView>().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"parse failed: invalid character 'x' at 2:11");
}

#[test]
fn extractor_over_string_map() {
    let mut map = BTreeMap::new();
    map.insert("x".to_string(), "y".to_string());
    let ex = Extractor::new(Source::<()>::from(&map), &()).unwrap();
    assert_eq!(ex.peek("x"), "y");
    assert_eq!(ex.peek("missing"), "");
}

#[test]
fn extractor_over_view() {
    let root: JsonView = DOC.parse().unwrap();
    let host = HostValue::View(root);
    let ex = Extractor::new(Source::<()>::from(&host), &()).unwrap();
    assert_eq!(ex.peek("service"), "auth");
    assert_eq!(ex.peek("replicas"), "3");
    assert_eq!(ex.peek("hosts"), r#"["a.local","b.local"]"#);
    assert_eq!(ex.peek("owner"), "nil");
}

#[test]
fn extractor_rejects_integers() {
    let host = HostValue::Int(42);
    let err = Extractor::new(Source::<()>::from(&host), &()).unwrap_err();
    assert_eq!(err, ExtractError::Unsupported("int"));
    assert_eq!(err.to_string(), "extractor cannot read fields from int");
}
