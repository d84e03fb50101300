#![no_main]
use std::cell::RefCell;

use arbitrary::Arbitrary;
use jsonquill::{HostValue, JsonEncoder, JsonView, pretty};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 5; // 1 flag + 4-byte integer for `set`

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

static WS_TABLE: &[&[u8]] = &[b" ", b"\t", b"\n", b"\r"];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Mostly hands out well-formed documents, since every interesting check
/// needs one; the rest of the time libFuzzer mutates bytes freely.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if max_size <= HEADER || (size >= HEADER && !seed.is_multiple_of(4)) {
        return fuzzer_mutate(data, size, max_size);
    }
    data[..HEADER].copy_from_slice(&with_rng(|rng| {
        let mut header = [0u8; HEADER];
        rng.fill_bytes(&mut header);
        header
    }));
    let limit = max_size - HEADER;
    let mut end = HEADER;
    end += append_whitespace(&mut data[end..], limit);
    end += append_value(&mut data[end..], size.max(16), max_size - end);
    end += append_whitespace(&mut data[end..], max_size - end);
    end
}

fn append_whitespace(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        let mut written = 0;
        for _ in 0..rng.random_range(0..4) {
            let ws = WS_TABLE[rng.random_range(0..WS_TABLE.len())];
            if written + ws.len() > limit {
                break;
            }
            buf[written..written + ws.len()].copy_from_slice(ws);
            written += ws.len();
        }
        written
    })
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };

    let serialized = serde_json::to_vec(&value.0).unwrap_or_default();
    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(21)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            3 => Value::Number(u.arbitrary::<i64>()?.into()),
            4..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
        };
        Ok(ArbitraryValue(value))
    }
}

fn document(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }
    let flags = data[0];
    let n = i64::from(i32::from_le_bytes([data[1], data[2], data[3], data[4]]));
    let body = &data[HEADER..];

    let mut view = JsonView::new();
    let parsed = view.parse_bytes(body);
    let Ok(expected) = serde_json::from_slice::<Value>(body) else {
        return;
    };
    assert!(parsed.is_ok(), "rejected a document serde_json accepts: {parsed:?}");

    let text = view.to_json();
    let reparsed: Value = serde_json::from_str(&text).expect("view wrote invalid JSON");
    assert_eq!(reparsed, expected);

    if flags & 1 != 0 {
        let indented = pretty(text.as_bytes());
        let reparsed: Value = serde_json::from_slice(&indented).expect("pretty wrote invalid JSON");
        assert_eq!(reparsed, expected);
    }

    if flags & 2 != 0 {
        if let Value::Object(map) = &expected {
            let key = map.keys().next().cloned().unwrap_or_default();
            view.set(&key, &HostValue::Int(n)).expect("integer fragment must parse");
            assert_eq!(view.get_int(&key), n);
        }
    }

    if flags & 4 != 0 {
        if let Value::String(s) = &expected {
            if !s.chars().any(|c| c < ' ' && !matches!(c, '\n' | '\r' | '\t')) {
                let mut enc = JsonEncoder::new();
                enc.val(s);
                let back: String = serde_json::from_slice(enc.bytes()).expect("encoder wrote invalid JSON");
                assert_eq!(&back, s);
            }
        }
    }
}

fuzz_target!(|data: &[u8]| document(data));
