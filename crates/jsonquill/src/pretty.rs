//! Re-indentation of compact JSON text.
//!
//! Works on bytes without parsing: whitespace outside strings is dropped and
//! line breaks are inserted after openers and separators. Empty containers
//! stay on one line. Malformed input is reformatted as far as the brackets
//! allow and is never rejected.

use alloc::vec::Vec;

use crate::options::PrettyOptions;

/// Indents `json` with two spaces per level.
///
/// ```rust
/// let out = jsonquill::pretty(br#"{"a":[1,2],"b":{}}"#);
/// assert_eq!(out, b"{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {}\n}");
/// ```
#[must_use]
pub fn pretty(json: &[u8]) -> Vec<u8> {
    pretty_with(json, &PrettyOptions::default())
}

/// Indents `json` using `options`. The prefix starts every line but the
/// first.
#[must_use]
pub fn pretty_with(json: &[u8], options: &PrettyOptions) -> Vec<u8> {
    let mut out = Vec::with_capacity(json.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    let newline = |out: &mut Vec<u8>, depth: usize| {
        out.push(b'\n');
        out.extend_from_slice(options.prefix.as_bytes());
        for _ in 0..depth {
            out.extend_from_slice(options.indent.as_bytes());
        }
    };

    while i < json.len() {
        let b = json[i];
        i += 1;

        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'"' => {
                in_string = true;
                out.push(b);
            }
            b'{' | b'[' => {
                out.push(b);
                let closer = if b == b'{' { b'}' } else { b']' };
                let next = json[i..]
                    .iter()
                    .position(|c| !matches!(c, b' ' | b'\t' | b'\n' | b'\r'))
                    .map(|skip| i + skip);
                if let Some(at) = next.filter(|&at| json[at] == closer) {
                    out.push(closer);
                    i = at + 1;
                } else {
                    depth += 1;
                    newline(&mut out, depth);
                }
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push(b);
            }
            b',' => {
                out.push(b);
                newline(&mut out, depth);
            }
            b':' => out.extend_from_slice(b": "),
            _ => out.push(b),
        }
    }
    out
}
