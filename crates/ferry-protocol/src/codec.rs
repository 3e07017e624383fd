//! Form value decoding.
//!
//! The portal only ever receives short form values from its own pages, so
//! decoding is a fixed table rather than a general percent-decoder: `+`
//! becomes a space, and only the codes below are translated. Anything else,
//! including well-formed codes not in the table (`%3D`), passes through
//! untouched.

use std::collections::HashMap;

/// Percent codes the decoder understands. Hex digits match either case.
const PERCENT_TABLE: &[(&str, char)] = &[
    ("20", ' '),
    ("21", '!'),
    ("22", '"'),
    ("23", '#'),
    ("24", '$'),
    ("25", '%'),
    ("26", '&'),
    ("27", '\''),
    ("28", '('),
    ("29", ')'),
    ("2A", '*'),
    ("2B", '+'),
    ("2C", ','),
    ("2D", '-'),
    ("2E", '.'),
    ("2F", '/'),
    ("7E", '~'),
];

fn lookup(code: &str) -> Option<char> {
    PERCENT_TABLE
        .iter()
        .find(|(hex, _)| hex.eq_ignore_ascii_case(code))
        .map(|(_, c)| *c)
}

/// Decode one form value using the fixed table.
pub fn decode_form_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(c) = rest.chars().next() {
        if c == '+' {
            out.push(' ');
            rest = &rest[1..];
            continue;
        }
        if c == '%' {
            if let Some(decoded) = rest.get(1..3).and_then(lookup) {
                out.push(decoded);
                rest = &rest[3..];
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Split `a=1&b=2` into a map, decoding keys and values.
///
/// Pairs without `=` map to an empty value; empty segments are skipped; a
/// repeated key keeps its last value.
pub fn parse_pairs(encoded: &str) -> HashMap<String, String> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_form_value(key), decode_form_value(value))
        })
        .collect()
}
