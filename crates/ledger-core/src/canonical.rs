//! Canonical JSON encoding.
//!
//! One encoder feeds both block hashing and the proof-of-work input string, so
//! a block fetched over HTTP and re-encoded by a miner yields the same bytes the
//! node hashed. The layout is the one produced by Python's
//! `json.dumps(value, sort_keys=True)`:
//!
//! - object keys sorted by code point, `", "` between members, `": "` after keys
//! - arrays keep their order, `", "` between elements
//! - every character outside printable ASCII escaped as `\uXXXX`
//! - reals in shortest round-trip form (`1600000000.5`, `1600000000.0`)

use std::io;

use serde::Serialize;
use serde_json::{ser::Formatter, Map, Value};

use crate::error::Result;

/// Encode any serializable value canonically.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = sort_keys(serde_json::to_value(value)?);
    let mut buf = Vec::with_capacity(256);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
    value.serialize(&mut ser)?;
    let out = String::from_utf8(buf)
        .map_err(|e| <serde_json::Error as serde::ser::Error>::custom(e))?;
    Ok(out)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    // Quotes, backslashes and C0 controls are escaped by serde_json before
    // reaching here; everything else outside ' '..='~' is ours to escape.
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units).iter() {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
