//! Textual document writer

use std::fmt::Write as _;

use super::{COUNT_ATTR, TYPE_ATTR};
use crate::encoding::Charset;
use crate::error::DocumentError;
use crate::node::{Node, Value};

/// Encode a document tree into its textual wire form, in the given charset.
pub fn encode(root: &Node, charset: Charset) -> Result<Vec<u8>, DocumentError> {
    let mut xml = String::new();
    let _ = write!(
        xml,
        "<?xml version=\"1.0\" encoding=\"{}\"?>",
        charset.xml_name()
    );
    write_node(&mut xml, root);
    charset.encode(&xml).ok_or_else(|| DocumentError::Unencodable {
        charset: charset.xml_name(),
        text: "<textual document>".to_owned(),
    })
}

fn write_node(out: &mut String, node: &Node) {
    out.push('<');
    out.push_str(node.name());

    let text = match node.value() {
        Some(value) => {
            let _ = write!(out, " {}=\"{}\"", TYPE_ATTR, value.node_type().name());
            if let Some(count) = element_count(value) {
                let _ = write!(out, " {COUNT_ATTR}=\"{count}\"");
            }
            value_text(value)
        }
        None => String::new(),
    };
    for (name, value) in node.attributes() {
        let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
    }

    if text.is_empty() && node.children().is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    out.push_str(&escape(&text, false));
    for child in node.children() {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(node.name());
    out.push('>');
}

fn element_count(value: &Value) -> Option<usize> {
    match value {
        Value::S8Array(v) => Some(v.len()),
        Value::U8Array(v) => Some(v.len()),
        Value::S16Array(v) => Some(v.len()),
        Value::U16Array(v) => Some(v.len()),
        Value::S32Array(v) => Some(v.len()),
        Value::U32Array(v) => Some(v.len()),
        Value::S64Array(v) => Some(v.len()),
        Value::U64Array(v) => Some(v.len()),
        Value::Ip4Array(v) => Some(v.len()),
        Value::TimeArray(v) => Some(v.len()),
        Value::FloatArray(v) => Some(v.len()),
        Value::DoubleArray(v) => Some(v.len()),
        Value::BoolArray(v) => Some(v.len()),
        _ => None,
    }
}

/// Scalar text forms: decimal integers, `0`/`1` booleans, shortest
/// round-trip decimals for floats, lowercase hex for binaries, dotted quads
/// for addresses, space-separated items for arrays.
fn value_text(value: &Value) -> String {
    fn join<T>(items: &[T], f: impl Fn(&T) -> String) -> String {
        items.iter().map(f).collect::<Vec<_>>().join(" ")
    }
    match value {
        Value::S8(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::S16(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::S32(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::S64(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::Str(v) => v.clone(),
        Value::Bin(v) => hex::encode(v),
        Value::Ip4(v) => v.to_string(),
        Value::Time(v) => v.to_string(),
        // {:?} keeps the trailing ".0" on whole numbers and prints the
        // shortest string that parses back to the identical bits.
        Value::Float(v) => format!("{v:?}"),
        Value::Double(v) => format!("{v:?}"),
        Value::Bool(v) => if *v { "1" } else { "0" }.to_owned(),
        Value::S8Array(v) => join(v, |x| x.to_string()),
        Value::U8Array(v) => join(v, |x| x.to_string()),
        Value::S16Array(v) => join(v, |x| x.to_string()),
        Value::U16Array(v) => join(v, |x| x.to_string()),
        Value::S32Array(v) => join(v, |x| x.to_string()),
        Value::U32Array(v) => join(v, |x| x.to_string()),
        Value::S64Array(v) => join(v, |x| x.to_string()),
        Value::U64Array(v) => join(v, |x| x.to_string()),
        Value::Ip4Array(v) => join(v, |x| x.to_string()),
        Value::TimeArray(v) => join(v, |x| x.to_string()),
        Value::FloatArray(v) => join(v, |x| format!("{x:?}")),
        Value::DoubleArray(v) => join(v, |x| format!("{x:?}")),
        Value::BoolArray(v) => join(v, |x| if *x { "1".into() } else { "0".into() }),
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\'' if attribute => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
