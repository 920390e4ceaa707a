//! Binary document encoder

use hashbrown::HashMap;

use crate::encoding::Charset;
use crate::error::DocumentError;
use crate::node::{Node, Value};
use crate::sixbit;
use crate::types::{ATTRIBUTE_FLAG, ATTRIBUTE_TAG, NODE_END, SECTION_END};
use crate::BINARY_MAGIC;

/// Encode a document tree into its binary wire form.
///
/// # Errors
/// Fails only when a string in the tree has no representation in the
/// chosen charset.
pub fn encode(root: &Node, charset: Charset) -> Result<Vec<u8>, DocumentError> {
    let mut stream = Vec::new();
    let mut pool = Pool::default();
    write_node(&mut stream, &mut pool, root, charset)?;
    stream.push(SECTION_END);

    let id = charset.binary_id();
    let mut out = Vec::with_capacity(8 + stream.len() + 4 + pool.buf.len());
    out.push(BINARY_MAGIC);
    out.push(id);
    out.push(!id);
    out.push(!id);
    out.extend_from_slice(&(stream.len() as u32).to_be_bytes());
    out.extend_from_slice(&stream);
    out.extend_from_slice(&(pool.buf.len() as u32).to_be_bytes());
    out.extend_from_slice(&pool.buf);
    Ok(out)
}

fn write_node(
    stream: &mut Vec<u8>,
    pool: &mut Pool,
    node: &Node,
    charset: Charset,
) -> Result<(), DocumentError> {
    let mut tag = node.node_type().info().tag;
    if node.has_attributes() {
        tag |= ATTRIBUTE_FLAG;
    }
    stream.push(tag);
    sixbit::pack(node.name(), stream);

    if let Some(value) = node.value() {
        write_value(stream, pool, value, charset)?;
    }

    for (name, value) in node.attributes() {
        stream.push(ATTRIBUTE_TAG);
        sixbit::pack(name, stream);
        pad_to(stream, 4);
        let offset = pool.push_string(value, charset)?;
        stream.extend_from_slice(&offset.to_be_bytes());
    }

    for child in node.children() {
        write_node(stream, pool, child, charset)?;
    }
    stream.push(NODE_END);
    Ok(())
}

fn write_value(
    stream: &mut Vec<u8>,
    pool: &mut Pool,
    value: &Value,
    charset: Charset,
) -> Result<(), DocumentError> {
    match value {
        Value::Str(s) => {
            pad_to(stream, 4);
            let offset = pool.push_string(s, charset)?;
            stream.extend_from_slice(&offset.to_be_bytes());
        }
        Value::Bin(bytes) => {
            pad_to(stream, 4);
            stream.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            let offset = pool.append(bytes);
            stream.extend_from_slice(&offset.to_be_bytes());
        }
        other => {
            if let Some(body) = array_bytes(other) {
                pad_to(stream, 4);
                stream.extend_from_slice(&(body.len() as u32).to_be_bytes());
                let offset = pool.append(&body);
                stream.extend_from_slice(&offset.to_be_bytes());
            } else {
                pad_to(stream, other.node_type().info().align);
                write_fixed(stream, other);
            }
        }
    }
    Ok(())
}

/// Inline (fixed-size) scalar payloads, big-endian.
fn write_fixed(stream: &mut Vec<u8>, value: &Value) {
    match value {
        Value::S8(v) => stream.push(*v as u8),
        Value::U8(v) => stream.push(*v),
        Value::S16(v) => stream.extend_from_slice(&v.to_be_bytes()),
        Value::U16(v) => stream.extend_from_slice(&v.to_be_bytes()),
        Value::S32(v) => stream.extend_from_slice(&v.to_be_bytes()),
        Value::U32(v) => stream.extend_from_slice(&v.to_be_bytes()),
        Value::S64(v) => stream.extend_from_slice(&v.to_be_bytes()),
        Value::U64(v) => stream.extend_from_slice(&v.to_be_bytes()),
        Value::Float(v) => stream.extend_from_slice(&v.to_be_bytes()),
        Value::Double(v) => stream.extend_from_slice(&v.to_be_bytes()),
        // True always encodes as 1, whatever byte it decoded from.
        Value::Bool(v) => stream.push(u8::from(*v)),
        Value::Ip4(v) => stream.extend_from_slice(&v.octets()),
        Value::Time(v) => stream.extend_from_slice(&v.to_be_bytes()),
        _ => unreachable!("pooled types handled by write_value"),
    }
}

/// Array payload bodies: elements big-endian, back to back. `None` for
/// non-array values.
fn array_bytes(value: &Value) -> Option<Vec<u8>> {
    fn packed<T, const N: usize>(items: &[T], f: impl Fn(&T) -> [u8; N]) -> Vec<u8> {
        let mut body = Vec::with_capacity(items.len() * N);
        for item in items {
            body.extend_from_slice(&f(item));
        }
        body
    }
    match value {
        Value::S8Array(v) => Some(packed(v, |x| [*x as u8])),
        Value::U8Array(v) => Some(v.clone()),
        Value::S16Array(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::U16Array(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::S32Array(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::U32Array(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::S64Array(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::U64Array(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::Ip4Array(v) => Some(packed(v, |x| x.octets())),
        Value::TimeArray(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::FloatArray(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::DoubleArray(v) => Some(packed(v, |x| x.to_be_bytes())),
        Value::BoolArray(v) => Some(packed(v, |x| [u8::from(*x)])),
        _ => None,
    }
}

fn pad_to(stream: &mut Vec<u8>, align: usize) {
    while stream.len() % align != 0 {
        stream.push(0);
    }
}

/// Data pool under construction. Identical strings share one entry; raw
/// binaries and array bodies are appended as-is.
#[derive(Default)]
struct Pool {
    buf: Vec<u8>,
    strings: HashMap<Vec<u8>, u32>,
}

impl Pool {
    fn append(&mut self, bytes: &[u8]) -> u32 {
        while self.buf.len() % 4 != 0 {
            self.buf.push(0);
        }
        let offset = self.buf.len() as u32;
        self.buf.extend_from_slice(bytes);
        offset
    }

    fn push_string(&mut self, s: &str, charset: Charset) -> Result<u32, DocumentError> {
        let mut bytes = charset.encode(s).ok_or_else(|| DocumentError::Unencodable {
            charset: charset.xml_name(),
            text: s.to_owned(),
        })?;
        bytes.push(0);
        if let Some(&offset) = self.strings.get(&bytes) {
            return Ok(offset);
        }
        let offset = self.append(&bytes);
        self.strings.insert(bytes, offset);
        Ok(offset)
    }
}
