//! Textual document reader
//!
//! A minimal scanner: the leading `<?xml?>` declaration, tags, attributes,
//! text, and the five named entities. Everything else the dialect never
//! uses (DOCTYPE, CDATA, comments, namespaces) is rejected outright.

use std::net::Ipv4Addr;

use super::{COUNT_ATTR, TYPE_ATTR};
use crate::encoding::Charset;
use crate::error::{DocumentError, NodeError};
use crate::node::{self, Node, Value};
use crate::types::NodeType;

/// Decode a textual document, returning the root node and the charset from
/// the `<?xml encoding=…?>` declaration (UTF-8 when absent).
pub fn decode(data: &[u8]) -> Result<(Node, Charset), DocumentError> {
    let charset = sniff_charset(data);
    let xml = charset
        .decode(data)
        .ok_or(DocumentError::BadString { offset: 0 })?;
    let root = parse_document(&xml)?;
    Ok((root, charset))
}

/// The declaration is ASCII in every supported charset, so the charset can
/// be read straight off the raw bytes before decoding the document proper.
fn sniff_charset(data: &[u8]) -> Charset {
    let head_len = data.len().min(128);
    let head: String = data[..head_len]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
        .collect();
    let trimmed = head.trim_start();
    if !trimmed.starts_with("<?xml") {
        return Charset::Utf8;
    }
    let decl = trimmed.split("?>").next().unwrap_or(trimmed);
    let Some(idx) = decl.find("encoding=") else {
        return Charset::Utf8;
    };
    let rest = &decl[idx + "encoding=".len()..];
    let mut chars = rest.chars();
    let Some(quote @ ('"' | '\'')) = chars.next() else {
        return Charset::Utf8;
    };
    let name: String = chars.take_while(|c| *c != quote).collect();
    Charset::from_xml_name(&name).unwrap_or(Charset::Utf8)
}

fn parse_document(xml: &str) -> Result<Node, DocumentError> {
    let mut sc = Scanner { s: xml, pos: 0 };
    sc.skip_ws();
    if sc.eat("<?xml") {
        let Some(end) = sc.rest().find("?>") else {
            return Err(DocumentError::xml(sc.pos, "unterminated xml declaration"));
        };
        sc.pos += end + 2;
        sc.skip_ws();
    }
    let root = parse_element(&mut sc)?;
    sc.skip_ws();
    if sc.pos != sc.s.len() {
        return Err(DocumentError::xml(sc.pos, "content after root element"));
    }
    Ok(root)
}

struct Scanner<'a> {
    s: &'a str,
    pos: usize,
}

impl Scanner<'_> {
    fn rest(&self) -> &str {
        &self.s[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), DocumentError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(DocumentError::xml(self.pos, format!("expected {token:?}")))
        }
    }

    /// Tag and attribute identifiers.
    fn ident(&mut self) -> Result<&str, DocumentError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'.' | b'-' | b':')
        ) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(DocumentError::xml(start, "expected a name"));
        }
        Ok(&self.s[start..self.pos])
    }

    /// Raw text up to the next markup byte, entities expanded.
    fn text_run(&mut self, out: &mut String) -> Result<(), DocumentError> {
        loop {
            let rest = self.rest();
            let stop = rest
                .find(['<', '&'])
                .unwrap_or(rest.len());
            out.push_str(&rest[..stop]);
            self.pos += stop;
            match self.peek() {
                Some(b'&') => out.push(self.entity()?),
                _ => return Ok(()),
            }
        }
    }

    fn entity(&mut self) -> Result<char, DocumentError> {
        let start = self.pos;
        self.pos += 1; // '&'
        let Some(end) = self.rest().find(';') else {
            return Err(DocumentError::xml(start, "unterminated entity"));
        };
        let name = &self.s[self.pos..self.pos + end];
        let c = match name {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                return Err(DocumentError::xml(
                    start,
                    format!("unsupported entity &{name};"),
                ));
            }
        };
        self.pos += end + 1;
        Ok(c)
    }
}

fn parse_element(sc: &mut Scanner<'_>) -> Result<Node, DocumentError> {
    let elem_at = sc.pos;
    sc.expect("<")?;
    let name = sc.ident()?.to_owned();

    let mut attrs: Vec<(String, String)> = Vec::new();
    let self_closing = loop {
        sc.skip_ws();
        if sc.eat("/>") {
            break true;
        }
        if sc.eat(">") {
            break false;
        }
        let attr_name = sc.ident()?.to_owned();
        sc.skip_ws();
        sc.expect("=")?;
        sc.skip_ws();
        let quote = match sc.peek() {
            Some(q @ (b'"' | b'\'')) => {
                sc.pos += 1;
                q as char
            }
            _ => return Err(DocumentError::xml(sc.pos, "expected quoted attribute value")),
        };
        let mut value = String::new();
        loop {
            let rest = sc.rest();
            let stop = rest
                .find([quote, '&'])
                .ok_or_else(|| DocumentError::xml(sc.pos, "unterminated attribute value"))?;
            value.push_str(&rest[..stop]);
            sc.pos += stop;
            if sc.peek() == Some(b'&') {
                value.push(sc.entity()?);
            } else {
                sc.pos += 1; // closing quote
                break;
            }
        }
        attrs.push((attr_name, value));
    };

    let mut text = String::new();
    let mut children = Vec::new();
    if !self_closing {
        loop {
            sc.text_run(&mut text)?;
            if sc.eat("</") {
                let close = sc.ident()?.to_owned();
                sc.skip_ws();
                sc.expect(">")?;
                if close != name {
                    return Err(DocumentError::xml(
                        elem_at,
                        format!("<{name}> closed by </{close}>"),
                    ));
                }
                break;
            }
            match sc.rest().as_bytes() {
                [b'<', b'!' | b'?', ..] => {
                    return Err(DocumentError::xml(sc.pos, "unsupported markup"));
                }
                [b'<', ..] => children.push(parse_element(sc)?),
                _ => return Err(DocumentError::UnexpectedEof { offset: sc.pos }),
            }
        }
    }

    build_node(name, attrs, text, children, elem_at)
}

fn build_node(
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
    at: usize,
) -> Result<Node, DocumentError> {
    node::validate_name(&name)?;

    let mut ty = None;
    let mut count = None;
    let mut plain_attrs = Vec::new();
    for (attr_name, attr_value) in attrs {
        match attr_name.as_str() {
            TYPE_ATTR => {
                ty = Some(NodeType::from_name(&attr_value).ok_or_else(|| {
                    DocumentError::xml(at, format!("unknown __type {attr_value:?}"))
                })?);
            }
            COUNT_ATTR => {
                count = Some(attr_value.parse::<usize>().map_err(|_| {
                    DocumentError::xml(at, format!("bad __count {attr_value:?}"))
                })?);
            }
            _ => plain_attrs.push((attr_name, attr_value)),
        }
    }

    let value = match ty {
        // No __type means void; surrounding whitespace from pretty-printed
        // documents is not content.
        None | Some(NodeType::Void) => None,
        Some(NodeType::Str) => Some(Value::Str(text)),
        Some(ty) if ty.is_array() => {
            let value = parse_array_text(ty, &text, at)?;
            if let Some(expected) = count {
                let actual = text.split_whitespace().count();
                if actual != expected {
                    return Err(DocumentError::xml(
                        at,
                        format!("__count {expected} but {actual} elements"),
                    ));
                }
            }
            Some(value)
        }
        Some(ty) => Some(parse_scalar_text(ty, text.trim(), at)?),
    };

    let mut node = Node::from_wire(name, value);
    for (attr_name, attr_value) in plain_attrs {
        node::validate_name(&attr_name)?;
        node.push_attribute(attr_name, attr_value);
    }
    for child in children {
        node.append(child);
    }
    Ok(node)
}

fn parse_scalar_text(ty: NodeType, s: &str, at: usize) -> Result<Value, DocumentError> {
    let value = match ty {
        NodeType::S8 => Value::S8(int_elem(ty, s, at)?),
        NodeType::U8 => Value::U8(int_elem(ty, s, at)?),
        NodeType::S16 => Value::S16(int_elem(ty, s, at)?),
        NodeType::U16 => Value::U16(int_elem(ty, s, at)?),
        NodeType::S32 => Value::S32(int_elem(ty, s, at)?),
        NodeType::U32 => Value::U32(int_elem(ty, s, at)?),
        NodeType::S64 => Value::S64(int_elem(ty, s, at)?),
        NodeType::U64 => Value::U64(int_elem(ty, s, at)?),
        NodeType::Time => Value::Time(int_elem(ty, s, at)?),
        NodeType::Bool => Value::Bool(bool_elem(s, at)?),
        NodeType::Float => Value::Float(float_elem(s, at)?),
        NodeType::Double => Value::Double(double_elem(s, at)?),
        NodeType::Ip4 => Value::Ip4(ip4_elem(s, at)?),
        NodeType::Bin => Value::Bin(
            hex::decode(s).map_err(|_| DocumentError::xml(at, "bad hex in bin payload"))?,
        ),
        _ => unreachable!("str, void and arrays handled by build_node"),
    };
    Ok(value)
}

fn parse_array_text(ty: NodeType, text: &str, at: usize) -> Result<Value, DocumentError> {
    fn collect<T>(
        text: &str,
        f: impl Fn(&str) -> Result<T, DocumentError>,
    ) -> Result<Vec<T>, DocumentError> {
        text.split_whitespace().map(|part| f(part)).collect()
    }
    let value = match ty {
        NodeType::S8Array => Value::S8Array(collect(text, |p| int_elem(NodeType::S8, p, at))?),
        NodeType::U8Array => Value::U8Array(collect(text, |p| int_elem(NodeType::U8, p, at))?),
        NodeType::S16Array => Value::S16Array(collect(text, |p| int_elem(NodeType::S16, p, at))?),
        NodeType::U16Array => Value::U16Array(collect(text, |p| int_elem(NodeType::U16, p, at))?),
        NodeType::S32Array => Value::S32Array(collect(text, |p| int_elem(NodeType::S32, p, at))?),
        NodeType::U32Array => Value::U32Array(collect(text, |p| int_elem(NodeType::U32, p, at))?),
        NodeType::S64Array => Value::S64Array(collect(text, |p| int_elem(NodeType::S64, p, at))?),
        NodeType::U64Array => Value::U64Array(collect(text, |p| int_elem(NodeType::U64, p, at))?),
        NodeType::TimeArray => {
            Value::TimeArray(collect(text, |p| int_elem(NodeType::Time, p, at))?)
        }
        NodeType::BoolArray => Value::BoolArray(collect(text, |p| bool_elem(p, at))?),
        NodeType::FloatArray => Value::FloatArray(collect(text, |p| float_elem(p, at))?),
        NodeType::DoubleArray => Value::DoubleArray(collect(text, |p| double_elem(p, at))?),
        NodeType::Ip4Array => Value::Ip4Array(collect(text, |p| ip4_elem(p, at))?),
        _ => unreachable!("non-array types handled by build_node"),
    };
    Ok(value)
}

fn int_elem<T: TryFrom<i128>>(ty: NodeType, s: &str, at: usize) -> Result<T, DocumentError> {
    let wide: i128 = s
        .parse()
        .map_err(|_| DocumentError::xml(at, format!("bad integer {s:?}")))?;
    T::try_from(wide).map_err(|_| {
        DocumentError::Node(NodeError::OutOfRange {
            ty: ty.name(),
            value: wide,
        })
    })
}

fn bool_elem(s: &str, at: usize) -> Result<bool, DocumentError> {
    let wide: i128 = s
        .parse()
        .map_err(|_| DocumentError::xml(at, format!("bad bool {s:?}")))?;
    Ok(wide != 0)
}

fn float_elem(s: &str, at: usize) -> Result<f32, DocumentError> {
    s.parse()
        .map_err(|_| DocumentError::xml(at, format!("bad float {s:?}")))
}

fn double_elem(s: &str, at: usize) -> Result<f64, DocumentError> {
    s.parse()
        .map_err(|_| DocumentError::xml(at, format!("bad double {s:?}")))
}

fn ip4_elem(s: &str, at: usize) -> Result<Ipv4Addr, DocumentError> {
    s.parse()
        .map_err(|_| DocumentError::xml(at, format!("bad ip4 {s:?}")))
}
