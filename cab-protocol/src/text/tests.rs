//! Tests for the textual codec

use std::net::Ipv4Addr;

use super::{decode, encode};
use crate::error::{DocumentError, NodeError};
use crate::node::{Node, Value};
use crate::Charset;

fn roundtrip(node: &Node) -> Node {
    let bytes = encode(node, Charset::Utf8).unwrap();
    let (out, charset) = decode(&bytes).unwrap();
    assert_eq!(charset, Charset::Utf8);
    out
}

#[test]
fn test_void_node_shape() {
    let mut root = Node::void("call").unwrap();
    root.set_attribute("model", "M39:J:B:A:2021042600").unwrap();
    let bytes = encode(&root, Charset::Utf8).unwrap();
    let xml = String::from_utf8(bytes).unwrap();
    assert_eq!(
        xml,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <call model=\"M39:J:B:A:2021042600\"/>"
    );
    assert_eq!(roundtrip(&root), root);
}

#[test]
fn test_scalar_shapes() {
    let mut root = Node::void("d").unwrap();
    root.append(Node::with_value("n", -42i16).unwrap());
    root.append(Node::with_value("f", true).unwrap());
    root.append(Node::with_value("pi", 3.141593f32).unwrap());
    root.append(Node::with_value("ip", Ipv4Addr::new(192, 168, 0, 1)).unwrap());
    root.append(Node::with_value("blob", Value::Bin(vec![0xAB, 0x01])).unwrap());
    let xml = String::from_utf8(encode(&root, Charset::Utf8).unwrap()).unwrap();
    assert!(xml.contains("<n __type=\"s16\">-42</n>"));
    assert!(xml.contains("<f __type=\"bool\">1</f>"));
    assert!(xml.contains("<ip __type=\"ip4\">192.168.0.1</ip>"));
    assert!(xml.contains("<blob __type=\"bin\">ab01</blob>"));
    assert_eq!(roundtrip(&root), root);
}

#[test]
fn test_array_shape_and_count() {
    let node = Node::with_value("seq", Value::U16Array(vec![0, 65_535, 32_768])).unwrap();
    let xml = String::from_utf8(encode(&node, Charset::Utf8).unwrap()).unwrap();
    assert!(xml.contains("<seq __type=\"u16_array\" __count=\"3\">0 65535 32768</seq>"));
    assert_eq!(roundtrip(&node), node);

    let empty = Node::with_value("seq", Value::S64Array(Vec::new())).unwrap();
    let xml = String::from_utf8(encode(&empty, Charset::Utf8).unwrap()).unwrap();
    assert!(xml.contains("<seq __type=\"s64_array\" __count=\"0\"/>"));
    assert_eq!(roundtrip(&empty), empty);
}

#[test]
fn test_count_mismatch_rejected() {
    let xml = br#"<?xml version="1.0" encoding="UTF-8"?><a __type="u8_array" __count="2">1 2 3</a>"#;
    assert!(matches!(decode(xml), Err(DocumentError::Xml { .. })));
}

#[test]
fn test_str_roundtrip_with_entities() {
    let node = Node::with_value("msg", "scores <= 100 & \"perfect\"").unwrap();
    let xml = String::from_utf8(encode(&node, Charset::Utf8).unwrap()).unwrap();
    assert!(xml.contains("scores &lt;= 100 &amp; \"perfect\""));
    assert_eq!(roundtrip(&node), node);
}

#[test]
fn test_whitespace_tolerant_parse() {
    let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<call model="M39:J:B:A:2021042600">
    <pc method="get">
        <uid __type="u32"> 1337 </uid>
    </pc>
</call>"#;
    let (root, _) = decode(xml).unwrap();
    assert_eq!(root.name(), "call");
    let pc = root.child("pc").unwrap();
    assert_eq!(pc.attribute("method"), Some("get"));
    assert_eq!(pc.child("uid").unwrap().as_u32().unwrap(), 1337);
}

#[test]
fn test_out_of_range_surfaces() {
    let xml = br#"<a __type="u8">300</a>"#;
    assert!(matches!(
        decode(xml),
        Err(DocumentError::Node(NodeError::OutOfRange { ty: "u8", value: 300 }))
    ));
}

#[test]
fn test_shift_jis_document() {
    let mut root = Node::void("profile").unwrap();
    root.append(Node::with_value("name", "プレイヤー").unwrap());
    let bytes = encode(&root, Charset::ShiftJis).unwrap();
    assert!(bytes.windows(9).any(|w| w == b"Shift_JIS"));
    let (out, charset) = decode(&bytes).unwrap();
    assert_eq!(charset, Charset::ShiftJis);
    assert_eq!(out, root);
}

#[test]
fn test_missing_declaration_defaults_utf8() {
    let (node, charset) = decode(br#"<ping __type="u8">1</ping>"#).unwrap();
    assert_eq!(charset, Charset::Utf8);
    assert_eq!(node.as_u8().unwrap(), 1);
}

#[test]
fn test_rejected_markup() {
    assert!(decode(b"<!DOCTYPE call><call/>").is_err());
    assert!(decode(b"<a><![CDATA[x]]></a>").is_err());
    assert!(decode(b"<a>&unknown;</a>").is_err());
    assert!(decode(b"<a></b>").is_err());
    assert!(decode(b"<a/><b/>").is_err());
}

#[test]
fn test_exact_float_reproduction() {
    let mut root = Node::void("f").unwrap();
    root.append(Node::with_value("a", f32::MIN_POSITIVE).unwrap());
    root.append(Node::with_value("b", -0.0f32).unwrap());
    root.append(Node::with_value("c", 1.0e300f64).unwrap());
    let out = roundtrip(&root);
    assert_eq!(
        out.child("a").unwrap().as_float().unwrap().to_bits(),
        f32::MIN_POSITIVE.to_bits()
    );
    assert_eq!(
        out.child("b").unwrap().as_float().unwrap().to_bits(),
        (-0.0f32).to_bits()
    );
    assert_eq!(out.child("c").unwrap().as_double().unwrap(), 1.0e300f64);
}

#[test]
fn test_binary_and_text_agree() {
    // The same tree through both codecs decodes to the same value.
    let mut root = Node::void("player").unwrap();
    root.set_attribute("id", "41").unwrap();
    root.append(Node::with_value("name", "ACE").unwrap());
    root.append(Node::with_value("scores", Value::U32Array(vec![990_123, 1_000_000])).unwrap());
    let from_text = roundtrip(&root);
    let bin = crate::binary::encode(&root, Charset::Utf8).unwrap();
    let (from_bin, _) = crate::binary::decode(&bin).unwrap();
    assert_eq!(from_text, from_bin);
}
