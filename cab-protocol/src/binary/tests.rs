//! Tests for the binary codec

use std::net::Ipv4Addr;

use super::{decode, encode};
use crate::error::DocumentError;
use crate::node::{Node, Value};
use crate::{BINARY_MAGIC, Charset};

fn roundtrip(node: &Node) -> Node {
    let bytes = encode(node, Charset::Utf8).unwrap();
    let (out, charset) = decode(&bytes).unwrap();
    assert_eq!(charset, Charset::Utf8);
    out
}

#[test]
fn test_empty_document() {
    let root = Node::void("call").unwrap();
    let bytes = encode(&root, Charset::Utf8).unwrap();
    // Header + node stream + pool length, empty pool:
    // tag, name record (1 length byte + 3 packed bytes), 0xFE, 0xFF.
    assert_eq!(bytes.len(), 8 + 7 + 4);
    assert_eq!(bytes[0], BINARY_MAGIC);
    assert_eq!(bytes[1], Charset::Utf8.binary_id());
    assert_eq!(roundtrip(&root), root);
}

#[test]
fn test_header_parity_enforced() {
    let root = Node::void("call").unwrap();
    let mut bytes = encode(&root, Charset::Utf8).unwrap();
    bytes[3] ^= 0x01;
    assert!(matches!(
        decode(&bytes),
        Err(DocumentError::BadParity { .. })
    ));
}

#[test]
fn test_bad_magic() {
    assert!(matches!(
        decode(&[0xE0, 0xA2, 0x5D, 0x5D, 0, 0, 0, 0]),
        Err(DocumentError::BadMagic {
            offset: 0,
            found: 0xE0
        })
    ));
}

#[test]
fn test_scalar_roundtrip() {
    let mut root = Node::void("data").unwrap();
    root.append(Node::with_value("a", -128i8).unwrap());
    root.append(Node::with_value("b", 65_535u16).unwrap());
    root.append(Node::with_value("c", i64::MIN).unwrap());
    root.append(Node::with_value("d", 3.141593f32).unwrap());
    root.append(Node::with_value("e", 2.718281828459045f64).unwrap());
    root.append(Node::with_value("f", true).unwrap());
    root.append(Node::with_value("g", Ipv4Addr::new(10, 0, 0, 7)).unwrap());
    root.append(Node::with_value("h", Value::Time(1_600_000_000)).unwrap());
    assert_eq!(roundtrip(&root), root);
}

#[test]
fn test_numeric_exactness() {
    // s64 min, float pi, bool, u16 array with extremes.
    let mut root = Node::void("nums").unwrap();
    root.append(Node::with_value("big", i64::MIN).unwrap());
    root.append(Node::with_value("pi", 3.141593f32).unwrap());
    root.append(Node::with_value("flag", true).unwrap());
    root.append(Node::with_value("seq", Value::U16Array(vec![0, 65_535, 32_768])).unwrap());
    let out = roundtrip(&root);
    assert_eq!(out.child("big").unwrap().as_s64().unwrap(), i64::MIN);
    assert_eq!(out.child("pi").unwrap().as_float().unwrap(), 3.141593f32);
    assert!(out.child("flag").unwrap().as_bool().unwrap());
    assert_eq!(
        out.child("seq").unwrap().as_u16_array().unwrap(),
        vec![0, 65_535, 32_768]
    );
}

#[test]
fn test_pooled_types_roundtrip() {
    let mut root = Node::void("data").unwrap();
    root.append(Node::with_value("name", "RHYTHM MASTER").unwrap());
    root.append(Node::with_value("blob", Value::Bin(vec![0xDE, 0xAD, 0xBE, 0xEF])).unwrap());
    root.append(Node::with_value("empty", Value::U32Array(Vec::new())).unwrap());
    root.append(
        Node::with_value("mixed", Value::S32Array(vec![i32::MIN, -1, 0, i32::MAX])).unwrap(),
    );
    assert_eq!(roundtrip(&root), root);
}

#[test]
fn test_attributes_survive_in_order() {
    let mut root = Node::void("call").unwrap();
    root.set_attribute("model", "M39:J:B:A:2021042600").unwrap();
    root.set_attribute("srcid", "00010203040506").unwrap();
    root.set_attribute("tag", "5a81f3e2").unwrap();
    let out = roundtrip(&root);
    let attrs: Vec<_> = out.attributes().collect();
    assert_eq!(
        attrs,
        vec![
            ("model", "M39:J:B:A:2021042600"),
            ("srcid", "00010203040506"),
            ("tag", "5a81f3e2"),
        ]
    );
}

#[test]
fn test_string_pool_dedup_and_expanded_pools() {
    let mut root = Node::void("list").unwrap();
    for _ in 0..3 {
        let mut entry = Node::void("entry").unwrap();
        entry.set_attribute("kind", "shared-value").unwrap();
        root.append(entry);
    }
    let bytes = encode(&root, Charset::Utf8).unwrap();
    // One pooled copy of "shared-value\0", 4-aligned.
    let pool_len = "shared-value".len() + 1;
    assert_eq!(&bytes[bytes.len() - pool_len..bytes.len() - 1], b"shared-value");
    assert_eq!(decode(&bytes).unwrap().0, root);
}

#[test]
fn test_shift_jis_strings() {
    let mut root = Node::void("profile").unwrap();
    root.append(Node::with_value("name", "プレイヤー").unwrap());
    root.set_attribute("loc", "大阪").unwrap();
    let bytes = encode(&root, Charset::ShiftJis).unwrap();
    let (out, charset) = decode(&bytes).unwrap();
    assert_eq!(charset, Charset::ShiftJis);
    assert_eq!(out, root);
}

#[test]
fn test_unencodable_string_rejected() {
    let root = Node::with_value("name", "résumé").unwrap();
    assert!(matches!(
        encode(&root, Charset::Ascii),
        Err(DocumentError::Unencodable { .. })
    ));
}

#[test]
fn test_nested_children_and_duplicates() {
    let mut root = Node::void("response").unwrap();
    let mut music = Node::void("music").unwrap();
    for id in [103u32, 205, 311] {
        let mut entry = Node::void("entry").unwrap();
        entry.append(Node::with_value("id", id).unwrap());
        entry.append(Node::with_value("score", id * 1000).unwrap());
        music.append(entry);
    }
    root.append(music);
    let out = roundtrip(&root);
    assert_eq!(out, root);
    let entries: Vec<_> = out.child("music").unwrap().children_named("entry").collect();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].child("id").unwrap().as_u32().unwrap(), 311);
}

#[test]
fn test_trailing_compression_byte_tolerated() {
    let root = Node::void("call").unwrap();
    let mut bytes = encode(&root, Charset::Utf8).unwrap();
    bytes.push(0x00);
    assert_eq!(decode(&bytes).unwrap().0, root);
    bytes.push(0x00);
    assert!(matches!(decode(&bytes), Err(DocumentError::Trailing { .. })));
}

#[test]
fn test_truncated_document() {
    let mut root = Node::void("data").unwrap();
    root.append(Node::with_value("v", 9000u32).unwrap());
    let bytes = encode(&root, Charset::Utf8).unwrap();
    for cut in [3, 9, bytes.len() - 5] {
        assert!(decode(&bytes[..cut]).is_err(), "cut at {cut} accepted");
    }
}

#[test]
fn test_unknown_type_tag() {
    let root = Node::void("x").unwrap();
    let mut bytes = encode(&root, Charset::Utf8).unwrap();
    bytes[8] = 0x3B; // first node's tag byte
    assert!(matches!(
        decode(&bytes),
        Err(DocumentError::UnknownTypeTag { tag: 0x3B, .. })
    ));
}

#[test]
fn test_pool_overrun_detected() {
    let mut root = Node::void("d").unwrap();
    root.append(Node::with_value("s", "hi").unwrap());
    let mut bytes = encode(&root, Charset::Utf8).unwrap();
    // Shrink the declared pool length so the string offset dangles.
    let stream_len =
        u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let pool_len_at = 8 + stream_len;
    bytes[pool_len_at..pool_len_at + 4].copy_from_slice(&0u32.to_be_bytes());
    bytes.truncate(pool_len_at + 4);
    assert!(matches!(
        decode(&bytes),
        Err(DocumentError::PoolOverrun { .. })
    ));
}
