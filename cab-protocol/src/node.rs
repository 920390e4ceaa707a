//! The document tree.
//!
//! A [`Node`] is a named, typed, attributed vertex with ordered children.
//! Names are not unique among siblings and child order is semantically
//! meaningful - several games index request children positionally. The tree
//! is strictly owned parent-to-child, so cycles cannot be constructed.

use std::net::Ipv4Addr;

use crate::MAX_NAME_LEN;
use crate::error::NodeError;
use crate::sixbit;
use crate::types::NodeType;

/// Payload of a non-void node. The variant fixes the wire type; integer
/// width and signedness live in the variant, not beside it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    S8(i8),
    U8(u8),
    S16(i16),
    U16(u16),
    S32(i32),
    U32(u32),
    S64(i64),
    U64(u64),
    Str(String),
    Bin(Vec<u8>),
    Ip4(Ipv4Addr),
    Time(u32),
    Float(f32),
    Double(f64),
    Bool(bool),
    S8Array(Vec<i8>),
    U8Array(Vec<u8>),
    S16Array(Vec<i16>),
    U16Array(Vec<u16>),
    S32Array(Vec<i32>),
    U32Array(Vec<u32>),
    S64Array(Vec<i64>),
    U64Array(Vec<u64>),
    Ip4Array(Vec<Ipv4Addr>),
    TimeArray(Vec<u32>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    BoolArray(Vec<bool>),
}

impl Value {
    /// Wire type of this payload.
    pub fn node_type(&self) -> NodeType {
        match self {
            Value::S8(_) => NodeType::S8,
            Value::U8(_) => NodeType::U8,
            Value::S16(_) => NodeType::S16,
            Value::U16(_) => NodeType::U16,
            Value::S32(_) => NodeType::S32,
            Value::U32(_) => NodeType::U32,
            Value::S64(_) => NodeType::S64,
            Value::U64(_) => NodeType::U64,
            Value::Str(_) => NodeType::Str,
            Value::Bin(_) => NodeType::Bin,
            Value::Ip4(_) => NodeType::Ip4,
            Value::Time(_) => NodeType::Time,
            Value::Float(_) => NodeType::Float,
            Value::Double(_) => NodeType::Double,
            Value::Bool(_) => NodeType::Bool,
            Value::S8Array(_) => NodeType::S8Array,
            Value::U8Array(_) => NodeType::U8Array,
            Value::S16Array(_) => NodeType::S16Array,
            Value::U16Array(_) => NodeType::U16Array,
            Value::S32Array(_) => NodeType::S32Array,
            Value::U32Array(_) => NodeType::U32Array,
            Value::S64Array(_) => NodeType::S64Array,
            Value::U64Array(_) => NodeType::U64Array,
            Value::Ip4Array(_) => NodeType::Ip4Array,
            Value::TimeArray(_) => NodeType::TimeArray,
            Value::FloatArray(_) => NodeType::FloatArray,
            Value::DoubleArray(_) => NodeType::DoubleArray,
            Value::BoolArray(_) => NodeType::BoolArray,
        }
    }

    /// Build an integer-typed value from a wide intermediate, enforcing the
    /// target type's range. Non-integer types are a [`NodeError::TypeMismatch`].
    pub fn from_i128(ty: NodeType, v: i128) -> Result<Value, NodeError> {
        fn narrow<T: TryFrom<i128>>(ty: NodeType, v: i128) -> Result<T, NodeError> {
            T::try_from(v).map_err(|_| NodeError::OutOfRange {
                ty: ty.name(),
                value: v,
            })
        }
        match ty {
            NodeType::S8 => Ok(Value::S8(narrow(ty, v)?)),
            NodeType::U8 => Ok(Value::U8(narrow(ty, v)?)),
            NodeType::S16 => Ok(Value::S16(narrow(ty, v)?)),
            NodeType::U16 => Ok(Value::U16(narrow(ty, v)?)),
            NodeType::S32 => Ok(Value::S32(narrow(ty, v)?)),
            NodeType::U32 => Ok(Value::U32(narrow(ty, v)?)),
            NodeType::S64 => Ok(Value::S64(narrow(ty, v)?)),
            NodeType::U64 => Ok(Value::U64(narrow(ty, v)?)),
            NodeType::Time => Ok(Value::Time(narrow(ty, v)?)),
            other => Err(NodeError::TypeMismatch {
                expected: "integer",
                actual: other.name(),
            }),
        }
    }

    /// Widen an integer-array payload to `i128` elements. `None` for every
    /// other payload kind.
    pub fn as_integers(&self) -> Option<Vec<i128>> {
        fn widen<T: Copy + Into<i128>>(v: &[T]) -> Vec<i128> {
            v.iter().map(|x| (*x).into()).collect()
        }
        match self {
            Value::S8Array(v) => Some(widen(v)),
            Value::U8Array(v) => Some(widen(v)),
            Value::S16Array(v) => Some(widen(v)),
            Value::U16Array(v) => Some(widen(v)),
            Value::S32Array(v) => Some(widen(v)),
            Value::U32Array(v) => Some(widen(v)),
            Value::S64Array(v) => Some(widen(v)),
            Value::U64Array(v) => Some(widen(v)),
            Value::TimeArray(v) => Some(widen(v)),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ($($rust:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$rust> for Value {
            fn from(v: $rust) -> Value {
                Value::$variant(v.into())
            }
        })+
    };
}

impl_value_from! {
    i8 => S8, u8 => U8, i16 => S16, u16 => U16, i32 => S32, u32 => U32,
    i64 => S64, u64 => U64, bool => Bool, f32 => Float, f64 => Double,
    String => Str, &str => Str, Ipv4Addr => Ip4,
}

/// A named, typed, attributed tree vertex with ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    value: Option<Value>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Node {
    /// Create a payload-free (`void`) node.
    pub fn void(name: &str) -> Result<Node, NodeError> {
        validate_name(name)?;
        Ok(Node {
            name: name.to_owned(),
            value: None,
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Create a node with a typed payload.
    ///
    /// ```
    /// # use cab_protocol::Node;
    /// let score = Node::with_value("score", 987_654u32).unwrap();
    /// assert_eq!(score.as_u32().unwrap(), 987_654);
    /// ```
    pub fn with_value(name: &str, value: impl Into<Value>) -> Result<Node, NodeError> {
        validate_name(name)?;
        Ok(Node {
            name: name.to_owned(),
            value: Some(value.into()),
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Decoder-side constructor: wire names already passed the sixbit
    /// alphabet so only structural invariants are re-checked.
    pub(crate) fn from_wire(name: String, value: Option<Value>) -> Node {
        Node {
            name,
            value,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire type of this node ([`NodeType::Void`] when payload-free).
    pub fn node_type(&self) -> NodeType {
        self.value
            .as_ref()
            .map(Value::node_type)
            .unwrap_or(NodeType::Void)
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Replace the payload with the same-typed `value`.
    ///
    /// # Errors
    /// `TypeMismatch` when the node's current type differs; the node is
    /// left untouched in that case.
    pub fn set_value(&mut self, value: Value) -> Result<(), NodeError> {
        let current = self.node_type();
        if value.node_type() != current {
            return Err(NodeError::TypeMismatch {
                expected: current.name(),
                actual: value.node_type().name(),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    /// Replace an integer payload, enforcing the node type's range.
    pub fn set_integer(&mut self, v: i128) -> Result<(), NodeError> {
        let value = Value::from_i128(self.node_type(), v)?;
        self.value = Some(value);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Attributes (insertion order preserved for stable encoding)
    // -------------------------------------------------------------------------

    /// First value of the named attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing in place when the name already exists.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), NodeError> {
        validate_name(name)?;
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_owned();
        } else {
            self.attributes.push((name.to_owned(), value.to_owned()));
        }
        Ok(())
    }

    /// Decoder-side append: wire attribute names already passed the sixbit
    /// alphabet, order is taken from the document.
    pub(crate) fn push_attribute(&mut self, name: String, value: String) {
        self.attributes.push((name, value));
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    // -------------------------------------------------------------------------
    // Children (ordered, duplicate names allowed)
    // -------------------------------------------------------------------------

    pub fn append(&mut self, child: Node) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Every child with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn accessor_mismatch(&self, expected: &'static str) -> NodeError {
        NodeError::TypeMismatch {
            expected,
            actual: self.node_type().name(),
        }
    }
}

macro_rules! impl_node_accessors {
    ($($fn_name:ident, $variant:ident, $ret:ty, $label:expr;)+) => {
        impl Node {
            $(
                #[doc = concat!("Payload as `", $label, "`, or `TypeMismatch`.")]
                pub fn $fn_name(&self) -> Result<$ret, NodeError> {
                    match &self.value {
                        Some(Value::$variant(v)) => Ok(v.clone()),
                        _ => Err(self.accessor_mismatch($label)),
                    }
                }
            )+
        }
    };
}

impl_node_accessors! {
    as_s8, S8, i8, "s8";
    as_u8, U8, u8, "u8";
    as_s16, S16, i16, "s16";
    as_u16, U16, u16, "u16";
    as_s32, S32, i32, "s32";
    as_u32, U32, u32, "u32";
    as_s64, S64, i64, "s64";
    as_u64, U64, u64, "u64";
    as_str, Str, String, "str";
    as_bin, Bin, Vec<u8>, "bin";
    as_ip4, Ip4, Ipv4Addr, "ip4";
    as_time, Time, u32, "time";
    as_float, Float, f32, "float";
    as_double, Double, f64, "double";
    as_bool, Bool, bool, "bool";
    as_s8_array, S8Array, Vec<i8>, "s8_array";
    as_u8_array, U8Array, Vec<u8>, "u8_array";
    as_s16_array, S16Array, Vec<i16>, "s16_array";
    as_u16_array, U16Array, Vec<u16>, "u16_array";
    as_s32_array, S32Array, Vec<i32>, "s32_array";
    as_u32_array, U32Array, Vec<u32>, "u32_array";
    as_s64_array, S64Array, Vec<i64>, "s64_array";
    as_u64_array, U64Array, Vec<u64>, "u64_array";
    as_ip4_array, Ip4Array, Vec<Ipv4Addr>, "ip4_array";
    as_time_array, TimeArray, Vec<u32>, "time_array";
    as_float_array, FloatArray, Vec<f32>, "float_array";
    as_double_array, DoubleArray, Vec<f64>, "double_array";
    as_bool_array, BoolArray, Vec<bool>, "bool_array";
}

/// Node and attribute names share the sixbit alphabet, start with a letter
/// or `_`, and run 1..=64 characters.
pub(crate) fn validate_name(name: &str) -> Result<(), NodeError> {
    let invalid = || NodeError::InvalidName {
        name: name.to_owned(),
    };
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(invalid());
    }
    let first = name.as_bytes()[0];
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return Err(invalid());
    }
    if !name.bytes().all(sixbit::in_alphabet) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_node_has_no_value() {
        let node = Node::void("call").unwrap();
        assert_eq!(node.node_type(), NodeType::Void);
        assert!(node.value().is_none());
    }

    #[test]
    fn test_name_validation() {
        assert!(Node::void("pc").is_ok());
        assert!(Node::void("_meta").is_ok());
        assert!(Node::void("player.name_2").is_ok());
        assert!(Node::void("").is_err());
        assert!(Node::void("2fast").is_err());
        assert!(Node::void("has space").is_err());
        assert!(Node::void(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_out_of_range_does_not_mutate() {
        let mut node = Node::with_value("lvl", 7u8).unwrap();
        let err = node.set_integer(300).unwrap_err();
        assert_eq!(
            err,
            NodeError::OutOfRange {
                ty: "u8",
                value: 300
            }
        );
        assert_eq!(node.as_u8().unwrap(), 7);
    }

    #[test]
    fn test_accessor_type_mismatch() {
        let node = Node::with_value("id", "PLAYER-1").unwrap();
        let err = node.as_u32().unwrap_err();
        assert_eq!(
            err,
            NodeError::TypeMismatch {
                expected: "u32",
                actual: "str"
            }
        );
    }

    #[test]
    fn test_attribute_order_and_replacement() {
        let mut node = Node::void("call").unwrap();
        node.set_attribute("model", "M39:J:B:A:2021042600").unwrap();
        node.set_attribute("srcid", "0001020304").unwrap();
        node.set_attribute("model", "changed").unwrap();
        let attrs: Vec<_> = node.attributes().collect();
        assert_eq!(
            attrs,
            vec![("model", "changed"), ("srcid", "0001020304")]
        );
    }

    #[test]
    fn test_duplicate_children_first_match() {
        let mut root = Node::void("scores").unwrap();
        root.append(Node::with_value("entry", 100u32).unwrap());
        root.append(Node::with_value("entry", 200u32).unwrap());
        assert_eq!(root.child("entry").unwrap().as_u32().unwrap(), 100);
        assert_eq!(root.children_named("entry").count(), 2);
    }
}
