//! The closed node type set.
//!
//! Every node on the wire carries one of these tags. Integer types carry
//! width and signedness in the tag itself; each non-void scalar except `str`
//! and `bin` also has an array form. The set is closed - the codecs reject
//! anything else.

use crate::error::DocumentError;

/// Bit set on the wire tag when the node carries attributes
pub const ATTRIBUTE_FLAG: u8 = 0x40;

/// Pseudo-tag introducing an attribute record in the node stream
pub const ATTRIBUTE_TAG: u8 = 0x2E;

/// Closes the children of a node
pub const NODE_END: u8 = 0xFE;

/// Ends the node stream
pub const SECTION_END: u8 = 0xFF;

/// Wire type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Void,
    S8,
    U8,
    S16,
    U16,
    S32,
    U32,
    S64,
    U64,
    Str,
    Bin,
    Ip4,
    Time,
    Float,
    Double,
    Bool,
    S8Array,
    U8Array,
    S16Array,
    U16Array,
    S32Array,
    U32Array,
    S64Array,
    U64Array,
    Ip4Array,
    TimeArray,
    FloatArray,
    DoubleArray,
    BoolArray,
}

/// Static wire properties of a [`NodeType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    /// Tag byte on the binary wire (without the attribute flag)
    pub tag: u8,
    /// Tag name in the textual codec's `__type` attribute
    pub name: &'static str,
    /// Element size in bytes (0 for void)
    pub size: usize,
    /// Payload alignment inside the node stream
    pub align: usize,
    /// True when the payload lives in the data pool (str, bin, arrays)
    pub pooled: bool,
}

const fn info(tag: u8, name: &'static str, size: usize, pooled: bool) -> TypeInfo {
    let align = if size >= 4 { 4 } else { size };
    TypeInfo {
        tag,
        name,
        size,
        align,
        pooled,
    }
}

/// Every type in tag order, used for tag and name lookups.
const ALL: &[(NodeType, TypeInfo)] = &[
    (NodeType::Void, info(0x01, "void", 0, false)),
    (NodeType::S8, info(0x02, "s8", 1, false)),
    (NodeType::U8, info(0x03, "u8", 1, false)),
    (NodeType::S16, info(0x04, "s16", 2, false)),
    (NodeType::U16, info(0x05, "u16", 2, false)),
    (NodeType::S32, info(0x06, "s32", 4, false)),
    (NodeType::U32, info(0x07, "u32", 4, false)),
    (NodeType::S64, info(0x08, "s64", 8, false)),
    (NodeType::U64, info(0x09, "u64", 8, false)),
    (NodeType::Str, info(0x0A, "str", 1, true)),
    (NodeType::Bin, info(0x0B, "bin", 1, true)),
    (NodeType::Ip4, info(0x0C, "ip4", 4, false)),
    (NodeType::Time, info(0x0D, "time", 4, false)),
    (NodeType::Float, info(0x0E, "float", 4, false)),
    (NodeType::Double, info(0x0F, "double", 8, false)),
    (NodeType::Bool, info(0x10, "bool", 1, false)),
    (NodeType::S8Array, info(0x12, "s8_array", 1, true)),
    (NodeType::U8Array, info(0x13, "u8_array", 1, true)),
    (NodeType::S16Array, info(0x14, "s16_array", 2, true)),
    (NodeType::U16Array, info(0x15, "u16_array", 2, true)),
    (NodeType::S32Array, info(0x16, "s32_array", 4, true)),
    (NodeType::U32Array, info(0x17, "u32_array", 4, true)),
    (NodeType::S64Array, info(0x18, "s64_array", 8, true)),
    (NodeType::U64Array, info(0x19, "u64_array", 8, true)),
    (NodeType::Ip4Array, info(0x1C, "ip4_array", 4, true)),
    (NodeType::TimeArray, info(0x1D, "time_array", 4, true)),
    (NodeType::FloatArray, info(0x1E, "float_array", 4, true)),
    (NodeType::DoubleArray, info(0x1F, "double_array", 8, true)),
    (NodeType::BoolArray, info(0x20, "bool_array", 1, true)),
];

impl NodeType {
    /// Static wire properties of this type.
    pub fn info(self) -> TypeInfo {
        // ALL covers every variant; the linear scan is cold-path only for
        // lookups, accessors go through this table once per node.
        ALL.iter()
            .find(|(ty, _)| *ty == self)
            .map(|(_, info)| *info)
            .unwrap_or(TypeInfo {
                tag: 0,
                name: "void",
                size: 0,
                align: 1,
                pooled: false,
            })
    }

    /// Tag name used in the textual codec.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Look a type up by its wire tag (attribute flag already stripped).
    pub fn from_tag(tag: u8, offset: usize) -> Result<NodeType, DocumentError> {
        ALL.iter()
            .find(|(_, info)| info.tag == tag)
            .map(|(ty, _)| *ty)
            .ok_or(DocumentError::UnknownTypeTag { offset, tag })
    }

    /// Look a type up by its `__type` name.
    pub fn from_name(name: &str) -> Option<NodeType> {
        ALL.iter()
            .find(|(_, info)| info.name == name)
            .map(|(ty, _)| *ty)
    }

    /// True for the array form of any scalar.
    pub fn is_array(self) -> bool {
        matches!(
            self,
            NodeType::S8Array
                | NodeType::U8Array
                | NodeType::S16Array
                | NodeType::U16Array
                | NodeType::S32Array
                | NodeType::U32Array
                | NodeType::S64Array
                | NodeType::U64Array
                | NodeType::Ip4Array
                | NodeType::TimeArray
                | NodeType::FloatArray
                | NodeType::DoubleArray
                | NodeType::BoolArray
        )
    }
}
