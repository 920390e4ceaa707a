//! Binary document decoder

use std::net::Ipv4Addr;

use crate::BINARY_MAGIC;
use crate::encoding::Charset;
use crate::error::DocumentError;
use crate::node::{Node, Value};
use crate::sixbit;
use crate::types::{ATTRIBUTE_FLAG, ATTRIBUTE_TAG, NODE_END, NodeType, SECTION_END};

/// Decode a binary document, returning the root node and the charset the
/// document declared.
///
/// Accepts the encoder's own output as well as vendor documents with
/// fully-expanded (non-deduplicated) string pools, and tolerates one
/// trailing byte after the pool.
pub fn decode(data: &[u8]) -> Result<(Node, Charset), DocumentError> {
    if data.len() < 8 {
        return Err(DocumentError::UnexpectedEof { offset: data.len() });
    }
    if data[0] != BINARY_MAGIC {
        return Err(DocumentError::BadMagic {
            offset: 0,
            found: data[0],
        });
    }
    let id = data[1];
    let charset = Charset::from_binary_id(id)?;
    for &parity in &data[2..4] {
        if parity != !id {
            return Err(DocumentError::BadParity { id, parity });
        }
    }

    let stream_len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let stream_end = 8 + stream_len;
    let Some(stream) = data.get(8..stream_end) else {
        return Err(DocumentError::UnexpectedEof { offset: data.len() });
    };
    let Some(pool_len_bytes) = data.get(stream_end..stream_end + 4) else {
        return Err(DocumentError::UnexpectedEof { offset: data.len() });
    };
    let pool_len =
        u32::from_be_bytes([pool_len_bytes[0], pool_len_bytes[1], pool_len_bytes[2], pool_len_bytes[3]])
            as usize;
    let pool_start = stream_end + 4;
    let Some(pool) = data.get(pool_start..pool_start + pool_len) else {
        return Err(DocumentError::PoolOverrun {
            offset: 0,
            len: pool_len,
            pool_len: data.len().saturating_sub(pool_start),
        });
    };
    // At most one trailing byte (envelope compression residue).
    if data.len() > pool_start + pool_len + 1 {
        return Err(DocumentError::Trailing {
            offset: pool_start + pool_len + 1,
        });
    }

    let mut reader = Reader {
        stream,
        pos: 0,
        pool,
        charset,
    };
    let root = reader.read_node()?;
    if reader.read_u8()? != SECTION_END {
        return Err(DocumentError::Stream {
            offset: reader.abs() - 1,
            reason: "missing stream terminator",
        });
    }
    Ok((root, charset))
}

struct Reader<'a> {
    stream: &'a [u8],
    pos: usize,
    pool: &'a [u8],
    charset: Charset,
}

impl Reader<'_> {
    /// Absolute offset in the document, for error context.
    fn abs(&self) -> usize {
        8 + self.pos
    }

    fn read_u8(&mut self) -> Result<u8, DocumentError> {
        let Some(&byte) = self.stream.get(self.pos) else {
            return Err(DocumentError::UnexpectedEof { offset: self.abs() });
        };
        self.pos += 1;
        Ok(byte)
    }

    fn peek(&self) -> Result<u8, DocumentError> {
        self.stream
            .get(self.pos)
            .copied()
            .ok_or(DocumentError::UnexpectedEof { offset: self.abs() })
    }

    fn take(&mut self, len: usize) -> Result<&[u8], DocumentError> {
        let Some(bytes) = self.stream.get(self.pos..self.pos + len) else {
            return Err(DocumentError::UnexpectedEof {
                offset: 8 + self.stream.len(),
            });
        };
        self.pos += len;
        Ok(bytes)
    }

    fn read_u32(&mut self) -> Result<u32, DocumentError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Skip padding so the next payload sits at its element alignment,
    /// measured from the node-stream start.
    fn align(&mut self, align: usize) -> Result<(), DocumentError> {
        while self.pos % align != 0 {
            self.read_u8()?;
        }
        Ok(())
    }

    fn read_name(&mut self) -> Result<String, DocumentError> {
        let (name, used) = sixbit::unpack(self.stream, self.pos)?;
        self.pos += used;
        Ok(name)
    }

    fn read_node(&mut self) -> Result<Node, DocumentError> {
        let at = self.abs();
        let tag = self.read_u8()?;
        let ty = NodeType::from_tag(tag & !ATTRIBUTE_FLAG, at)?;
        let name = self.read_name()?;
        let value = self.read_value(ty)?;
        let mut node = Node::from_wire(name, value);

        // Attribute records directly follow the payload. The 0x40 flag on
        // the tag is informational; the records themselves are authoritative.
        while self.peek()? == ATTRIBUTE_TAG {
            self.pos += 1;
            let attr_name = self.read_name()?;
            self.align(4)?;
            let offset = self.read_u32()? as usize;
            let value = self.pool_string(offset)?;
            node.push_attribute(attr_name, value);
        }

        loop {
            match self.peek()? {
                NODE_END => {
                    self.pos += 1;
                    return Ok(node);
                }
                SECTION_END => {
                    return Err(DocumentError::Stream {
                        offset: self.abs(),
                        reason: "unterminated node",
                    });
                }
                _ => node.append(self.read_node()?),
            }
        }
    }

    fn read_value(&mut self, ty: NodeType) -> Result<Option<Value>, DocumentError> {
        let info = ty.info();
        let value = match ty {
            NodeType::Void => return Ok(None),
            NodeType::Str => {
                self.align(4)?;
                let offset = self.read_u32()? as usize;
                Value::Str(self.pool_string(offset)?)
            }
            NodeType::Bin => {
                self.align(4)?;
                let len = self.read_u32()? as usize;
                let offset = self.read_u32()? as usize;
                Value::Bin(self.pool_slice(offset, len)?.to_vec())
            }
            ty if ty.is_array() => {
                self.align(4)?;
                let at = self.abs();
                let byte_len = self.read_u32()? as usize;
                let offset = self.read_u32()? as usize;
                if byte_len % info.size != 0 {
                    return Err(DocumentError::BadArrayLength {
                        offset: at,
                        len: byte_len,
                        elem: info.size,
                    });
                }
                let body = self.pool_slice(offset, byte_len)?;
                parse_array(ty, body)
            }
            _ => {
                self.align(info.align)?;
                let bytes = self.take(info.size)?;
                parse_fixed(ty, bytes)
            }
        };
        Ok(Some(value))
    }

    fn pool_slice(&self, offset: usize, len: usize) -> Result<&[u8], DocumentError> {
        self.pool
            .get(offset..offset + len)
            .ok_or(DocumentError::PoolOverrun {
                offset,
                len,
                pool_len: self.pool.len(),
            })
    }

    /// NUL-terminated pooled string in the document charset.
    fn pool_string(&self, offset: usize) -> Result<String, DocumentError> {
        let tail = self.pool.get(offset..).ok_or(DocumentError::PoolOverrun {
            offset,
            len: 1,
            pool_len: self.pool.len(),
        })?;
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(DocumentError::PoolOverrun {
                offset,
                len: tail.len() + 1,
                pool_len: self.pool.len(),
            })?;
        self.charset
            .decode(&tail[..end])
            .ok_or(DocumentError::BadString { offset })
    }
}

fn parse_fixed(ty: NodeType, b: &[u8]) -> Value {
    match ty {
        NodeType::S8 => Value::S8(b[0] as i8),
        NodeType::U8 => Value::U8(b[0]),
        NodeType::S16 => Value::S16(i16::from_be_bytes([b[0], b[1]])),
        NodeType::U16 => Value::U16(u16::from_be_bytes([b[0], b[1]])),
        NodeType::S32 => Value::S32(i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        NodeType::U32 => Value::U32(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        NodeType::S64 => Value::S64(i64::from_be_bytes(b.try_into().unwrap_or_default())),
        NodeType::U64 => Value::U64(u64::from_be_bytes(b.try_into().unwrap_or_default())),
        NodeType::Float => Value::Float(f32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        NodeType::Double => Value::Double(f64::from_be_bytes(b.try_into().unwrap_or_default())),
        // Any nonzero wire byte is true.
        NodeType::Bool => Value::Bool(b[0] != 0),
        NodeType::Ip4 => Value::Ip4(Ipv4Addr::new(b[0], b[1], b[2], b[3])),
        NodeType::Time => Value::Time(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        _ => unreachable!("pooled types handled by read_value"),
    }
}

fn parse_array(ty: NodeType, body: &[u8]) -> Value {
    fn items<T>(body: &[u8], size: usize, f: impl Fn(&[u8]) -> T) -> Vec<T> {
        body.chunks_exact(size).map(f).collect()
    }
    match ty {
        NodeType::S8Array => Value::S8Array(items(body, 1, |b| b[0] as i8)),
        NodeType::U8Array => Value::U8Array(body.to_vec()),
        NodeType::S16Array => Value::S16Array(items(body, 2, |b| i16::from_be_bytes([b[0], b[1]]))),
        NodeType::U16Array => Value::U16Array(items(body, 2, |b| u16::from_be_bytes([b[0], b[1]]))),
        NodeType::S32Array => {
            Value::S32Array(items(body, 4, |b| i32::from_be_bytes([b[0], b[1], b[2], b[3]])))
        }
        NodeType::U32Array => {
            Value::U32Array(items(body, 4, |b| u32::from_be_bytes([b[0], b[1], b[2], b[3]])))
        }
        NodeType::S64Array => Value::S64Array(items(body, 8, |b| {
            i64::from_be_bytes(b.try_into().unwrap_or_default())
        })),
        NodeType::U64Array => Value::U64Array(items(body, 8, |b| {
            u64::from_be_bytes(b.try_into().unwrap_or_default())
        })),
        NodeType::Ip4Array => {
            Value::Ip4Array(items(body, 4, |b| Ipv4Addr::new(b[0], b[1], b[2], b[3])))
        }
        NodeType::TimeArray => {
            Value::TimeArray(items(body, 4, |b| u32::from_be_bytes([b[0], b[1], b[2], b[3]])))
        }
        NodeType::FloatArray => {
            Value::FloatArray(items(body, 4, |b| f32::from_be_bytes([b[0], b[1], b[2], b[3]])))
        }
        NodeType::DoubleArray => Value::DoubleArray(items(body, 8, |b| {
            f64::from_be_bytes(b.try_into().unwrap_or_default())
        })),
        NodeType::BoolArray => Value::BoolArray(items(body, 1, |b| b[0] != 0)),
        _ => unreachable!("fixed types handled by read_value"),
    }
}
