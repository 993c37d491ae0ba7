// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Tag pattern packets (id 84).
//!
//! A tag pattern is an expression tree over asset tags. Every node
//! carries its own two-slot offset table; child nodes serialize into the
//! parent's variable region, and each child's offsets are measured from
//! that child's own variable-block start.

use std::io::Cursor;

use bytes::{Buf, BufMut, BytesMut};

use crate::{
    assets::update::{
        OffsetTable, OffsetView, int_keyed_packet, nullbit, pack_nullbits,
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
        varint::{get_varint, put_varint},
    },
};

/// Nesting cap: a hostile payload cannot recurse the decoder off the
/// stack.
const MAX_PATTERN_DEPTH: u32 = 64;

/// Node operator.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TagOp {
    /// Leaf: matches assets carrying `tag`.
    #[default]
    Tag = 0,
    /// Every operand must match.
    All = 1,
    /// At least one operand must match.
    Any = 2,
    /// Inverts its single operand.
    Not = 3,
}

impl HytaleCodec for TagOp {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(*self as u8);
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        if !cur.has_remaining() {
            return Err(DecodeError::Incomplete);
        }
        match cur.get_u8() {
            0 => Ok(Self::Tag),
            1 => Ok(Self::All),
            2 => Ok(Self::Any),
            3 => Ok(Self::Not),
            value => Err(DecodeError::InvalidEnum {
                what: "TagOp",
                value,
            }),
        }
    }
}

/// One node of a pattern tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPattern {
    pub op: TagOp,
    pub tag: Option<String>,
    pub operands: Option<Vec<TagPattern>>,
}

impl TagPattern {
    /// Leaf matching a single tag.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            op: TagOp::Tag,
            tag: Some(name.into()),
            operands: None,
        }
    }

    /// Interior node over `operands`.
    pub fn node(op: TagOp, operands: Vec<TagPattern>) -> Self {
        Self {
            op,
            tag: None,
            operands: Some(operands),
        }
    }

    fn decode_at(cur: &mut Cursor<&[u8]>, depth: u32) -> Result<Self, DecodeError> {
        if depth > MAX_PATTERN_DEPTH {
            return Err(DecodeError::BadOffset(depth as i32));
        }
        let bits = u8::decode(cur)?;
        let op = TagOp::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let tag = if nullbit(bits, 0) && view.seek(cur, 0)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let operands = if nullbit(bits, 1) && view.seek(cur, 1)? {
            let count = get_varint(cur)?;
            let mut children = Vec::with_capacity(count.min(64) as usize);
            for _ in 0..count {
                children.push(Self::decode_at(cur, depth + 1)?);
            }
            Some(children)
        } else {
            None
        };
        Ok(Self { op, tag, operands })
    }
}

impl HytaleCodec for TagPattern {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[
            self.tag.is_some(),
            self.operands.is_some(),
        ]));
        self.op.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(tag) = &self.tag {
            table.mark(buf, 0)?;
            tag.encode(buf)?;
        }
        if let Some(operands) = &self.operands {
            table.mark(buf, 1)?;
            put_varint(buf, operands.len() as u32);
            for operand in operands {
                operand.encode(buf)?;
            }
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        Self::decode_at(cur, 0)
    }
}

int_keyed_packet! {
    UpdateTagPatterns, id = 84, patterns: TagPattern, max_size = 1_048_576
}
