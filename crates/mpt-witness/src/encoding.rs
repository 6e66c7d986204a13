//! Nibble and node-encoding utilities.
//!
//! Proof elements are opaque byte strings; everything the aligner needs to
//! know about them is recovered here: the 17-item list is a branch, a 2-item
//! list is an extension or a leaf depending on the high nibble of its compact
//! path, and a 32-byte string is a hash reference.
use crate::error::WitnessError;
use alloy_primitives::{Bytes, B256};
use alloy_rlp::{Header, PayloadView};

/// The terminator nibble marking the end of a leaf key path.
pub const TERMINATOR: u8 = 16;

/// Expands key bytes into nibbles and appends the terminator.
pub fn keybytes_to_hex(key: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(key.len() * 2 + 1);
    for byte in key {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    nibbles.push(TERMINATOR);
    nibbles
}

/// A child slot inside a branch or extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// A node short enough to be embedded verbatim.
    Inline(Bytes),
    /// A 32-byte reference resolvable through the preimage oracle.
    Hashed(B256),
}

/// The parsed shape of one proof element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedNode {
    Branch,
    Extension { path: Vec<u8>, child: Child },
    Leaf { path: Vec<u8>, value: Bytes },
    HashRef(B256),
}

/// Classifies a node encoding. Total on well-formed encodings.
pub fn classify(node: &[u8]) -> Result<ParsedNode, WitnessError> {
    let mut buf = node;
    match Header::decode_raw(&mut buf)? {
        PayloadView::String(payload) => {
            if payload.len() == 32 {
                Ok(ParsedNode::HashRef(B256::from_slice(payload)))
            } else {
                Err(alloy_rlp::Error::Custom("string node is not a 32-byte hash").into())
            }
        }
        PayloadView::List(items) => match items.len() {
            17 => Ok(ParsedNode::Branch),
            2 => {
                let (path, is_leaf) = decode_compact_item(items[0])?;
                if is_leaf {
                    let mut value = items[1];
                    let value = Header::decode_bytes(&mut value, false)?;
                    Ok(ParsedNode::Leaf {
                        path,
                        value: Bytes::copy_from_slice(value),
                    })
                } else {
                    Ok(ParsedNode::Extension {
                        path,
                        child: decode_child(items[1])?,
                    })
                }
            }
            _ => Err(alloy_rlp::Error::Custom("list node is neither a branch nor a pair").into()),
        },
    }
}

/// True iff the top-level item count is 17. Total: malformed input is not a
/// branch.
pub fn is_branch(node: &[u8]) -> bool {
    let mut buf = node;
    matches!(Header::decode_raw(&mut buf), Ok(PayloadView::List(items)) if items.len() == 17)
}

/// Decodes the compact-encoded path of an extension or leaf element into raw
/// nibbles (terminator excluded).
pub fn extract_ext_nibbles(node: &[u8]) -> Result<Vec<u8>, WitnessError> {
    match classify(node)? {
        ParsedNode::Extension { path, .. } | ParsedNode::Leaf { path, .. } => Ok(path),
        _ => Err(alloy_rlp::Error::Custom("node carries no embedded path").into()),
    }
}

// Decodes one RLP string item holding a compact-encoded path. Returns the raw
// nibbles and whether the prefix marks a leaf.
pub(crate) fn decode_compact_item(item: &[u8]) -> Result<(Vec<u8>, bool), WitnessError> {
    let mut buf = item;
    let compact = Header::decode_bytes(&mut buf, false)?;
    let Some(&first) = compact.first() else {
        return Err(alloy_rlp::Error::InputTooShort.into());
    };
    let (is_leaf, odd) = match first >> 4 {
        0b0000 => (false, false),
        0b0001 => (false, true),
        0b0010 => (true, false),
        0b0011 => (true, true),
        _ => return Err(alloy_rlp::Error::Custom("invalid compact path prefix").into()),
    };

    let mut nibbles = Vec::with_capacity(compact.len() * 2);
    if odd {
        nibbles.push(first & 0x0f);
    }
    for byte in &compact[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    Ok((nibbles, is_leaf))
}

// Parses a branch or extension child slot item.
fn decode_child(item: &[u8]) -> Result<Child, WitnessError> {
    let mut buf = item;
    match Header::decode_raw(&mut buf)? {
        PayloadView::String(payload) if payload.len() == 32 => {
            Ok(Child::Hashed(B256::from_slice(payload)))
        }
        PayloadView::String(_) => {
            Err(alloy_rlp::Error::Custom("child string is not a 32-byte hash").into())
        }
        PayloadView::List(_) => Ok(Child::Inline(Bytes::copy_from_slice(item))),
    }
}
