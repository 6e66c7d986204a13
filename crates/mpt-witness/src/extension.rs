//! Parsing extension nodes into the views a branch row folds in.
use crate::encoding::decode_compact_item;
use crate::error::WitnessError;
use crate::node::ExtensionView;
use alloy_primitives::Bytes;
use alloy_rlp::{Header, PayloadView};

/// Width of one padded item view.
pub(crate) const VALUE_LEN: usize = 34;

/// Parses the S and C extension nodes at one proof level.
///
/// Returns the number of nibbles the extension consumes together with the
/// `ExtensionView` carried by the following branch row: the raw encodings,
/// the S-side list header bytes, and the four zero-padded item views
/// (S path, S child, C path, C child). The proof's own nibble record, when
/// present, is authoritative for the count.
pub fn prepare_extensions(
    nibbles: &[u8],
    s: &[u8],
    c: &[u8],
) -> Result<(u8, ExtensionView), WitnessError> {
    let (count, list_rlp_bytes, key_s, child_s) = parse_extension(s)?;
    let (_, _, key_c, child_c) = parse_extension(c)?;

    let number_of_nibbles = if nibbles.is_empty() {
        count
    } else {
        debug_assert_eq!(
            nibbles.len(),
            count as usize,
            "proof nibble record disagrees with the node path"
        );
        nibbles.len() as u8
    };

    let view = ExtensionView {
        s_encoding: Bytes::copy_from_slice(s),
        c_encoding: Bytes::copy_from_slice(c),
        list_rlp_bytes,
        values: [key_s, child_s, key_c, child_c],
    };
    Ok((number_of_nibbles, view))
}

// Splits an extension encoding into (nibble count, list header bytes,
// padded path item, padded child item).
fn parse_extension(node: &[u8]) -> Result<(u8, Bytes, Bytes, Bytes), WitnessError> {
    let mut buf = node;
    let PayloadView::List(items) = Header::decode_raw(&mut buf)? else {
        return Err(alloy_rlp::Error::Custom("extension node is not a list").into());
    };
    if items.len() != 2 {
        return Err(alloy_rlp::Error::Custom("extension node is not a two-item list").into());
    }

    let mut past_header = node;
    Header::decode(&mut past_header)?;
    let header_len = node.len() - past_header.len();

    let (path, _) = decode_compact_item(items[0])?;
    Ok((
        path.len() as u8,
        Bytes::copy_from_slice(&node[..header_len]),
        pad_value(items[0])?,
        pad_value(items[1])?,
    ))
}

// Zero-pads one RLP item into the fixed 34-byte slot.
fn pad_value(item: &[u8]) -> Result<Bytes, WitnessError> {
    if item.len() > VALUE_LEN {
        return Err(alloy_rlp::Error::Custom("extension item exceeds its 34-byte slot").into());
    }
    let mut out = vec![0u8; VALUE_LEN];
    out[..item.len()].copy_from_slice(item);
    Ok(Bytes::from(out))
}
