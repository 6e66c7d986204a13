//! Branch row construction.
use crate::encoding::{classify, is_branch, ParsedNode};
use crate::error::WitnessError;
use crate::extension::prepare_extensions;
use crate::node::{BranchNode, ExtensionView};
use alloy_primitives::Bytes;

/// Assembles a branch row from the raw S and C branch encodings, the
/// extension folded in above it (if any), and the circuit indices.
pub fn prepare_branch_node(
    s: &[u8],
    c: &[u8],
    extension: Option<ExtensionView>,
    modified_index: u8,
    drifted_index: u8,
    is_placeholder_s: bool,
    is_placeholder_c: bool,
) -> BranchNode {
    BranchNode {
        s_encoding: Bytes::copy_from_slice(s),
        c_encoding: Bytes::copy_from_slice(c),
        extension,
        modified_index,
        drifted_index,
        is_placeholder_s,
        is_placeholder_c,
    }
}

/// Result of inserting the branch level that exists on only one side.
pub(crate) struct PlaceholderBranch {
    /// An extension changed its shared-prefix length alongside this branch.
    pub is_mod_extension: bool,
    /// Nibbles consumed by the extension above the added branch.
    pub number_of_nibbles: u8,
    pub node: BranchNode,
}

/// Builds the branch row for the level at which one proof is one branch
/// deeper than the other: the real branch bytes fill both sides and the
/// placeholder flag marks the absent one.
///
/// `stack_ext_s` carries the S-side extension for the stack-trie case in
/// which the element kinds mismatch at the same proof position; outside of
/// that case an extension accompanies the added branch exactly when the
/// proofs differ in length by two.
pub(crate) fn add_branch_and_placeholder(
    proof_s: &[Bytes],
    proof_c: &[Bytes],
    nibbles_s: &[Vec<u8>],
    nibbles_c: &[Vec<u8>],
    stack_ext_s: Option<&[u8]>,
    leaf_row0: &[u8],
    key: &[u8],
    key_index: usize,
    is_shorter_last_leaf: bool,
) -> Result<PlaceholderBranch, WitnessError> {
    let len_s = proof_s.len();
    let len_c = proof_c.len();
    let is_placeholder_s = len_s < len_c;
    let (long, long_nibbles, short) = if is_placeholder_s {
        (proof_c, nibbles_c, proof_s)
    } else {
        (proof_s, nibbles_s, proof_c)
    };
    let long_len = long.len();

    // The added branch is the long proof's last branch: its final element
    // when the proofs pair a branch directly against a leaf, the element
    // above the final leaf otherwise.
    let branch_elem: &[u8] = if is_branch(&long[long_len - 1]) {
        &long[long_len - 1]
    } else {
        &long[long_len - 2]
    };

    let (number_of_nibbles, extension) = if let Some(ext) = stack_ext_s {
        let (n, view) = prepare_extensions(&[], ext, ext)?;
        (n, Some(view))
    } else if long_len == short.len() + 2 {
        let ext_elem = &long[long_len - 3];
        let (n, view) = prepare_extensions(&long_nibbles[long_len - 3], ext_elem, ext_elem)?;
        (n, Some(view))
    } else {
        (0, None)
    };

    // A shorter proof ending in an extension (not a branch, not a leaf) means
    // the extension itself was reshaped by the modification.
    let is_mod_extension = !short.is_empty()
        && !is_branch(short.last().expect("non-empty proof"))
        && !is_shorter_last_leaf;

    let modified_index = key[key_index + number_of_nibbles as usize];
    let drifted_index = drifted_slot(leaf_row0, number_of_nibbles, key, key_index);

    let node = prepare_branch_node(
        branch_elem,
        branch_elem,
        extension,
        modified_index,
        drifted_index,
        is_placeholder_s,
        !is_placeholder_s,
    );

    Ok(PlaceholderBranch {
        is_mod_extension,
        number_of_nibbles,
        node,
    })
}

// The slot the displaced node occupies in the added branch: its own path
// nibble past the added extension, falling back to the target key nibble when
// the displaced element carries no path (a hashed reference or a branch).
fn drifted_slot(leaf_row0: &[u8], number_of_nibbles: u8, key: &[u8], key_index: usize) -> u8 {
    let offset = number_of_nibbles as usize;
    match classify(leaf_row0) {
        Ok(ParsedNode::Leaf { path, .. }) | Ok(ParsedNode::Extension { path, .. })
            if path.len() > offset =>
        {
            path[offset]
        }
        _ => key[key_index + offset],
    }
}
