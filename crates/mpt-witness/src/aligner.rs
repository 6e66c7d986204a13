//! The two-proof aligner.
//!
//! Walks the common prefix of the pre-modification (S) and post-modification
//! (C) proofs, detects the shape of the modification at the divergence point,
//! and emits the witness rows: branch rows over the shared path, a
//! placeholder branch where one side is structurally absent, and the closing
//! leaf row (real, wrong, or placeholder).
use crate::branch::{add_branch_and_placeholder, prepare_branch_node};
use crate::encoding::{classify, is_branch, ParsedNode};
use crate::error::WitnessError;
use crate::extension::prepare_extensions;
use crate::leaf::{
    build_mod_extension_rider, equip_leaf_with_mod_extension_node, fold_diverging_extension,
    prepare_account_leaf_node, prepare_account_leaf_placeholder_node,
    prepare_leaf_and_placeholder_node, prepare_storage_leaf_node,
    prepare_storage_leaf_placeholder_node,
};
use crate::node::{ExtensionView, WitnessNode};
use alloy_primitives::{Address, Bytes, B256};

/// Per-modification context threaded through one aligner run.
#[derive(Debug, Clone)]
pub struct AlignContext<'a> {
    pub address: Address,
    pub storage_key: B256,
    /// Full nibble path of the queried key, terminator included.
    pub key: &'a [u8],
    /// Resolved drifted-sibling bytes, when available.
    pub neighbor: Option<Bytes>,
    pub is_account: bool,
    pub non_existing_account: bool,
    pub non_existing_storage: bool,
    /// Whether the shorter proof's last element is a leaf.
    pub shorter_last_leaf: bool,
}

impl AlignContext<'_> {
    fn non_existing(&self) -> bool {
        if self.is_account {
            self.non_existing_account
        } else {
            self.non_existing_storage
        }
    }
}

/// Converts one S/C proof pair into the payload rows of a witness group.
pub fn convert_proof_to_witness(
    proof_s: &[Bytes],
    proof_c: &[Bytes],
    nibbles_s: &[Vec<u8>],
    nibbles_c: &[Vec<u8>],
    ctx: &AlignContext<'_>,
) -> Result<Vec<WitnessNode>, WitnessError> {
    let len_s = proof_s.len();
    let len_c = proof_c.len();
    let min_len = len_s.min(len_c);
    let key = ctx.key;
    let non_existing = ctx.non_existing();

    // A value update keeps both proofs the same length. An insertion that
    // splits a leaf into a branch (or the mirrored deletion) adds one branch
    // level to one side; it is recognizable by the shorter proof ending in a
    // non-branch element.
    let mut additional_branch = false;
    if len_s < len_c && len_s > 0 {
        additional_branch = !is_branch(&proof_s[len_s - 1]);
    } else if len_c < len_s && len_c > 0 {
        additional_branch = !is_branch(&proof_c[len_c - 1]);
    }

    let mut up_to = min_len;
    if len_s != len_c && additional_branch {
        up_to = min_len - 1;
    }

    let mut key_index = 0usize;
    let mut pending_ext: Option<(u8, ExtensionView)> = None;
    let mut nodes = Vec::new();

    for i in 0..up_to {
        if !is_branch(&proof_s[i]) {
            let has_nibbles = nibbles_s
                .get(i)
                .is_some_and(|n| !n.is_empty())
                || nibbles_c.get(i).is_some_and(|n| !n.is_empty());
            // Anything before the final walk position is an extension node.
            // At the final position a non-existence proof can also end in an
            // extension whose path diverges from the key; it is parsed here
            // and folded into the placeholder leaf that closes the group.
            if i != up_to - 1 || (has_nibbles && non_existing) {
                let empty = Vec::new();
                let record = nibbles_s.get(i).unwrap_or(&empty);
                let (n, view) = prepare_extensions(record, &proof_s[i], &proof_c[i])?;
                key_index += n as usize;
                pending_ext = Some((n, view));
                continue;
            }

            nodes.push(leaf_pair(
                ctx,
                &proof_s[len_s - 1],
                &proof_c[len_c - 1],
                None,
                non_existing,
            ));
        } else {
            let extension = pending_ext.take().map(|(_, view)| view);
            nodes.push(WitnessNode::Branch(prepare_branch_node(
                &proof_s[i],
                &proof_c[i],
                extension,
                key[key_index],
                key[key_index],
                false,
                false,
            )));
            key_index += 1;
        }
    }

    if len_s != len_c {
        if additional_branch {
            // The displaced node is the shorter proof's last element; its own
            // path nibble gives the drifted slot in the added branch.
            let leaf_row0: &Bytes = if len_s > len_c {
                &proof_c[len_c - 1]
            } else {
                &proof_s[len_s - 1]
            };

            let placed = add_branch_and_placeholder(
                proof_s,
                proof_c,
                nibbles_s,
                nibbles_c,
                None,
                leaf_row0,
                key,
                key_index,
                ctx.shorter_last_leaf,
            )?;
            let is_mod_extension = placed.is_mod_extension;
            let number_of_nibbles = placed.number_of_nibbles;
            nodes.push(WitnessNode::Branch(placed.node));

            let mut leaf = if !is_mod_extension {
                leaf_pair(
                    ctx,
                    &proof_s[len_s - 1],
                    &proof_c[len_c - 1],
                    ctx.neighbor.clone(),
                    non_existing,
                )
            } else {
                let mod_flags = if len_c > len_s {
                    [true, false]
                } else {
                    [false, true]
                };
                prepare_leaf_and_placeholder_node(
                    ctx.address,
                    ctx.storage_key,
                    key,
                    proof_s,
                    proof_c,
                    ctx.is_account,
                    non_existing,
                    mod_flags,
                )
            };

            if is_mod_extension {
                let rider = build_mod_extension_rider(proof_s, proof_c, number_of_nibbles);
                equip_leaf_with_mod_extension_node(&mut leaf, rider);
            }
            nodes.push(leaf);
        } else {
            // One side only appends a leaf into an existing empty branch
            // slot; no branch level was created or removed.
            nodes.push(prepare_leaf_and_placeholder_node(
                ctx.address,
                ctx.storage_key,
                key,
                proof_s,
                proof_c,
                ctx.is_account,
                non_existing,
                [false; 2],
            ));
        }
    } else if closes_without_leaf(proof_c, non_existing) {
        // Non-existence against an empty slot (or an empty trie, or a
        // diverging extension): a placeholder leaf keeps the row structure
        // uniform. A diverging extension consumed at the final walk position
        // is folded into that leaf rather than dropped.
        let mut leaf = if ctx.is_account {
            WitnessNode::AccountLeaf(prepare_account_leaf_placeholder_node(ctx.address, key))
        } else {
            WitnessNode::StorageLeaf(prepare_storage_leaf_placeholder_node(ctx.storage_key, key))
        };
        if let Some((number_of_nibbles, view)) = pending_ext.take() {
            fold_diverging_extension(&mut leaf, view, number_of_nibbles);
        }
        nodes.push(leaf);
    }

    Ok(nodes)
}

// Equal-length proofs that never reached a leaf row: empty proofs, proofs
// ending at a branch with a nil target slot, and non-existence proofs ending
// in a diverging extension.
fn closes_without_leaf(proof_c: &[Bytes], non_existing: bool) -> bool {
    let Some(last) = proof_c.last() else {
        return true;
    };
    if is_branch(last) {
        return true;
    }
    non_existing && matches!(classify(last), Ok(ParsedNode::Extension { .. }))
}

fn leaf_pair(
    ctx: &AlignContext<'_>,
    s: &[u8],
    c: &[u8],
    drifted: Option<Bytes>,
    non_existing: bool,
) -> WitnessNode {
    if ctx.is_account {
        WitnessNode::AccountLeaf(prepare_account_leaf_node(
            ctx.address,
            ctx.key,
            s,
            c,
            drifted,
            false,
            false,
            non_existing,
            [false; 2],
        ))
    } else {
        WitnessNode::StorageLeaf(prepare_storage_leaf_node(
            ctx.storage_key,
            ctx.key,
            s,
            c,
            drifted,
            false,
            false,
            non_existing,
            [false; 2],
        ))
    }
}
