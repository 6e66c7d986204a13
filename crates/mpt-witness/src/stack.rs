//! The stack-trie witness variant for ordered sequential insertions.
//!
//! Stack-trie proofs follow a constrained set of shape transitions, so the
//! aligner here runs the common-prefix walk with a dispatch keyed on the
//! recorded element kinds instead of re-classifying encodings, and handles
//! the one transition the general aligner cannot see: the element kinds
//! mismatching at the same position when an extension is reshaped.
use crate::branch::{add_branch_and_placeholder, prepare_branch_node};
use crate::encoding::{is_branch, keybytes_to_hex};
use crate::error::WitnessError;
use crate::extension::prepare_extensions;
use crate::leaf::{
    build_stack_mod_extension_rider, equip_leaf_with_mod_extension_node, prepare_tx_leaf_node,
    prepare_tx_leaf_and_placeholder_node,
};
use crate::node::{ExtensionView, ProofType, WitnessNode};
use crate::state::{StackItemKind, StackProof, StackTrieProver};
use alloy_primitives::{Bytes, B256};
use tracing::{debug, warn};

/// Key nibbles are padded to this many entries.
const TX_KEY_NIBBLES: usize = 32;

/// Generates the chained witness for a list of sequential insertions.
///
/// Every group opens with a zero pre-root and the final stack root: the stack
/// trie is built in one pass, so intermediate roots are not observable.
pub fn stack_trie_witness<T: StackTrieProver>(
    trie: &mut T,
    items: &[Bytes],
) -> Result<Vec<WitnessNode>, WitnessError> {
    let (proofs, root) = trie.update_and_get_proofs(items)?;

    let mut nodes = Vec::new();
    for (i, proof) in proofs.iter().enumerate() {
        let idx = i + 1;
        // One-byte RLP length boundary: the proof at this position belongs to
        // the deferred rlp(0) key.
        let tx_index = if (i <= 0x7f && proofs.len() - 1 == i) || i == 127 {
            0
        } else {
            idx as u64
        };
        let key = alloy_rlp::encode(tx_index);

        let mut group = vec![WitnessNode::start(
            ProofType::TransactionInsertion,
            B256::ZERO,
            root,
            0,
        )];
        group.extend(generate_tx_witness(tx_index, &key, proof)?);
        group.push(WitnessNode::End);
        verify_node_count(&group, proof);
        nodes.extend(group);
    }
    Ok(nodes)
}

/// Converts one stack-proof pair into the payload rows of a witness group.
pub fn generate_tx_witness(
    tx_index: u64,
    key: &[u8],
    proof: &StackProof,
) -> Result<Vec<WitnessNode>, WitnessError> {
    let mut k = keybytes_to_hex(key);
    k.pop();
    k.resize(TX_KEY_NIBBLES, 0);

    let proof_s = &proof.proof_s;
    let proof_c = &proof.proof_c;
    let len_s = proof_s.len();
    let len_c = proof_c.len();

    let mut nodes = Vec::new();

    // The first insertion into an empty stack trie: a single leaf row.
    if len_s == 0 {
        nodes.push(WitnessNode::TxLeaf(prepare_tx_leaf_and_placeholder_node(
            tx_index,
            &proof_c[0],
            &k,
            false,
        )));
        return Ok(nodes);
    }

    let last_s = proof.kinds_s[len_s - 1];
    let last_c = proof.kinds_c[len_c - 1];
    let min_len = len_s.min(len_c);

    let mut up_to = min_len;
    // Both proofs end past the shared branches; the extra level is handled by
    // the placeholder-branch step below.
    if len_s != len_c && is_terminal(last_s) && is_terminal(last_c) {
        up_to -= 1;
    }

    let additional_branch = !(len_s == len_c && is_terminal(last_s));

    // Second insertion: S is a lone leaf that the new branch (and possibly an
    // extension) absorbs; nothing is shared yet.
    if len_s == 1 && last_s == StackItemKind::Leaf {
        up_to = 0;
    }

    let mut key_index = 0usize;
    let mut pending_ext: Option<ExtensionView> = None;
    let mut mismatched_idx: Option<usize> = None;

    for i in 0..up_to {
        if proof.kinds_s[i] != StackItemKind::Branch {
            // The kinds disagreeing at one position means an extension was
            // reshaped into a branch level (or vice versa).
            if proof.kinds_s[i] != proof.kinds_c[i] {
                mismatched_idx = Some(i);
                break;
            }

            let has_nibbles =
                !proof.nibbles_s[i].is_empty() || !proof.nibbles_c[i].is_empty();
            if has_nibbles {
                let (n, view) =
                    prepare_extensions(&proof.nibbles_s[i], &proof_s[i], &proof_c[i])?;
                key_index += n as usize;
                pending_ext = Some(view);
                continue;
            }

            nodes.push(WitnessNode::TxLeaf(prepare_tx_leaf_node(
                tx_index,
                &proof_s[len_s - 1],
                &proof_c[len_c - 1],
                &k,
                None,
                false,
                false,
                false,
            )));
        } else {
            let extension = pending_ext.take();
            nodes.push(WitnessNode::Branch(prepare_branch_node(
                &proof_s[i],
                &proof_c[i],
                extension,
                k[key_index],
                k[key_index],
                false,
                false,
            )));
            key_index += 1;
        }
    }

    if additional_branch {
        let (leaf_row0, last_short) = if len_s > len_c {
            (&proof_c[len_c - 1], last_c)
        } else {
            (&proof_s[len_s - 1], last_s)
        };

        // The common case appends a single leaf to the shared prefix; only
        // shape-changing insertions need a placeholder branch.
        let appends_leaf_only =
            len_s == len_c - 1 && last_s != last_c && last_c == StackItemKind::Leaf;
        if !appends_leaf_only {
            let stack_ext = mismatched_idx.map(|i| proof_s[i].as_ref());
            let placed = add_branch_and_placeholder(
                proof_s,
                proof_c,
                &proof.nibbles_s,
                &proof.nibbles_c,
                stack_ext,
                leaf_row0,
                &k,
                key_index,
                last_short == StackItemKind::Leaf,
            )?;
            nodes.push(WitnessNode::Branch(placed.node));
        }

        let leaf = match mismatched_idx {
            None => {
                if last_s == StackItemKind::Leaf {
                    WitnessNode::TxLeaf(prepare_tx_leaf_node(
                        tx_index,
                        &proof_s[len_s - 1],
                        &proof_c[len_c - 1],
                        &k,
                        None,
                        is_branch(&proof_s[len_s - 1]),
                        false,
                        false,
                    ))
                } else {
                    WitnessNode::TxLeaf(prepare_tx_leaf_and_placeholder_node(
                        tx_index,
                        &proof_c[len_c - 1],
                        &k,
                        false,
                    ))
                }
            }
            Some(idx) => {
                debug!(tx_index, idx, "modified extension node in stack proof");
                let mut leaf = WitnessNode::TxLeaf(prepare_tx_leaf_and_placeholder_node(
                    tx_index,
                    &proof_c[len_c - 1],
                    &k,
                    true,
                ));
                let rider = build_stack_mod_extension_rider(&proof_s[idx])?;
                equip_leaf_with_mod_extension_node(&mut leaf, rider);
                leaf
            }
        };
        nodes.push(leaf);
    }

    Ok(nodes)
}

fn is_terminal(kind: StackItemKind) -> bool {
    matches!(kind, StackItemKind::Leaf | StackItemKind::Hashed)
}

// Sanity check over the emitted group size; shape anomalies are logged and
// never abort the stream.
fn verify_node_count(group: &[WitnessNode], proof: &StackProof) {
    let node_num = group.len() - 2;
    let len_s = proof.proof_s.len();
    let len_c = proof.proof_c.len();
    let max_len = len_s.max(len_c);
    let min_len = len_s.min(len_c);

    let ext_count = |kinds: &[StackItemKind]| {
        kinds
            .iter()
            .filter(|kind| **kind == StackItemKind::Extension)
            .count()
    };
    let max_ext = ext_count(&proof.kinds_s).max(ext_count(&proof.kinds_c));

    if len_s == 0 {
        // First insertion: a lone leaf row.
        if node_num != 1 {
            warn!(node_num, "stack witness node count mismatch on first insertion");
        }
    } else if max_len == min_len + 1 {
        if node_num != max_len - max_ext {
            warn!(
                node_num,
                max_len, max_ext, "stack witness node count does not match proof length"
            );
        }
    } else if max_len == min_len {
        // [EXT - BRANCH] -> [BRANCH - LEAF]
        if proof.kinds_s[0] != proof.kinds_c[0] && node_num == max_len + 1 {
            warn!(node_num, max_len, "stack witness node count off by one on kind flip");
        }
    } else if max_len > min_len + 1 {
        // Usually a freshly created extension node:
        // [BRANCH - BRANCH - LEAF] -> [BRANCH - BRANCH - EXT - BRANCH - LEAF]
        if node_num == max_len + 1 {
            warn!(node_num, max_len, "stack witness node count off by one on new extension");
        }
    } else {
        debug_assert!(false, "unhandled stack proof shape");
        warn!(len_s, len_c, "unhandled stack proof shape");
    }
}
