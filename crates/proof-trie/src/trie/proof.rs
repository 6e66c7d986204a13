//! Proof extraction.
//!
//! `Trie::prove_path` walks toward a target path and collects the byte-exact
//! encoding of every independently-addressable node on the way, the same
//! element stream `eth_getProof` reports: an extension and the branch under it
//! are two consecutive elements. Nodes that a parent inlines (encodings
//! shorter than 32 bytes) are still emitted as standalone elements so the
//! consumer sees a uniform stream.
use super::nodes::{BranchNode, TrieNode};
use crate::trie::Trie;
use crate::trie::TrieNode::{Branch, Leaf};
use alloy_primitives::Bytes;
use alloy_trie::Nibbles;

/// One proof walk toward a target path.
#[derive(Debug, Clone, Default)]
pub struct TrieProof {
    /// Node encodings from the root toward the target.
    pub elements: Vec<Bytes>,
    /// Per-element path nibbles: populated for extension elements, empty for
    /// branches and leaves.
    pub ext_nibbles: Vec<Vec<u8>>,
    /// Full encoding of the sibling that would absorb the target's slot if the
    /// target were deleted: the other child of the deepest visited two-child
    /// branch whose target slot is occupied.
    pub neighbor: Option<Bytes>,
    /// Whether the final element is a leaf (matching or diverging).
    pub is_last_leaf: bool,
}

impl TrieProof {
    fn push(&mut self, encoding: Vec<u8>, nibbles: Vec<u8>, is_leaf: bool) {
        self.elements.push(Bytes::from(encoding));
        self.ext_nibbles.push(nibbles);
        self.is_last_leaf = is_leaf;
    }
}

impl Trie {
    /// Collects the proof for `path`. A leaf whose path diverges from the
    /// target is still collected; it is the non-existence witness. A proof
    /// reaching an extension whose prefix diverges ends at that extension.
    pub fn prove_path(&mut self, path: &Nibbles) -> TrieProof {
        self.prove(path, false)
    }

    /// As [`Trie::prove_path`], but a diverging extension is followed by the
    /// branch it commits to before the proof ends. Sequential-insert (stack
    /// trie) proofs report this shape.
    pub fn prove_path_through_divergence(&mut self, path: &Nibbles) -> TrieProof {
        self.prove(path, true)
    }

    fn prove(&mut self, path: &Nibbles, through_divergence: bool) -> TrieProof {
        let mut proof = TrieProof::default();
        if let Some(root) = self.root.as_mut() {
            walk(root, path.clone(), through_divergence, &mut proof);
        }
        proof
    }

    /// The encoding of the root node, if any.
    pub fn root_element(&mut self) -> Option<Bytes> {
        self.root.as_mut().map(|root| Bytes::from(root.encode()))
    }
}

fn walk(node: &mut TrieNode, path: Nibbles, through_divergence: bool, proof: &mut TrieProof) {
    match node {
        Leaf(leaf) => {
            proof.push(leaf.encode(), Vec::new(), true);
        }
        Branch(branch) => {
            if !branch.path.is_empty() {
                let nibbles = branch.path.to_vec();
                proof.push(branch.encode_extension(), nibbles, false);
                if !path.starts_with(&branch.path) {
                    // The extension prefix diverges from the target; the proof
                    // ends with an absence witness.
                    if through_divergence {
                        proof.push(branch.encode_children(), Vec::new(), false);
                    }
                    return;
                }
            }
            let remaining = path.slice(branch.path.len()..);
            proof.push(branch.encode_children(), Vec::new(), false);
            if remaining.is_empty() {
                return;
            }
            let idx = remaining.get_unchecked(0);
            record_neighbor(branch, idx.into(), proof);
            if let Some(child) = branch.children.get_mut(idx.into()) {
                walk(child, remaining.slice(1..), through_divergence, proof);
            }
        }
    }
}

fn record_neighbor(branch: &mut BranchNode, idx: usize, proof: &mut TrieProof) {
    if let Some(sibling) = branch.children.sibling_mut(idx) {
        proof.neighbor = Some(Bytes::from(sibling.encode()));
    }
}
