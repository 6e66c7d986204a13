//! Looking an element up by its full nibble path.
use super::nodes::{BranchNode, LeafNode, TrieNode};
use crate::trie::TrieNode::{Branch, Leaf};
use alloy_primitives::Bytes;
use alloy_trie::Nibbles;

impl LeafNode {
    fn get(&self, path: Nibbles) -> Option<&Bytes> {
        (self.path == path).then_some(&self.value)
    }
}

impl BranchNode {
    fn get(&self, path: Nibbles) -> Option<&Bytes> {
        // Only reachable when the branch prefix is a strict prefix of `path`.
        let common_prefix_len = self.path.common_prefix_length(&path);
        if common_prefix_len < self.path.len() || common_prefix_len == path.len() {
            return None;
        }
        self.children
            .get(path.get_unchecked(common_prefix_len).into())
            .and_then(|child| child.get(path.slice(common_prefix_len + 1..)))
    }
}

impl TrieNode {
    pub(super) fn get(&self, path: Nibbles) -> Option<&Bytes> {
        match self {
            Leaf(leaf) => leaf.get(path),
            Branch(branch) => branch.get(path),
        }
    }
}
