//! Removing an element from the trie.
//!
//! Removal reports emptiness upward: a node returns true when it no longer
//! holds anything and the parent clears the slot. A branch left with a single
//! child reattaches that child into its own place, so the collapse an aligner
//! later sees as a deleted branch level happens at the level it was created.
use crate::trie::TrieNode;
use crate::trie::TrieNode::{Branch, Leaf};
use alloy_trie::Nibbles;

impl TrieNode {
    // Returns true when the node holds nothing afterwards.
    pub(super) fn remove(&mut self, path: Nibbles) -> bool {
        self.clear_cache();
        match self {
            Leaf(leaf) => leaf.path == path,
            Branch(branch) => {
                let shared = branch.path.common_prefix_length(&path);
                if shared < branch.path.len() || shared == path.len() {
                    // The key cannot live under this prefix.
                    return false;
                }
                let slot = path.get_unchecked(shared);
                if let Some(child) = branch.children.get_mut(slot.into()) {
                    if child.remove(path.slice(shared + 1..)) {
                        branch.children.remove(slot.into());
                    }
                }

                match branch.children.occupied() {
                    0 => true,
                    1 => {
                        let prefix = branch.path.clone();
                        let lifted = branch.children.one_child_left().map(|(slot, child)| {
                            let mut joined = prefix;
                            joined.push_unchecked(slot as u8);
                            child.reattach(joined)
                        });
                        if let Some(node) = lifted {
                            *self = node;
                        }
                        false
                    }
                    _ => false,
                }
            }
        }
    }
}
