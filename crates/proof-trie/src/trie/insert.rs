//! Inserting an element into the trie.
//!
//! A write either runs a node's whole prefix and continues below it, or forks
//! the node at the first disagreeing nibble. Both the leaf-split and the
//! extension-split of the witness model are the same fork: the resident node
//! is detached past the fork nibble and pushed one level down next to a leaf
//! holding the new value.
use super::nodes::{BranchChildren, BranchNode, TrieNode};
use crate::trie::TrieNode::{Branch, Leaf};
use alloy_primitives::Bytes;
use alloy_trie::Nibbles;

impl TrieNode {
    pub(super) fn insert(&mut self, path: Nibbles, value: Bytes) {
        self.clear_cache();
        let shared = self.prefix().common_prefix_length(&path);
        if shared < self.prefix().len() {
            self.fork_at(shared, path, value);
            return;
        }
        match self {
            // Keys are fixed-width, so a fully shared leaf path is the same key.
            Leaf(leaf) => leaf.value = value,
            Branch(branch) => {
                let slot = path.get_unchecked(shared);
                let below = path.slice(shared + 1..);
                match branch.children.get_mut(slot.into()) {
                    Some(child) => child.insert(below, value),
                    None => branch.children.insert(slot.into(), Box::new(TrieNode::leaf(below, value))),
                }
            }
        }
    }

    // Splits this node's prefix at `shared`: a fresh two-child branch takes
    // the shared part and adopts the detached resident and the new leaf at
    // their fork nibbles.
    fn fork_at(&mut self, shared: usize, path: Nibbles, value: Bytes) {
        let resident_slot = self.prefix().get_unchecked(shared);
        let new_slot = path.get_unchecked(shared);

        let resident = self.detach(shared + 1);
        let mut children = BranchChildren::new();
        children.insert(resident_slot.into(), Box::new(resident));
        children.insert(
            new_slot.into(),
            Box::new(TrieNode::leaf(path.slice(shared + 1..), value)),
        );

        *self = Branch(BranchNode {
            path: path.slice(..shared),
            children,
            hash: None,
        });
    }
}
