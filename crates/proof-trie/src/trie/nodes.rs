//! The two node types the trie is built from, and the node-surgery moves the
//! mutation paths share.
//!
//! There is no dedicated extension node type: a branch reached through a
//! shared nibble prefix carries that prefix as its `path`. Every node
//! therefore owns a (possibly empty) prefix, and both mutation directions
//! reduce to moving a node across one level: `detach` cuts the prefix to hang
//! the node under a fork, `reattach` absorbs the parent's prefix to lift it
//! back up.
use alloy_primitives::{Bytes, B256};
use alloy_trie::Nibbles;

pub(super) use super::children::BranchChildren;

#[derive(Debug, Clone)]
pub(crate) struct BranchNode {
    pub(crate) children: BranchChildren,
    pub(crate) path: Nibbles,
    pub(crate) hash: Option<B256>,
}

#[derive(Debug, Clone)]
pub(crate) struct LeafNode {
    pub(crate) path: Nibbles,
    pub(crate) value: Bytes,
    pub(crate) hash: Option<B256>,
}

#[derive(Debug, Clone)]
pub(crate) enum TrieNode {
    Branch(BranchNode),
    Leaf(LeafNode),
}

impl TrieNode {
    pub(super) fn leaf(path: Nibbles, value: Bytes) -> Self {
        TrieNode::Leaf(LeafNode {
            path,
            value,
            hash: None,
        })
    }

    /// The nibble prefix this node consumes before dispatching further.
    pub(super) fn prefix(&self) -> &Nibbles {
        match self {
            TrieNode::Branch(branch) => &branch.path,
            TrieNode::Leaf(leaf) => &leaf.path,
        }
    }

    // Takes the node out of its place with the prefix cut at `from`, ready to
    // hang under a fork branch one level down.
    pub(super) fn detach(&mut self, from: usize) -> Self {
        match self {
            TrieNode::Leaf(leaf) => {
                TrieNode::leaf(leaf.path.slice(from..), core::mem::take(&mut leaf.value))
            }
            TrieNode::Branch(branch) => TrieNode::Branch(BranchNode {
                path: branch.path.slice(from..),
                children: core::mem::take(&mut branch.children),
                hash: None,
            }),
        }
    }

    // The inverse motion: the node takes over its parent's place, absorbing
    // `prefix` (the parent prefix plus the consumed slot nibble) into its own.
    pub(super) fn reattach(&mut self, prefix: Nibbles) -> Self {
        match self {
            TrieNode::Leaf(leaf) => {
                TrieNode::leaf(prefix.join(&leaf.path), core::mem::take(&mut leaf.value))
            }
            TrieNode::Branch(branch) => TrieNode::Branch(BranchNode {
                path: prefix.join(&branch.path),
                children: core::mem::take(&mut branch.children),
                hash: None,
            }),
        }
    }

    pub(crate) fn clear_cache(&mut self) {
        match self {
            TrieNode::Branch(branch) => branch.hash = None,
            TrieNode::Leaf(leaf) => leaf.hash = None,
        }
    }
}
