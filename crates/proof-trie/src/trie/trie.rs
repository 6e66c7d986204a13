//! The public trie interface.
use crate::trie::Trie;
use crate::trie::TrieNode;
use alloy_primitives::map::{FbBuildHasher, HashMap};
use alloy_primitives::{Bytes, B256};
use alloy_trie::{Nibbles, EMPTY_ROOT_HASH};

/// Convenience alias matching `alloy_primitives::map`.
pub type B256Map<V> = HashMap<B256, V, FbBuildHasher<32>>;

impl Trie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Inserts a value under a 32-byte key, overriding any previous value.
    pub fn insert(&mut self, key: B256, value: Bytes) {
        self.insert_path(Nibbles::unpack(key), value);
    }

    pub fn insert_path(&mut self, path: Nibbles, value: Bytes) {
        match self.root.as_mut() {
            Some(root) => root.insert(path, value),
            None => self.root = Some(TrieNode::leaf(path, value)),
        }
    }

    /// Gets the value associated with a 32-byte key.
    pub fn get(&self, key: B256) -> Option<&Bytes> {
        self.get_path(Nibbles::unpack(key))
    }

    pub fn get_path(&self, path: Nibbles) -> Option<&Bytes> {
        self.root.as_ref().and_then(|root| root.get(path))
    }

    /// Removes the element under a 32-byte key, if present.
    pub fn remove(&mut self, key: B256) {
        self.remove_path(Nibbles::unpack(key));
    }

    pub fn remove_path(&mut self, path: Nibbles) {
        if let Some(root) = self.root.as_mut() {
            if root.remove(path) {
                self.root = None;
            }
        }
    }

    /// The root hash of the trie.
    pub fn hash(&mut self) -> B256 {
        match self.root.as_mut() {
            Some(root) => root.hash(),
            None => EMPTY_ROOT_HASH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}
