//! A sparse Merkle Patricia trie that can extract `eth_getProof`-shaped proofs.
mod trie;

pub use alloy_primitives::B256;
pub use alloy_trie::Nibbles;
pub use trie::proof::TrieProof;
pub use trie::B256Map;
pub use trie::Trie;
