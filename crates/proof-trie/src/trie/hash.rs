//! Node encoding and hashing.
//!
//! Encodings follow the canonical MPT layout: a leaf is the two-item list
//! `[compact-path, value]`; a branch with an empty prefix is the bare 17-item
//! list; a branch with a non-empty prefix encodes as an extension node
//! `[compact-path, branch-ref]` wrapping the bare branch. The bare-branch and
//! extension encodings are exposed separately because a proof reports them as
//! two consecutive elements. Computed hashes are cached on the nodes.
use super::nodes::{BranchNode, LeafNode, TrieNode};
use crate::trie::TrieNode::{Branch, Leaf};
use alloy_primitives::{keccak256, B256};
use alloy_rlp::{Encodable, Header};
use alloy_trie::nodes::encode_path_leaf;

impl TrieNode {
    pub(super) fn hash(&mut self) -> B256 {
        match self {
            Leaf(leaf) => leaf.hash(),
            Branch(branch) => branch.hash(),
        }
    }

    // Full encoding of the node as referenced by its parent slot or the root.
    pub(crate) fn encode(&mut self) -> Vec<u8> {
        match self {
            Leaf(leaf) => leaf.encode(),
            Branch(branch) => branch.encode(),
        }
    }
}

impl LeafNode {
    pub(crate) fn encode(&self) -> Vec<u8> {
        let path = encode_path_leaf(&self.path, true);
        // Warning: `.length()` is the RLP representation length, header included.
        let mut out = encode_list_header(path.length() + self.value.length());
        path.encode(&mut out);
        self.value[..].encode(&mut out);
        out
    }

    fn hash(&mut self) -> B256 {
        match self.hash {
            Some(hash) => hash,
            None => {
                let hash = keccak256(self.encode());
                self.hash = Some(hash);
                hash
            }
        }
    }
}

impl BranchNode {
    // The bare 17-item branch list, without the extension wrapping.
    pub(crate) fn encode_children(&mut self) -> Vec<u8> {
        const EMPTY_SLOT: u8 = 0x80;

        let mut encoded: Vec<u8> = Vec::new();
        for child in self.children.iter_mut() {
            match child {
                Some(child) => {
                    let mut slot = shorten_encoding(child.encode());
                    encoded.append(&mut slot);
                }
                None => encoded.push(EMPTY_SLOT),
            }
        }
        // The 17th slot, the branch value, is always empty in state tries.
        encoded.push(EMPTY_SLOT);

        let mut out = encode_list_header(encoded.len());
        out.append(&mut encoded);
        out
    }

    // The extension node `[compact-path, branch-ref]` above the bare branch.
    // Only meaningful when the prefix is non-empty.
    pub(crate) fn encode_extension(&mut self) -> Vec<u8> {
        debug_assert!(!self.path.is_empty());
        let encoded_path = encode_path_leaf(&self.path, false);
        let child = shorten_encoding(self.encode_children());

        // `child` is already a complete RLP item, so its absolute length goes
        // into the header and it is appended, not re-encoded.
        let mut out = encode_list_header(encoded_path.length() + child.len());
        encoded_path.encode(&mut out);
        out.extend_from_slice(&child);
        out
    }

    fn encode(&mut self) -> Vec<u8> {
        if self.path.is_empty() {
            self.encode_children()
        } else {
            self.encode_extension()
        }
    }

    fn hash(&mut self) -> B256 {
        match self.hash {
            Some(hash) => hash,
            None => {
                let hash = keccak256(self.encode());
                self.hash = Some(hash);
                hash
            }
        }
    }
}

// References a child node: inlined when shorter than 32 bytes, by hash otherwise.
#[inline]
pub(super) fn shorten_encoding(encoded: Vec<u8>) -> Vec<u8> {
    if encoded.len() < 32 {
        encoded
    } else {
        let mut out: Vec<u8> = Vec::with_capacity(33);
        keccak256(encoded).encode(&mut out);
        out
    }
}

// Encodes a list header for a known payload length, reserving the buffer.
#[inline]
pub(super) fn encode_list_header(payload_length: usize) -> Vec<u8> {
    debug_assert!(payload_length > 1);
    let header = Header {
        list: true,
        payload_length,
    };
    let mut out = Vec::with_capacity(header.length() + payload_length);
    header.encode(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use crate::trie::Trie;
    use alloy_primitives::{hex, Bytes};
    use alloy_trie::{HashBuilder, Nibbles};

    #[test]
    fn leaf_node_hash_matches_known_vector() {
        let mut trie = Trie::new();
        trie.insert_path(Nibbles::unpack(hex!("010203")), Bytes::from("hello"));
        assert_eq!(
            trie.hash(),
            hex!("82c8fd36022fbc91bd6b51580cfd941d3d9994017d59ab2e8293ae9c94c3ab6e")
        );
    }

    #[test]
    fn branch_of_two_leaves_matches_known_vector() {
        // {4:1, 5:a} under a single branch node.
        let mut trie = Trie::new();
        trie.insert_path(
            Nibbles::unpack(hex!("0x41")),
            Bytes::from("v___________________________1"),
        );
        trie.insert_path(
            Nibbles::unpack(hex!("0x5a")),
            Bytes::from("v___________________________2"),
        );
        assert_eq!(
            trie.hash(),
            hex!("1aaa6f712413b9a115730852323deb5f5d796c29151a60a1f55f41a25354cd26")
        );
    }

    #[test]
    fn extension_above_branch_matches_known_vector() {
        // 5858:{4:1, 5:a} - an extension node over the branch of the previous test.
        let mut trie = Trie::new();
        trie.insert_path(
            Nibbles::unpack(hex!("0x585841")),
            Bytes::from("v___________________________1"),
        );
        trie.insert_path(
            Nibbles::unpack(hex!("0x58585a")),
            Bytes::from("v___________________________2"),
        );
        assert_eq!(
            trie.hash(),
            hex!("3eefc183db443d44810b7d925684eb07256e691d5c9cb13215660107121454f9")
        );
    }

    #[test]
    fn branch_child_encoding_matches_hash_builder() {
        let mut trie = Trie::new();
        let mut hash_builder = HashBuilder::default();
        let entries = [
            (Nibbles::from_nibbles([0_u8, 0]), vec![1_u8]),
            (Nibbles::from_nibbles([0_u8, 1]), vec![2_u8]),
            (Nibbles::from_nibbles([1_u8, 0]), vec![3_u8]),
        ];

        for (path, value) in entries {
            trie.insert_path(path.clone(), Bytes::from(value.clone()));
            hash_builder.add_leaf(path, &value);
        }

        assert_eq!(trie.hash(), hash_builder.root());
    }
}
