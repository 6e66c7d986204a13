//! The external interfaces the generator consumes: a state handle that can
//! produce proofs and apply modifications, and a stack-trie prover for
//! sequential insertions. Implementations live outside this crate; the
//! generator only relies on these contracts.
use crate::error::WitnessError;
use alloy_primitives::{Address, Bytes, B256, U256};

/// One proof retrieval, as reported by the state.
#[derive(Debug, Clone, Default)]
pub struct ProofData {
    /// Node encodings from the root toward the queried key.
    pub proof: Vec<Bytes>,
    /// The sibling that would absorb the queried slot on deletion. May be a
    /// 33-byte RLP hash string when the state stores the sibling by hash.
    pub neighbor: Option<Bytes>,
    /// Per-element path nibbles; non-empty only for extension elements.
    pub ext_nibbles: Vec<Vec<u8>>,
    /// Whether the final proof element is a leaf.
    pub is_last_leaf: bool,
    /// Whether `neighbor` is a hash reference needing preimage resolution.
    pub is_neighbor_hashed: bool,
}

impl ProofData {
    /// A proof consisting of a single element, used when a lone root node
    /// stands in as the non-existence witness.
    pub fn single(element: Bytes) -> Self {
        Self {
            proof: vec![element],
            neighbor: None,
            ext_nibbles: vec![Vec::new()],
            is_last_leaf: true,
            is_neighbor_hashed: false,
        }
    }
}

/// The shape of one stack-proof element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StackItemKind {
    Branch = 1,
    Extension = 2,
    Leaf = 3,
    Hashed = 4,
}

/// The pre/post proof pair for one sequential insertion.
#[derive(Debug, Clone, Default)]
pub struct StackProof {
    pub proof_s: Vec<Bytes>,
    pub proof_c: Vec<Bytes>,
    pub nibbles_s: Vec<Vec<u8>>,
    pub nibbles_c: Vec<Vec<u8>>,
    pub kinds_s: Vec<StackItemKind>,
    pub kinds_c: Vec<StackItemKind>,
}

/// The mutable state handle the modification driver works against.
///
/// Mirrors the surface of a stateful node: proof retrieval before and after a
/// modification, the mutators the modification kinds map onto, and the
/// preimage oracle for hashed references. Prefetch calls are hints; an
/// in-memory implementation may ignore them.
pub trait WitnessState {
    fn get_proof(&mut self, address: Address) -> Result<ProofData, WitnessError>;
    fn get_storage_proof(&mut self, address: Address, key: B256)
        -> Result<ProofData, WitnessError>;

    /// Recomputes and returns the state root.
    fn intermediate_root(&mut self, delete_empty_objects: bool) -> B256;

    fn set_nonce(&mut self, address: Address, nonce: u64);
    fn set_balance(&mut self, address: Address, balance: U256);
    fn set_code_hash(&mut self, address: Address, code_hash: &[u8]);
    fn set_state(&mut self, address: Address, key: B256, value: B256);
    fn create_account(&mut self, address: Address);
    fn delete_account(&mut self, address: Address);

    fn exists(&self, address: Address) -> bool;

    /// The encoding of the account trie's root node, used as the wrong-leaf
    /// witness when a proof comes back empty on a single-account trie.
    fn trie_root_element(&mut self) -> Result<Bytes, WitnessError>;

    /// Resolves a hash to the bytes it commits to, if known.
    fn preimage(&self, hash: B256) -> Option<Bytes>;

    /// Whether storage slots are keyed by `keccak(slot)` (the secure-trie
    /// default) or by the raw slot bytes.
    fn hashes_storage_keys(&self) -> bool {
        true
    }

    fn prefetch_account(&mut self, _address: Address) {}
    fn prefetch_storage(&mut self, _address: Address, _key: B256) {}
}

/// A stack trie that records a proof pair per sequential insertion.
pub trait StackTrieProver {
    /// Inserts `rlp(index)`-keyed items in the canonical derive-sha order and
    /// returns the per-insertion proofs together with the final root.
    fn update_and_get_proofs(
        &mut self,
        items: &[Bytes],
    ) -> Result<(Vec<StackProof>, B256), WitnessError>;
}
