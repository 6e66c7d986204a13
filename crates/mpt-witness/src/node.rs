//! The emitted witness node stream.
//!
//! Every variant carries the byte-exact encodings of the underlying trie
//! elements next to the metadata flags the circuit constrains. Struct field
//! order is the wire order; the raw bytes pass through unchanged because the
//! downstream circuit hashes them as-is.
use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// The kind of state modification a witness group proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    NonceChanged,
    BalanceChanged,
    CodeHashChanged,
    AccountDestructed,
    AccountDoesNotExist,
    StorageChanged,
    StorageDoesNotExist,
    AccountCreate,
    TransactionInsertion,
}

/// Which side of the proof pair a flag refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofSide {
    S,
    C,
}

/// Opens one modification's witness group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartNode {
    pub proof_type: ProofType,
    pub pre_root: B256,
    pub post_root: B256,
    pub special_test: u8,
}

/// The parsed view of an extension node folded into a branch row: the raw
/// S/C encodings, the outer list header bytes, and the four 34-byte
/// zero-padded item views (S path, S child, C path, C child).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionView {
    pub s_encoding: Bytes,
    pub c_encoding: Bytes,
    pub list_rlp_bytes: Bytes,
    pub values: [Bytes; 4],
}

/// A branch row pairing the S and C branches at one trie level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchNode {
    pub s_encoding: Bytes,
    pub c_encoding: Bytes,
    /// The extension node consumed immediately above this branch, if any.
    pub extension: Option<ExtensionView>,
    pub modified_index: u8,
    pub drifted_index: u8,
    pub is_placeholder_s: bool,
    pub is_placeholder_c: bool,
}

impl BranchNode {
    pub fn is_extension(&self) -> bool {
        self.extension.is_some()
    }
}

/// The extension node before and after a modification that changed its
/// shared-prefix length. Always attached to the leaf row it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModExtensionRider {
    pub s_encoding: Bytes,
    pub c_encoding: Bytes,
    pub nibble_count: u8,
    pub modified_side: ProofSide,
}

/// An account leaf row pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLeafNode {
    pub address: Address,
    /// The full nibble path of the queried key, terminator included.
    pub key: Bytes,
    pub s_encoding: Bytes,
    pub c_encoding: Bytes,
    /// The sibling displaced by an insertion or absorbed by a deletion.
    pub drifted: Option<Bytes>,
    pub is_placeholder_s: bool,
    pub is_placeholder_c: bool,
    pub is_non_existing: bool,
    /// Pass-through (S, C) modified-extension markers.
    pub is_mod_extension: [bool; 2],
    pub mod_extension: Option<ModExtensionRider>,
}

/// A storage leaf row pair; additionally keyed by the original storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLeafNode {
    pub storage_key: B256,
    pub key: Bytes,
    pub s_encoding: Bytes,
    pub c_encoding: Bytes,
    pub drifted: Option<Bytes>,
    pub is_placeholder_s: bool,
    pub is_placeholder_c: bool,
    pub is_non_existing: bool,
    pub is_mod_extension: [bool; 2],
    pub mod_extension: Option<ModExtensionRider>,
}

/// A transaction leaf row emitted by the stack-trie variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLeafNode {
    pub tx_index: u64,
    pub key: Bytes,
    pub s_encoding: Bytes,
    pub c_encoding: Bytes,
    pub drifted: Option<Bytes>,
    /// The S row holds a branch rather than a leaf.
    pub is_branch_in_row: bool,
    pub is_placeholder_s: bool,
    pub is_placeholder_c: bool,
    pub is_mod_extension: [bool; 2],
    pub mod_extension: Option<ModExtensionRider>,
}

/// One element of the witness stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WitnessNode {
    Start(StartNode),
    Branch(BranchNode),
    AccountLeaf(AccountLeafNode),
    StorageLeaf(StorageLeafNode),
    TxLeaf(TxLeafNode),
    End,
}

impl WitnessNode {
    pub fn start(proof_type: ProofType, pre_root: B256, post_root: B256, special_test: u8) -> Self {
        WitnessNode::Start(StartNode {
            proof_type,
            pre_root,
            post_root,
            special_test,
        })
    }
}
