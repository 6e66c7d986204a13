//! Witness generation for Merkle-Patricia trie modifications.
//!
//! Ingests a pair of MPT proofs taken before and after a state modification
//! and emits the linear sequence of witness nodes the downstream
//! arithmetization constrains: branch rows over the shared path, placeholder
//! rows where one side is structurally absent, the closing leaf rows, and the
//! modified-extension rider when a shared prefix changed length. A stack-trie
//! variant covers ordered sequential insertions (transaction tries).
mod aligner;
mod branch;
mod driver;
mod encoding;
mod error;
mod extension;
mod leaf;
mod node;
mod stack;
mod state;

pub use aligner::{convert_proof_to_witness, AlignContext};
pub use branch::prepare_branch_node;
pub use driver::{generate_witness, generate_witness_with_tag, TrieModification};
pub use encoding::{
    classify, extract_ext_nibbles, is_branch, keybytes_to_hex, Child, ParsedNode, TERMINATOR,
};
pub use error::WitnessError;
pub use extension::prepare_extensions;
pub use leaf::{
    equip_leaf_with_mod_extension_node, prepare_account_leaf_node,
    prepare_account_leaf_placeholder_node, prepare_storage_leaf_node,
    prepare_storage_leaf_placeholder_node, prepare_tx_leaf_and_placeholder_node,
    prepare_tx_leaf_node,
};
pub use node::{
    AccountLeafNode, BranchNode, ExtensionView, ModExtensionRider, ProofSide, ProofType,
    StartNode, StorageLeafNode, TxLeafNode, WitnessNode,
};
pub use stack::{generate_tx_witness, stack_trie_witness};
pub use state::{ProofData, StackItemKind, StackProof, StackTrieProver, WitnessState};
