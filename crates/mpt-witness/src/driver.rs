//! The modification driver.
//!
//! For each modification: capture the pre-state proof and root, apply the
//! mutation, capture the post-state proof and root, then hand both proofs to
//! the aligner framed by a start and an end node. Groups chain: a group's
//! post-root is the next group's pre-root on the same state handle.
use crate::aligner::{convert_proof_to_witness, AlignContext};
use crate::encoding::keybytes_to_hex;
use crate::error::WitnessError;
use crate::node::{ProofType, WitnessNode};
use crate::state::{ProofData, WitnessState};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use tracing::debug;

/// One requested state edit.
#[derive(Debug, Clone)]
pub struct TrieModification {
    pub kind: ProofType,
    pub key: B256,
    pub value: B256,
    pub address: Address,
    pub nonce: u64,
    pub balance: U256,
    pub code_hash: Bytes,
}

impl TrieModification {
    fn base(kind: ProofType, address: Address) -> Self {
        Self {
            kind,
            key: B256::ZERO,
            value: B256::ZERO,
            address,
            nonce: 0,
            balance: U256::ZERO,
            code_hash: Bytes::new(),
        }
    }

    pub fn nonce(address: Address, nonce: u64) -> Self {
        Self {
            nonce,
            ..Self::base(ProofType::NonceChanged, address)
        }
    }

    pub fn balance(address: Address, balance: U256) -> Self {
        Self {
            balance,
            ..Self::base(ProofType::BalanceChanged, address)
        }
    }

    pub fn code_hash(address: Address, code_hash: Bytes) -> Self {
        Self {
            code_hash,
            ..Self::base(ProofType::CodeHashChanged, address)
        }
    }

    pub fn storage(address: Address, key: B256, value: B256) -> Self {
        Self {
            key,
            value,
            ..Self::base(ProofType::StorageChanged, address)
        }
    }

    pub fn storage_does_not_exist(address: Address, key: B256) -> Self {
        Self {
            key,
            ..Self::base(ProofType::StorageDoesNotExist, address)
        }
    }

    pub fn account_does_not_exist(address: Address) -> Self {
        Self::base(ProofType::AccountDoesNotExist, address)
    }

    pub fn account_create(address: Address) -> Self {
        Self::base(ProofType::AccountCreate, address)
    }

    pub fn account_destructed(address: Address) -> Self {
        Self::base(ProofType::AccountDestructed, address)
    }
}

/// Generates the chained witness stream for a list of modifications.
pub fn generate_witness<S: WitnessState>(
    state: &mut S,
    modifications: &[TrieModification],
) -> Result<Vec<WitnessNode>, WitnessError> {
    generate_witness_with_tag(state, modifications, 0)
}

/// As [`generate_witness`], threading a special-test tag onto every start
/// node. The tag is pass-through metadata for the downstream circuit.
pub fn generate_witness_with_tag<S: WitnessState>(
    state: &mut S,
    modifications: &[TrieModification],
    special_test: u8,
) -> Result<Vec<WitnessNode>, WitnessError> {
    state.intermediate_root(false);
    let mut nodes = Vec::new();
    for modification in modifications {
        debug!(kind = ?modification.kind, address = %modification.address, "proving modification");
        match modification.kind {
            ProofType::StorageChanged | ProofType::StorageDoesNotExist => {
                storage_modification_witness(state, modification, special_test, &mut nodes)?
            }
            _ => account_modification_witness(state, modification, special_test, &mut nodes)?,
        }
    }
    Ok(nodes)
}

fn account_modification_witness<S: WitnessState>(
    state: &mut S,
    modification: &TrieModification,
    special_test: u8,
    nodes: &mut Vec<WitnessNode>,
) -> Result<(), WitnessError> {
    let address = modification.address;
    let hashed_address = keccak256(address);
    let account_key = keybytes_to_hex(hashed_address.as_slice());

    state.prefetch_account(address);
    let s_root = state.intermediate_root(false);
    let mut proof_s = state.get_proof(address)?;

    apply(state, modification);

    let c_root = state.intermediate_root(false);
    let mut proof_c = state.get_proof(address)?;

    // A single-account trie proves the absence of every other account with
    // its lone root leaf; states that omit the diverging root leaf from the
    // proof report it separately, and it stands in as the wrong leaf on both
    // sides. On a truly empty trie there is no such element and the empty
    // proofs flow through to the aligner's placeholder leaf.
    if modification.kind == ProofType::AccountDoesNotExist && proof_s.proof.is_empty() {
        if let Ok(root_element) = state.trie_root_element() {
            proof_s = ProofData::single(root_element.clone());
            proof_c = ProofData::single(root_element);
        }
    }

    let (neighbor, shorter_last_leaf) = select_neighbor(state, &proof_s, &proof_c);

    nodes.push(WitnessNode::start(
        modification.kind,
        s_root,
        c_root,
        special_test,
    ));
    let ctx = AlignContext {
        address,
        storage_key: modification.key,
        key: &account_key,
        neighbor,
        is_account: true,
        non_existing_account: modification.kind == ProofType::AccountDoesNotExist,
        non_existing_storage: false,
        shorter_last_leaf,
    };
    nodes.extend(convert_proof_to_witness(
        &proof_s.proof,
        &proof_c.proof,
        &proof_s.ext_nibbles,
        &proof_c.ext_nibbles,
        &ctx,
    )?);
    nodes.push(WitnessNode::End);
    Ok(())
}

fn storage_modification_witness<S: WitnessState>(
    state: &mut S,
    modification: &TrieModification,
    special_test: u8,
    nodes: &mut Vec<WitnessNode>,
) -> Result<(), WitnessError> {
    let address = modification.address;
    let hashed_address = keccak256(address);
    let account_key = keybytes_to_hex(hashed_address.as_slice());
    let storage_key = if state.hashes_storage_keys() {
        keybytes_to_hex(keccak256(modification.key).as_slice())
    } else {
        keybytes_to_hex(modification.key.as_slice())
    };

    state.prefetch_account(address);
    state.prefetch_storage(address, modification.key);

    if !state.exists(address) {
        // A storage edit must not be the account's first modification.
        return Err(WitnessError::StateInvariantBroken(
            "storage modification targets an account that does not exist",
        ));
    }

    let s_root = state.intermediate_root(false);
    let account_proof_s = state.get_proof(address)?;
    let storage_proof_s = state.get_storage_proof(address, modification.key)?;

    if modification.kind == ProofType::StorageChanged {
        state.set_state(address, modification.key, modification.value);
    }

    let c_root = state.intermediate_root(false);
    let account_proof_c = state.get_proof(address)?;
    let storage_proof_c = state.get_storage_proof(address, modification.key)?;

    let (account_neighbor, account_shorter_last_leaf) =
        select_neighbor(state, &account_proof_s, &account_proof_c);
    let (storage_neighbor, storage_shorter_last_leaf) =
        select_neighbor(state, &storage_proof_s, &storage_proof_c);

    nodes.push(WitnessNode::start(
        modification.kind,
        s_root,
        c_root,
        special_test,
    ));

    let account_ctx = AlignContext {
        address,
        storage_key: modification.key,
        key: &account_key,
        neighbor: account_neighbor,
        is_account: true,
        non_existing_account: false,
        non_existing_storage: false,
        shorter_last_leaf: account_shorter_last_leaf,
    };
    nodes.extend(convert_proof_to_witness(
        &account_proof_s.proof,
        &account_proof_c.proof,
        &account_proof_s.ext_nibbles,
        &account_proof_c.ext_nibbles,
        &account_ctx,
    )?);

    let storage_ctx = AlignContext {
        address,
        storage_key: modification.key,
        key: &storage_key,
        neighbor: storage_neighbor,
        is_account: false,
        non_existing_account: false,
        non_existing_storage: modification.kind == ProofType::StorageDoesNotExist,
        shorter_last_leaf: storage_shorter_last_leaf,
    };
    nodes.extend(convert_proof_to_witness(
        &storage_proof_s.proof,
        &storage_proof_c.proof,
        &storage_proof_s.ext_nibbles,
        &storage_proof_c.ext_nibbles,
        &storage_ctx,
    )?);

    nodes.push(WitnessNode::End);
    Ok(())
}

fn apply<S: WitnessState>(state: &mut S, modification: &TrieModification) {
    match modification.kind {
        ProofType::NonceChanged => state.set_nonce(modification.address, modification.nonce),
        ProofType::BalanceChanged => state.set_balance(modification.address, modification.balance),
        ProofType::CodeHashChanged => {
            state.set_code_hash(modification.address, &modification.code_hash)
        }
        ProofType::AccountCreate => state.create_account(modification.address),
        ProofType::AccountDestructed => state.delete_account(modification.address),
        // Non-existence proofs and transaction insertion leave the state as-is.
        ProofType::AccountDoesNotExist
        | ProofType::TransactionInsertion
        | ProofType::StorageChanged
        | ProofType::StorageDoesNotExist => {}
    }
}

// The longer proof still contains the drifted sibling; the shorter proof's
// last-leaf flag drives the placeholder decisions. A hashed neighbor resolves
// through the preimage oracle and is dropped (not an error) when the oracle
// cannot resolve it.
fn select_neighbor<S: WitnessState>(
    state: &S,
    proof_s: &ProofData,
    proof_c: &ProofData,
) -> (Option<Bytes>, bool) {
    let (neighbor, is_hashed, shorter_last_leaf) = if proof_s.proof.len() > proof_c.proof.len() {
        (
            proof_s.neighbor.clone(),
            proof_s.is_neighbor_hashed,
            proof_c.is_last_leaf,
        )
    } else {
        (
            proof_c.neighbor.clone(),
            proof_c.is_neighbor_hashed,
            proof_s.is_last_leaf,
        )
    };

    let neighbor = match neighbor {
        Some(bytes) if is_hashed => {
            debug_assert_eq!(bytes.len(), 33);
            state.preimage(B256::from_slice(&bytes[1..]))
        }
        other => other,
    };
    (neighbor, shorter_last_leaf)
}
