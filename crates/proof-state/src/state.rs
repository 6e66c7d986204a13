//! The account/storage state.
//!
//! Accounts live in a state trie keyed by `keccak(address)`, each with its
//! own storage trie; account leaf values are RLP-encoded `TrieAccount`s and
//! storage leaf values are RLP-encoded slot values with leading zeros
//! trimmed. Mutators only mark accounts dirty; `intermediate_root` folds the
//! dirty storage roots back into the account leaves and re-hashes, so roots
//! observed between mutations are always consistent.
use alloy_primitives::{keccak256, Address, Bytes, B256, KECCAK256_EMPTY, U256};
use alloy_trie::TrieAccount;
use mpt_witness::{ProofData, WitnessError, WitnessState};
use proof_trie::{B256Map, Nibbles, Trie, TrieProof};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct AccountRecord {
    nonce: u64,
    balance: U256,
    code_hash: B256,
    storage: Trie,
}

impl Default for AccountRecord {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::ZERO,
            code_hash: KECCAK256_EMPTY,
            storage: Trie::new(),
        }
    }
}

/// An in-memory state handle with proof extraction and a preimage store.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    accounts: BTreeMap<Address, AccountRecord>,
    account_trie: Trie,
    dirty: BTreeSet<Address>,
    preimages: B256Map<Bytes>,
    hash_storage_keys: bool,
}

impl MemoryState {
    /// A state keying storage slots by `keccak(slot)`, the secure-trie default.
    pub fn new() -> Self {
        Self {
            hash_storage_keys: true,
            ..Self::default()
        }
    }

    /// A state keying storage slots by their raw bytes. Used by tests that
    /// need to steer trie shapes through chosen key nibbles.
    pub fn with_raw_storage_keys() -> Self {
        Self {
            hash_storage_keys: false,
            ..Self::default()
        }
    }

    fn storage_path(&self, key: B256) -> Nibbles {
        if self.hash_storage_keys {
            Nibbles::unpack(keccak256(key))
        } else {
            Nibbles::unpack(key)
        }
    }

    fn record_mut(&mut self, address: Address) -> &mut AccountRecord {
        self.dirty.insert(address);
        self.accounts.entry(address).or_default()
    }

    // Folds dirty accounts back into the state trie.
    fn sync(&mut self) {
        let dirty = core::mem::take(&mut self.dirty);
        for address in dirty {
            let hashed = keccak256(address);
            match self.accounts.get_mut(&address) {
                Some(record) => {
                    let account = TrieAccount {
                        nonce: record.nonce,
                        balance: record.balance,
                        storage_root: record.storage.hash(),
                        code_hash: record.code_hash,
                    };
                    self.account_trie
                        .insert(hashed, Bytes::from(alloy_rlp::encode(&account)));
                }
                None => self.account_trie.remove(hashed),
            }
        }
    }

    // Converts a trie proof into the interface shape, recording preimages and
    // hashing the neighbor reference the way a node-backed state would.
    fn finish_proof(&mut self, trie_proof: TrieProof) -> ProofData {
        for element in &trie_proof.elements {
            self.preimages.insert(keccak256(element), element.clone());
        }

        let (neighbor, is_neighbor_hashed) = match trie_proof.neighbor {
            Some(encoding) if encoding.len() >= 32 => {
                let hash = keccak256(&encoding);
                self.preimages.insert(hash, encoding);
                let mut reference = Vec::with_capacity(33);
                reference.push(0xa0);
                reference.extend_from_slice(hash.as_slice());
                (Some(Bytes::from(reference)), true)
            }
            other => (other, false),
        };

        ProofData {
            proof: trie_proof.elements,
            neighbor,
            ext_nibbles: trie_proof.ext_nibbles,
            is_last_leaf: trie_proof.is_last_leaf,
            is_neighbor_hashed,
        }
    }

    /// The slot value currently stored for `(address, key)`, if any.
    pub fn storage_value(&self, address: Address, key: B256) -> Option<&Bytes> {
        let path = self.storage_path(key);
        self.accounts
            .get(&address)
            .and_then(|record| record.storage.get_path(path))
    }
}

impl WitnessState for MemoryState {
    fn get_proof(&mut self, address: Address) -> Result<ProofData, WitnessError> {
        self.sync();
        let path = Nibbles::unpack(keccak256(address));
        let trie_proof = self.account_trie.prove_path(&path);
        Ok(self.finish_proof(trie_proof))
    }

    fn get_storage_proof(
        &mut self,
        address: Address,
        key: B256,
    ) -> Result<ProofData, WitnessError> {
        self.sync();
        let path = self.storage_path(key);
        let record = self.accounts.get_mut(&address).ok_or(
            WitnessError::StateInvariantBroken("storage proof requested for a missing account"),
        )?;
        let trie_proof = record.storage.prove_path(&path);
        Ok(self.finish_proof(trie_proof))
    }

    fn intermediate_root(&mut self, _delete_empty_objects: bool) -> B256 {
        self.sync();
        self.account_trie.hash()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.record_mut(address).nonce = nonce;
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        self.record_mut(address).balance = balance;
    }

    fn set_code_hash(&mut self, address: Address, code_hash: &[u8]) {
        self.record_mut(address).code_hash = B256::from_slice(code_hash);
    }

    fn set_state(&mut self, address: Address, key: B256, value: B256) {
        let path = self.storage_path(key);
        let record = self.record_mut(address);
        if value.is_zero() {
            record.storage.remove_path(path);
        } else {
            // Storage values are stored RLP-encoded with leading zeros trimmed.
            let trimmed: Vec<u8> = {
                let bytes = value.as_slice();
                let start = bytes.iter().position(|b| *b != 0).unwrap_or(31);
                bytes[start..].to_vec()
            };
            record
                .storage
                .insert_path(path, Bytes::from(alloy_rlp::encode(trimmed.as_slice())));
        }
    }

    fn create_account(&mut self, address: Address) {
        self.dirty.insert(address);
        self.accounts.insert(address, AccountRecord::default());
    }

    fn delete_account(&mut self, address: Address) {
        self.dirty.insert(address);
        self.accounts.remove(&address);
    }

    fn exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn trie_root_element(&mut self) -> Result<Bytes, WitnessError> {
        self.sync();
        self.account_trie
            .root_element()
            .ok_or(WitnessError::StateInvariantBroken(
                "the state trie is empty",
            ))
    }

    fn preimage(&self, hash: B256) -> Option<Bytes> {
        self.preimages.get(&hash).cloned()
    }

    fn hashes_storage_keys(&self) -> bool {
        self.hash_storage_keys
    }
}
