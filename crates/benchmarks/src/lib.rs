//! Shared fixtures for the witness generation benchmarks.
use alloy_primitives::{Address, B256, U256};
use mpt_witness::{TrieModification, WitnessState};
use proof_state::MemoryState;

/// A state populated with `n` accounts, each holding a few storage slots.
pub fn populated_state(n: u64) -> MemoryState {
    let mut state = MemoryState::new();
    for i in 0..n {
        let address = Address::from_word(B256::from(U256::from(i)));
        state.create_account(address);
        state.set_balance(address, U256::from(i) * U256::from(1_000));
        state.set_nonce(address, i);
        for slot in 0..4u64 {
            state.set_state(
                address,
                B256::from(U256::from(slot)),
                B256::from(U256::from(i + slot + 1)),
            );
        }
    }
    state.intermediate_root(false);
    state
}

/// One modification per account: alternating nonce bumps and storage writes.
pub fn modifications(n: u64) -> Vec<TrieModification> {
    (0..n)
        .map(|i| {
            let address = Address::from_word(B256::from(U256::from(i)));
            if i % 2 == 0 {
                TrieModification::nonce(address, i + 1)
            } else {
                TrieModification::storage(
                    address,
                    B256::from(U256::from(i % 4)),
                    B256::from(U256::from(i + 42)),
                )
            }
        })
        .collect()
}
