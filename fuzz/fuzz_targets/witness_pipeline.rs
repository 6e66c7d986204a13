#![no_main]
//! End-to-end generation over arbitrary modification sequences must not
//! panic, and every produced stream must keep its groups root-chained and its
//! branch placeholder flags exclusive.
use alloy_primitives::{Address, B256, U256};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpt_witness::{generate_witness, TrieModification, WitnessNode, WitnessState};
use proof_state::MemoryState;

#[derive(Arbitrary, Debug)]
enum Op {
    Nonce { addr: u8, nonce: u16 },
    Balance { addr: u8, amount: u32 },
    Storage { addr: u8, slot: u8, value: u8 },
    StorageMissing { addr: u8, slot: u8 },
    Create { addr: u8 },
    Destruct { addr: u8 },
    Missing { addr: u8 },
}

fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte % 6 + 1)
}

fuzz_target!(|ops: Vec<Op>| {
    let mut state = MemoryState::new();
    for byte in 1..=4u8 {
        state.create_account(Address::repeat_byte(byte));
        state.set_balance(Address::repeat_byte(byte), U256::from(byte));
    }
    state.intermediate_root(false);

    let mods: Vec<TrieModification> = ops
        .iter()
        .take(16)
        .map(|op| match *op {
            Op::Nonce { addr: a, nonce } => TrieModification::nonce(addr(a), nonce as u64),
            Op::Balance { addr: a, amount } => {
                TrieModification::balance(addr(a), U256::from(amount))
            }
            Op::Storage { addr: a, slot, value } => TrieModification::storage(
                addr(a),
                B256::with_last_byte(slot),
                B256::with_last_byte(value),
            ),
            Op::StorageMissing { addr: a, slot } => {
                TrieModification::storage_does_not_exist(addr(a), B256::with_last_byte(slot))
            }
            Op::Create { addr: a } => TrieModification::account_create(addr(a)),
            Op::Destruct { addr: a } => TrieModification::account_destructed(addr(a)),
            Op::Missing { addr: a } => TrieModification::account_does_not_exist(addr(a)),
        })
        .collect();

    // Storage edits against destroyed accounts are rejected with an error;
    // everything else must produce a well-formed stream.
    let Ok(nodes) = generate_witness(&mut state, &mods) else {
        return;
    };

    let mut previous_post: Option<B256> = None;
    for node in &nodes {
        match node {
            WitnessNode::Start(start) => {
                if let Some(post) = previous_post {
                    assert_eq!(post, start.pre_root, "witness groups must chain");
                }
                previous_post = Some(start.post_root);
            }
            WitnessNode::Branch(branch) => {
                assert!(
                    !(branch.is_placeholder_s && branch.is_placeholder_c),
                    "branch placeholder flags must be exclusive"
                );
            }
            _ => {}
        }
    }
});
