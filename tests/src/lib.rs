#![allow(missing_docs)]

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bytes, B256, U256};
    use mpt_witness::{
        extract_ext_nibbles, generate_witness, stack_trie_witness, ProofData, ProofType,
        TrieModification, WitnessError, WitnessNode, WitnessState,
    };
    use proof_state::{MemoryState, StackTrie};

    fn address(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn slot(byte: u8) -> B256 {
        B256::with_last_byte(byte)
    }

    // A state with enough accounts that account proofs traverse branches.
    fn populated_state() -> MemoryState {
        let mut state = MemoryState::new();
        for byte in 1..=16u8 {
            state.create_account(address(byte));
            state.set_balance(address(byte), U256::from(byte) * U256::from(1_000));
        }
        state.intermediate_root(false);
        state
    }

    fn groups(nodes: &[WitnessNode]) -> Vec<&[WitnessNode]> {
        let mut out = Vec::new();
        let mut start = 0;
        for (i, node) in nodes.iter().enumerate() {
            match node {
                WitnessNode::Start(_) => start = i,
                WitnessNode::End => out.push(&nodes[start..=i]),
                _ => {}
            }
        }
        out
    }

    fn assert_branch_placeholders_exclusive(nodes: &[WitnessNode]) {
        for node in nodes {
            if let WitnessNode::Branch(branch) = node {
                assert!(
                    !(branch.is_placeholder_s && branch.is_placeholder_c),
                    "both placeholder flags set on a branch row"
                );
            }
        }
    }

    #[test]
    fn nonce_change_on_existing_account() {
        let mut state = populated_state();
        state.set_nonce(address(0x01), 6);
        let pre_root = state.intermediate_root(false);

        let nodes =
            generate_witness(&mut state, &[TrieModification::nonce(address(0x01), 7)]).unwrap();
        let post_root = state.intermediate_root(false);

        let WitnessNode::Start(start) = &nodes[0] else {
            panic!("stream must open with a start node");
        };
        assert_eq!(start.proof_type, ProofType::NonceChanged);
        assert_eq!(start.pre_root, pre_root);
        assert_eq!(start.post_root, post_root);
        assert_eq!(nodes.last(), Some(&WitnessNode::End));

        // Branch rows over the shared path, then the account leaf pair.
        let payload = &nodes[1..nodes.len() - 1];
        assert!(!payload.is_empty());
        for node in &payload[..payload.len() - 1] {
            assert!(matches!(node, WitnessNode::Branch(_)));
        }
        let WitnessNode::AccountLeaf(leaf) = payload.last().unwrap() else {
            panic!("expected the account leaf row last");
        };
        assert_ne!(leaf.s_encoding, leaf.c_encoding);
        assert!(!leaf.is_non_existing);
        assert_branch_placeholders_exclusive(&nodes);
    }

    #[test]
    fn non_existence_in_a_single_account_trie_uses_the_wrong_leaf() {
        let mut state = MemoryState::new();
        state.create_account(address(0xbb));
        state.set_balance(address(0xbb), U256::from(1));
        state.intermediate_root(false);

        let nodes = generate_witness(
            &mut state,
            &[TrieModification::account_does_not_exist(address(0xaa))],
        )
        .unwrap();

        assert_eq!(nodes.len(), 3);
        let WitnessNode::Start(start) = &nodes[0] else {
            panic!("missing start node");
        };
        assert_eq!(start.proof_type, ProofType::AccountDoesNotExist);
        assert_eq!(start.pre_root, start.post_root);
        let WitnessNode::AccountLeaf(leaf) = &nodes[1] else {
            panic!("expected the wrong leaf row");
        };
        assert!(leaf.is_non_existing);
        assert_eq!(leaf.s_encoding, leaf.c_encoding);
        assert!(!leaf.s_encoding.is_empty());
    }

    #[test]
    fn non_existence_against_a_nil_branch_slot_emits_a_placeholder_leaf() {
        let mut state = populated_state();
        // An address whose hashed key is absent from the trie.
        let nodes = generate_witness(
            &mut state,
            &[TrieModification::account_does_not_exist(address(0xfe))],
        )
        .unwrap();

        let payload = &nodes[1..nodes.len() - 1];
        match payload.last().unwrap() {
            WitnessNode::AccountLeaf(leaf) => {
                // Placeholder leaf or wrong leaf, never both.
                if leaf.is_placeholder_s {
                    assert!(leaf.is_placeholder_c);
                    assert!(leaf.s_encoding.is_empty());
                } else {
                    assert!(!leaf.s_encoding.is_empty());
                }
                assert!(leaf.is_non_existing);
            }
            other => panic!("expected a leaf row, got {other:?}"),
        }
    }

    #[test]
    fn storage_insertion_splits_a_leaf_into_a_branch() {
        let mut state = MemoryState::with_raw_storage_keys();
        state.create_account(address(0xaa));
        state.set_state(address(0xaa), slot(0x01), B256::with_last_byte(0x11));
        state.intermediate_root(false);

        let nodes = generate_witness(
            &mut state,
            &[TrieModification::storage(
                address(0xaa),
                slot(0x02),
                B256::with_last_byte(0x22),
            )],
        )
        .unwrap();

        // [start, account leaf (unchanged), placeholder branch, storage leaf, end]
        assert_eq!(nodes.len(), 5);
        let WitnessNode::AccountLeaf(account) = &nodes[1] else {
            panic!("expected the account leaf row");
        };
        // The account leaf changes because the storage root changes.
        assert_ne!(account.s_encoding, account.c_encoding);

        let WitnessNode::Branch(branch) = &nodes[2] else {
            panic!("expected the placeholder branch");
        };
        assert!(branch.is_placeholder_s);
        assert!(!branch.is_placeholder_c);
        // The slot keys 0x..01 and 0x..02 share 63 nibbles; the split happens
        // at the final nibble, under a created extension.
        assert!(branch.is_extension());
        assert_eq!(branch.modified_index, 2);
        assert_eq!(branch.drifted_index, 1);

        let WitnessNode::StorageLeaf(leaf) = &nodes[3] else {
            panic!("expected the storage leaf row");
        };
        assert_eq!(leaf.storage_key, slot(0x02));
        assert!(!leaf.c_encoding.is_empty());
    }

    #[test]
    fn storage_deletion_collapses_the_branch() {
        let mut state = MemoryState::with_raw_storage_keys();
        state.create_account(address(0xaa));
        state.set_state(address(0xaa), slot(0x01), B256::with_last_byte(0x11));
        state.set_state(address(0xaa), slot(0x02), B256::with_last_byte(0x22));
        state.intermediate_root(false);

        let nodes = generate_witness(
            &mut state,
            &[TrieModification::storage(address(0xaa), slot(0x02), B256::ZERO)],
        )
        .unwrap();

        let payload = &nodes[1..nodes.len() - 1];
        let branch = payload
            .iter()
            .find_map(|node| match node {
                WitnessNode::Branch(branch) if branch.is_placeholder_c => Some(branch),
                _ => None,
            })
            .expect("deletion inserts a C-side placeholder branch");
        assert!(!branch.is_placeholder_s);
        assert_eq!(branch.drifted_index, 1);

        let WitnessNode::StorageLeaf(leaf) = payload.last().unwrap() else {
            panic!("expected the storage leaf row");
        };
        // The drifted slot carries the surviving sibling.
        assert!(leaf.drifted.is_some());
        assert_branch_placeholders_exclusive(&nodes);
    }

    #[test]
    fn modified_extension_node_shortens_the_shared_prefix() {
        let mut state = MemoryState::with_raw_storage_keys();
        state.create_account(address(0xaa));
        // Two slots sharing the nibble prefix a-b, one branch below it.
        let mut k1 = [0u8; 32];
        k1[0] = 0xab;
        k1[1] = 0x10;
        let mut k2 = [0u8; 32];
        k2[0] = 0xab;
        k2[1] = 0x20;
        state.set_state(address(0xaa), B256::from(k1), B256::with_last_byte(0x01));
        state.set_state(address(0xaa), B256::from(k2), B256::with_last_byte(0x02));
        state.intermediate_root(false);

        // Inserting a-c... shares only the nibble a: the extension shortens.
        let mut k3 = [0u8; 32];
        k3[0] = 0xac;
        let nodes = generate_witness(
            &mut state,
            &[TrieModification::storage(
                address(0xaa),
                B256::from(k3),
                B256::with_last_byte(0x03),
            )],
        )
        .unwrap();

        let payload = &nodes[1..nodes.len() - 1];
        let WitnessNode::StorageLeaf(leaf) = payload.last().unwrap() else {
            panic!("expected the storage leaf row");
        };
        let rider = leaf
            .mod_extension
            .as_ref()
            .expect("the reshaped extension rides on the leaf");
        assert_eq!(rider.nibble_count, 1);
        assert_eq!(extract_ext_nibbles(&rider.s_encoding).unwrap(), vec![0xa, 0xb]);
        assert_eq!(extract_ext_nibbles(&rider.c_encoding).unwrap(), vec![0xa]);
        assert_eq!(leaf.is_mod_extension, [true, false]);
        assert_branch_placeholders_exclusive(&nodes);
    }

    #[test]
    fn sequential_transaction_inserts() {
        let mut stack = StackTrie::new();
        let items: Vec<Bytes> = (0..3u8)
            .map(|i| Bytes::from(vec![0xde, 0xad, i]))
            .collect();

        let nodes = stack_trie_witness(&mut stack, &items).unwrap();
        let groups = groups(&nodes);
        assert_eq!(groups.len(), 3);

        for group in &groups {
            let WitnessNode::Start(start) = &group[0] else {
                panic!("group must open with a start node");
            };
            assert_eq!(start.proof_type, ProofType::TransactionInsertion);
            assert_eq!(start.pre_root, B256::ZERO);
            assert_ne!(start.post_root, B256::ZERO);
        }

        // First insertion into the empty trie: a single leaf row.
        assert_eq!(groups[0].len(), 3);
        assert!(matches!(groups[0][1], WitnessNode::TxLeaf(_)));

        // Second group: the lone leaf splits under a new extension + branch.
        assert_eq!(groups[1].len(), 4);
        let WitnessNode::Branch(branch) = &groups[1][1] else {
            panic!("expected the placeholder branch");
        };
        assert!(branch.is_placeholder_s);
        assert!(branch.is_extension());
        assert!(matches!(groups[1][2], WitnessNode::TxLeaf(_)));

        // Third group: the deferred rlp(0) key reshapes the extension.
        assert_eq!(groups[2].len(), 4);
        let WitnessNode::Branch(branch) = &groups[2][1] else {
            panic!("expected the branch row");
        };
        assert!(branch.is_placeholder_c);
        let WitnessNode::TxLeaf(leaf) = &groups[2][2] else {
            panic!("expected the tx leaf");
        };
        assert!(leaf.mod_extension.is_some());
        assert_eq!(leaf.tx_index, 0);
    }

    #[test]
    fn witness_groups_chain_roots() {
        let mut state = populated_state();
        let modifications = vec![
            TrieModification::nonce(address(0x01), 11),
            TrieModification::balance(address(0x02), U256::from(777)),
            TrieModification::account_create(address(0xcc)),
            TrieModification::nonce(address(0xcc), 1),
            TrieModification::account_destructed(address(0x03)),
        ];
        let nodes = generate_witness(&mut state, &modifications).unwrap();

        let starts: Vec<_> = nodes
            .iter()
            .filter_map(|node| match node {
                WitnessNode::Start(start) => Some(start.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(starts.len(), modifications.len());
        for pair in starts.windows(2) {
            assert_eq!(pair[0].post_root, pair[1].pre_root);
        }
        assert_eq!(
            starts.last().unwrap().post_root,
            state.intermediate_root(false)
        );
        assert_branch_placeholders_exclusive(&nodes);
    }

    #[test]
    fn nonce_round_trip_returns_to_the_starting_root() {
        let mut state = populated_state();
        state.set_nonce(address(0x04), 5);
        state.intermediate_root(false);

        let nodes = generate_witness(
            &mut state,
            &[
                TrieModification::nonce(address(0x04), 6),
                TrieModification::nonce(address(0x04), 5),
            ],
        )
        .unwrap();

        let starts: Vec<_> = nodes
            .iter()
            .filter_map(|node| match node {
                WitnessNode::Start(start) => Some(start.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(starts[0].pre_root, starts[1].post_root);
    }

    #[test]
    fn generation_is_byte_identical_across_runs() {
        let make = || {
            let mut state = populated_state();
            generate_witness(
                &mut state,
                &[
                    TrieModification::nonce(address(0x05), 9),
                    TrieModification::storage(address(0x05), slot(0x01), B256::with_last_byte(3)),
                    TrieModification::account_does_not_exist(address(0xfd)),
                ],
            )
            .unwrap()
        };

        let first = serde_json::to_string(&make()).unwrap();
        let second = serde_json::to_string(&make()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn storage_for_a_missing_account_is_rejected() {
        let mut state = MemoryState::new();
        state.create_account(address(0x01));
        state.intermediate_root(false);

        let err = generate_witness(
            &mut state,
            &[TrieModification::storage(
                address(0x02),
                slot(0x01),
                B256::with_last_byte(1),
            )],
        )
        .unwrap_err();
        assert!(matches!(err, WitnessError::StateInvariantBroken(_)));
    }

    #[test]
    fn storage_does_not_exist_closes_with_a_non_existing_row() {
        let mut state = MemoryState::new();
        state.create_account(address(0xaa));
        state.set_state(address(0xaa), slot(0x01), B256::with_last_byte(0x11));
        state.intermediate_root(false);

        let nodes = generate_witness(
            &mut state,
            &[TrieModification::storage_does_not_exist(
                address(0xaa),
                slot(0x7f),
            )],
        )
        .unwrap();

        let payload = &nodes[1..nodes.len() - 1];
        let WitnessNode::StorageLeaf(leaf) = payload.last().unwrap() else {
            panic!("expected a storage row last");
        };
        assert!(leaf.is_non_existing);
        // The state is untouched by a non-existence proof.
        let WitnessNode::Start(start) = &nodes[0] else {
            panic!("missing start node");
        };
        assert_eq!(start.pre_root, start.post_root);
    }

    #[test]
    fn account_create_inserts_a_leaf() {
        let mut state = populated_state();
        let nodes = generate_witness(
            &mut state,
            &[TrieModification::account_create(address(0xf1))],
        )
        .unwrap();

        let WitnessNode::Start(start) = &nodes[0] else {
            panic!("missing start node");
        };
        assert_eq!(start.proof_type, ProofType::AccountCreate);
        assert_ne!(start.pre_root, start.post_root);
        let payload = &nodes[1..nodes.len() - 1];
        match payload.last().unwrap() {
            WitnessNode::AccountLeaf(leaf) => {
                // The created leaf exists only on the C side.
                assert!(!leaf.c_encoding.is_empty());
                assert!(!leaf.is_placeholder_c);
            }
            other => panic!("expected an account leaf row, got {other:?}"),
        }
        assert_branch_placeholders_exclusive(&nodes);
    }

    // A state whose proof retrieval omits the diverging root leaf, driving
    // the driver's single-account special case.
    struct EmptyProofState {
        inner: MemoryState,
    }

    impl WitnessState for EmptyProofState {
        fn get_proof(&mut self, _address: Address) -> Result<ProofData, WitnessError> {
            Ok(ProofData::default())
        }
        fn get_storage_proof(
            &mut self,
            address: Address,
            key: B256,
        ) -> Result<ProofData, WitnessError> {
            self.inner.get_storage_proof(address, key)
        }
        fn intermediate_root(&mut self, delete_empty_objects: bool) -> B256 {
            self.inner.intermediate_root(delete_empty_objects)
        }
        fn set_nonce(&mut self, address: Address, nonce: u64) {
            self.inner.set_nonce(address, nonce);
        }
        fn set_balance(&mut self, address: Address, balance: U256) {
            self.inner.set_balance(address, balance);
        }
        fn set_code_hash(&mut self, address: Address, code_hash: &[u8]) {
            self.inner.set_code_hash(address, code_hash);
        }
        fn set_state(&mut self, address: Address, key: B256, value: B256) {
            self.inner.set_state(address, key, value);
        }
        fn create_account(&mut self, address: Address) {
            self.inner.create_account(address);
        }
        fn delete_account(&mut self, address: Address) {
            self.inner.delete_account(address);
        }
        fn exists(&self, address: Address) -> bool {
            self.inner.exists(address)
        }
        fn trie_root_element(&mut self) -> Result<Bytes, WitnessError> {
            self.inner.trie_root_element()
        }
        fn preimage(&self, hash: B256) -> Option<Bytes> {
            self.inner.preimage(hash)
        }
    }

    #[test]
    fn empty_proof_single_account_duplicates_the_root_leaf() {
        let mut inner = MemoryState::new();
        inner.create_account(address(0xbb));
        inner.intermediate_root(false);
        let mut state = EmptyProofState { inner };

        let nodes = generate_witness(
            &mut state,
            &[TrieModification::account_does_not_exist(address(0xaa))],
        )
        .unwrap();

        assert_eq!(nodes.len(), 3);
        let WitnessNode::AccountLeaf(leaf) = &nodes[1] else {
            panic!("expected the duplicated root leaf");
        };
        assert!(leaf.is_non_existing);
        assert_eq!(leaf.s_encoding, leaf.c_encoding);
        assert!(!leaf.s_encoding.is_empty());
    }
}
