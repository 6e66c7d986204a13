//! Leaf row construction: account, storage and transaction leaves,
//! their placeholder variants, and the modified-extension rider.
use crate::error::WitnessError;
use crate::extension::prepare_extensions;
use crate::node::{
    AccountLeafNode, ExtensionView, ModExtensionRider, ProofSide, StorageLeafNode, TxLeafNode,
    WitnessNode,
};
use alloy_primitives::{Address, Bytes, B256};

#[allow(clippy::too_many_arguments)]
pub fn prepare_account_leaf_node(
    address: Address,
    key: &[u8],
    s: &[u8],
    c: &[u8],
    drifted: Option<Bytes>,
    is_placeholder_s: bool,
    is_placeholder_c: bool,
    is_non_existing: bool,
    is_mod_extension: [bool; 2],
) -> AccountLeafNode {
    AccountLeafNode {
        address,
        key: Bytes::copy_from_slice(key),
        s_encoding: Bytes::copy_from_slice(s),
        c_encoding: Bytes::copy_from_slice(c),
        drifted,
        is_placeholder_s,
        is_placeholder_c,
        is_non_existing,
        is_mod_extension,
        mod_extension: None,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn prepare_storage_leaf_node(
    storage_key: B256,
    key: &[u8],
    s: &[u8],
    c: &[u8],
    drifted: Option<Bytes>,
    is_placeholder_s: bool,
    is_placeholder_c: bool,
    is_non_existing: bool,
    is_mod_extension: [bool; 2],
) -> StorageLeafNode {
    StorageLeafNode {
        storage_key,
        key: Bytes::copy_from_slice(key),
        s_encoding: Bytes::copy_from_slice(s),
        c_encoding: Bytes::copy_from_slice(c),
        drifted,
        is_placeholder_s,
        is_placeholder_c,
        is_non_existing,
        is_mod_extension,
        mod_extension: None,
    }
}

/// The leaf row closing a non-existence proof whose last element is a branch
/// with an empty target slot. Carries no encodings; it exists to keep the
/// circuit's row structure uniform.
pub fn prepare_account_leaf_placeholder_node(address: Address, key: &[u8]) -> AccountLeafNode {
    prepare_account_leaf_node(address, key, &[], &[], None, true, true, true, [false; 2])
}

pub fn prepare_storage_leaf_placeholder_node(storage_key: B256, key: &[u8]) -> StorageLeafNode {
    prepare_storage_leaf_node(storage_key, key, &[], &[], None, true, true, true, [false; 2])
}

#[allow(clippy::too_many_arguments)]
pub fn prepare_tx_leaf_node(
    tx_index: u64,
    s: &[u8],
    c: &[u8],
    key: &[u8],
    drifted: Option<Bytes>,
    is_branch_in_row: bool,
    is_placeholder_s: bool,
    is_placeholder_c: bool,
) -> TxLeafNode {
    TxLeafNode {
        tx_index,
        key: Bytes::copy_from_slice(key),
        s_encoding: Bytes::copy_from_slice(s),
        c_encoding: Bytes::copy_from_slice(c),
        drifted,
        is_branch_in_row,
        is_placeholder_s,
        is_placeholder_c,
        is_mod_extension: [false; 2],
        mod_extension: None,
    }
}

/// A transaction leaf present only on the C side; the S row is a placeholder
/// copy of it.
pub fn prepare_tx_leaf_and_placeholder_node(
    tx_index: u64,
    c: &[u8],
    key: &[u8],
    is_s_mod_extension: bool,
) -> TxLeafNode {
    let mut node = prepare_tx_leaf_node(tx_index, c, c, key, None, false, true, false);
    node.is_mod_extension = [is_s_mod_extension, false];
    node
}

/// The leaf row for the case in which only one proof reaches a leaf: the
/// reached leaf fills both sides and the placeholder flag marks the side the
/// trie does not contain it on.
#[allow(clippy::too_many_arguments)]
pub(crate) fn prepare_leaf_and_placeholder_node(
    address: Address,
    storage_key: B256,
    key: &[u8],
    proof_s: &[Bytes],
    proof_c: &[Bytes],
    is_account: bool,
    is_non_existing: bool,
    is_mod_extension: [bool; 2],
) -> WitnessNode {
    let placeholder_s = proof_c.len() > proof_s.len();
    let leaf: &[u8] = if placeholder_s {
        proof_c.last().expect("longer proof is non-empty")
    } else {
        proof_s.last().expect("longer proof is non-empty")
    };

    if is_account {
        WitnessNode::AccountLeaf(prepare_account_leaf_node(
            address,
            key,
            leaf,
            leaf,
            None,
            placeholder_s,
            !placeholder_s,
            is_non_existing,
            is_mod_extension,
        ))
    } else {
        WitnessNode::StorageLeaf(prepare_storage_leaf_node(
            storage_key,
            key,
            leaf,
            leaf,
            None,
            placeholder_s,
            !placeholder_s,
            is_non_existing,
            is_mod_extension,
        ))
    }
}

/// Builds the rider carrying the extension node before and after a
/// modification that changed its shared-prefix length.
pub(crate) fn build_mod_extension_rider(
    proof_s: &[Bytes],
    proof_c: &[Bytes],
    number_of_nibbles: u8,
) -> ModExtensionRider {
    let len_s = proof_s.len();
    let len_c = proof_c.len();
    let insertion = len_c > len_s;

    // The short side's last element is the extension as it was before (or
    // after, for deletions) the reshape; the long side's extension, when the
    // shared prefix did not shrink to nothing, sits above its added branch.
    let long_ext = |proof: &[Bytes], other_len: usize| -> Bytes {
        if proof.len() == other_len + 2 {
            proof[proof.len() - 3].clone()
        } else {
            Bytes::new()
        }
    };

    let (s_encoding, c_encoding) = if insertion {
        (
            proof_s.last().cloned().unwrap_or_default(),
            long_ext(proof_c, len_s),
        )
    } else {
        (
            long_ext(proof_s, len_c),
            proof_c.last().cloned().unwrap_or_default(),
        )
    };

    ModExtensionRider {
        s_encoding,
        c_encoding,
        nibble_count: number_of_nibbles,
        modified_side: if insertion { ProofSide::S } else { ProofSide::C },
    }
}

/// Rider for the stack-trie mismatched-kind case: the S-side extension is
/// known explicitly and the C side has none.
pub(crate) fn build_stack_mod_extension_rider(
    ext_s: &[u8],
) -> Result<ModExtensionRider, WitnessError> {
    let (count, _) = prepare_extensions(&[], ext_s, ext_s)?;
    Ok(ModExtensionRider {
        s_encoding: Bytes::copy_from_slice(ext_s),
        c_encoding: Bytes::new(),
        nibble_count: count,
        modified_side: ProofSide::S,
    })
}

/// Folds the diverging extension of a non-existence proof into its closing
/// placeholder leaf. Both proof sides carry the same extension, so the rider's
/// side marker stays at S and the leaf's reshape flags stay clear, which
/// distinguishes the fold from a genuine reshape.
pub(crate) fn fold_diverging_extension(
    leaf: &mut WitnessNode,
    view: ExtensionView,
    nibble_count: u8,
) {
    let rider = ModExtensionRider {
        s_encoding: view.s_encoding,
        c_encoding: view.c_encoding,
        nibble_count,
        modified_side: ProofSide::S,
    };
    equip_leaf_with_mod_extension_node(leaf, rider);
}

/// Attaches a modified-extension rider to an already-built leaf row.
pub fn equip_leaf_with_mod_extension_node(leaf: &mut WitnessNode, rider: ModExtensionRider) {
    match leaf {
        WitnessNode::AccountLeaf(node) => node.mod_extension = Some(rider),
        WitnessNode::StorageLeaf(node) => node.mod_extension = Some(rider),
        WitnessNode::TxLeaf(node) => node.mod_extension = Some(rider),
        _ => debug_assert!(false, "rider attached to a non-leaf row"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    const LEAF: [u8; 6] = hex!("c58320123402");
    const EXT: [u8; 38] = hex!(
        "e583005858a01aaa6f712413b9a115730852323deb5f5d796c29151a60a1f55f41a25354cd26"
    );

    #[test]
    fn leaf_and_placeholder_marks_the_absent_side() {
        let s: Vec<Bytes> = vec![];
        let c: Vec<Bytes> = vec![Bytes::from_static(&LEAF)];
        let key = [1u8, 2, 3, 4, 16];

        let node = prepare_leaf_and_placeholder_node(
            Address::ZERO,
            B256::ZERO,
            &key,
            &s,
            &c,
            false,
            false,
            [false; 2],
        );
        let WitnessNode::StorageLeaf(leaf) = node else {
            panic!("expected a storage leaf");
        };
        assert!(leaf.is_placeholder_s);
        assert!(!leaf.is_placeholder_c);
        assert_eq!(leaf.s_encoding, leaf.c_encoding);
    }

    #[test]
    fn insertion_rider_carries_the_old_extension_on_s() {
        // S ends in the pre-modification extension; C grew an extension,
        // a branch and the new leaf.
        let proof_s: Vec<Bytes> = vec![Bytes::copy_from_slice(&EXT)];
        let proof_c: Vec<Bytes> = vec![
            Bytes::copy_from_slice(&EXT),
            Bytes::from_static(&hex!("d3c2200180808080808080808080808080808080")),
            Bytes::from_static(&LEAF),
        ];

        let rider = build_mod_extension_rider(&proof_s, &proof_c, 4);
        assert_eq!(rider.modified_side, ProofSide::S);
        assert_eq!(rider.s_encoding.as_ref(), &EXT);
        assert_eq!(rider.c_encoding.as_ref(), &EXT);
        assert_eq!(rider.nibble_count, 4);
    }

    #[test]
    fn rider_side_is_empty_when_the_extension_vanished() {
        let proof_s: Vec<Bytes> = vec![Bytes::copy_from_slice(&EXT)];
        let proof_c: Vec<Bytes> = vec![
            Bytes::from_static(&hex!("d3c2200180808080808080808080808080808080")),
            Bytes::from_static(&LEAF),
        ];

        let rider = build_mod_extension_rider(&proof_s, &proof_c, 0);
        assert_eq!(rider.s_encoding.as_ref(), &EXT);
        assert!(rider.c_encoding.is_empty());
    }
}
