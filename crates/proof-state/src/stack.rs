//! A sequential-insert stack trie recording a proof pair per insertion.
//!
//! Items are keyed by `rlp(index)` and inserted in the canonical derive-sha
//! order (indices `1..=0x7f`, then `0`, then `0x80..`), which is ascending
//! key order and therefore matches the shapes a streaming stack trie moves
//! through. Each insertion captures the proof toward the key before and after
//! the write, with per-element kinds and extension nibbles.
use alloy_primitives::{Bytes, B256};
use mpt_witness::{classify, ParsedNode, StackItemKind, StackProof, StackTrieProver, WitnessError};
use proof_trie::{Nibbles, Trie, TrieProof};

/// The stack-trie prover backing transaction-insertion witnesses.
#[derive(Debug, Clone, Default)]
pub struct StackTrie {
    trie: Trie,
}

impl StackTrie {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StackTrieProver for StackTrie {
    fn update_and_get_proofs(
        &mut self,
        items: &[Bytes],
    ) -> Result<(Vec<StackProof>, B256), WitnessError> {
        let mut proofs = Vec::with_capacity(items.len());
        for idx in derive_sha_order(items.len()) {
            let key = alloy_rlp::encode(idx as u64);
            let path = Nibbles::unpack(&key);

            let pre = self.trie.prove_path_through_divergence(&path);
            self.trie.insert_path(path.clone(), items[idx].clone());
            let post = self.trie.prove_path_through_divergence(&path);

            proofs.push(to_stack_proof(pre, post)?);
        }
        Ok((proofs, self.trie.hash()))
    }
}

// Index order used by derive-sha: rlp(0) = 0x80 sorts after the one-byte
// keys rlp(1)..rlp(0x7f), so index 0 is deferred past them.
fn derive_sha_order(len: usize) -> impl Iterator<Item = usize> {
    let one_byte = (1..len.max(1)).take(0x7f);
    let zero = if len > 0 { Some(0) } else { None };
    let rest = 0x80..len;
    one_byte.chain(zero).chain(rest)
}

fn to_stack_proof(pre: TrieProof, post: TrieProof) -> Result<StackProof, WitnessError> {
    let kinds_s = element_kinds(&pre.elements)?;
    let kinds_c = element_kinds(&post.elements)?;
    Ok(StackProof {
        proof_s: pre.elements,
        proof_c: post.elements,
        nibbles_s: pre.ext_nibbles,
        nibbles_c: post.ext_nibbles,
        kinds_s,
        kinds_c,
    })
}

fn element_kinds(elements: &[Bytes]) -> Result<Vec<StackItemKind>, WitnessError> {
    elements
        .iter()
        .map(|element| {
            Ok(match classify(element)? {
                ParsedNode::Branch => StackItemKind::Branch,
                ParsedNode::Extension { .. } => StackItemKind::Extension,
                ParsedNode::Leaf { .. } => StackItemKind::Leaf,
                ParsedNode::HashRef(_) => StackItemKind::Hashed,
            })
        })
        .collect()
}
