use alloy_primitives::B256;
use thiserror::Error;

/// Failures surfaced while turning proof pairs into witness nodes.
#[derive(Debug, Error)]
pub enum WitnessError {
    /// A node byte string is not a recognizable trie-node encoding.
    #[error("malformed node encoding: {0}")]
    MalformedEncoding(#[from] alloy_rlp::Error),
    /// The oracle has no preimage for a hash the witness requires.
    #[error("preimage unavailable for {0}")]
    PreimageUnavailable(B256),
    /// A modification contradicts the state it is applied to.
    #[error("state invariant broken: {0}")]
    StateInvariantBroken(&'static str),
    /// The external state or oracle failed.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),
}
