#![no_main]
//! Node classification must be total: adversarial byte strings are rejected
//! with an error, never a panic.
use libfuzzer_sys::fuzz_target;
use mpt_witness::{classify, extract_ext_nibbles, is_branch, keybytes_to_hex};

fuzz_target!(|data: &[u8]| {
    let _ = classify(data);
    let _ = is_branch(data);
    let _ = extract_ext_nibbles(data);
    let _ = keybytes_to_hex(data);
});
