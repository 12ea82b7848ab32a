//! Canonical transfer preimage.
//!
//! `fee (u64 BE) || for each output: raw address (39 bytes) || amount (u64 BE)`.
//! No length prefixes or separators; this layout is what the ledger hashes
//! when it checks a transfer signature.

use crate::outputs::Output;

pub fn encode(fee: u64, outputs: &[Output]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + outputs.len() * (crate::address::RAW_ADDRESS_LEN + 8));
    buf.extend_from_slice(&fee.to_be_bytes());
    for o in outputs {
        buf.extend_from_slice(o.to.as_bytes());
        buf.extend_from_slice(&o.amount.to_be_bytes());
    }
    buf
}
