//! 3-byte QRL descriptor carried at the front of seeds, public keys and addresses.

use crate::crypto::hash::HashFunction;
use crate::error::{Result, SignerError};

pub const DESCRIPTOR_LEN: usize = 3;

pub const SIG_TYPE_XMSS: u8 = 0;
pub const ADDR_FORMAT_SHA256_2X: u8 = 0;

pub const MIN_HEIGHT: u8 = 2;
pub const MAX_HEIGHT: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub hash_function: HashFunction,
    pub height: u8,
}

impl Descriptor {
    pub fn new(hash_function: HashFunction, height: u8) -> Result<Self> {
        if height % 2 != 0 || !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
            return Err(SignerError::UnsupportedDescriptor(format!(
                "tree height {height} (must be even, {MIN_HEIGHT}..={MAX_HEIGHT})"
            )));
        }
        Ok(Self { hash_function, height })
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() < DESCRIPTOR_LEN {
            return Err(SignerError::UnsupportedDescriptor("truncated".into()));
        }
        let sig_type = b[0] >> 4;
        if sig_type != SIG_TYPE_XMSS {
            return Err(SignerError::UnsupportedDescriptor(format!("signature type {sig_type}")));
        }
        let hash_function = HashFunction::from_nibble(b[0] & 0x0F).ok_or_else(|| {
            SignerError::UnsupportedDescriptor(format!("hash function {}", b[0] & 0x0F))
        })?;
        let addr_format = b[1] >> 4;
        if addr_format != ADDR_FORMAT_SHA256_2X {
            return Err(SignerError::UnsupportedDescriptor(format!("address format {addr_format}")));
        }
        Self::new(hash_function, (b[1] & 0x0F) * 2)
    }

    pub fn to_bytes(self) -> [u8; DESCRIPTOR_LEN] {
        [
            (SIG_TYPE_XMSS << 4) | (self.hash_function as u8 & 0x0F),
            (ADDR_FORMAT_SHA256_2X << 4) | ((self.height >> 1) & 0x0F),
            0,
        ]
    }
}
