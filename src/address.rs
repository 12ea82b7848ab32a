//! QRL address codec.
//!
//! Human form: `Q` followed by 78 lowercase/uppercase hex characters.
//! Raw form (39 bytes): descriptor(3) || SHA-256(extended pk)(32) || checksum(4),
//! where the checksum is the last 4 bytes of SHA-256 over the first 35.

use std::fmt;

use crate::crypto::descriptor::{Descriptor, DESCRIPTOR_LEN};
use crate::crypto::hash::sha256;
use crate::error::{Result, SignerError};

pub const ADDRESS_PREFIX: char = 'Q';
pub const RAW_ADDRESS_LEN: usize = DESCRIPTOR_LEN + 32 + 4;
pub const ADDRESS_STR_LEN: usize = 1 + RAW_ADDRESS_LEN * 2;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawAddress(pub [u8; RAW_ADDRESS_LEN]);

impl RawAddress {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_slice(b: &[u8]) -> Result<Self> {
        let arr: [u8; RAW_ADDRESS_LEN] = b.try_into().map_err(|_| SignerError::InvalidAddress {
            address: hex::encode(b),
            reason: "raw address must be 39 bytes",
        })?;
        let raw = RawAddress(arr);
        check_raw(&raw).map_err(|reason| SignerError::InvalidAddress { address: raw.to_string(), reason })?;
        Ok(raw)
    }
}

impl fmt::Display for RawAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ADDRESS_PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RawAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawAddress({self})")
    }
}

fn checksum(body: &[u8]) -> [u8; 4] {
    let h = sha256(body);
    [h[28], h[29], h[30], h[31]]
}

fn check_raw(raw: &RawAddress) -> std::result::Result<(), &'static str> {
    Descriptor::from_bytes(&raw.0[..DESCRIPTOR_LEN]).map_err(|_| "unsupported descriptor")?;
    if checksum(&raw.0[..DESCRIPTOR_LEN + 32]) != raw.0[DESCRIPTOR_LEN + 32..] {
        return Err("checksum mismatch");
    }
    Ok(())
}

/// Strip the prefix, hex-decode and verify the descriptor and checksum.
pub fn decode(address: &str) -> Result<RawAddress> {
    let invalid = |reason: &'static str| SignerError::InvalidAddress { address: address.to_string(), reason };
    let body = address.strip_prefix(ADDRESS_PREFIX).ok_or_else(|| invalid("missing Q prefix"))?;
    if address.len() != ADDRESS_STR_LEN {
        return Err(invalid("wrong length"));
    }
    let bytes = hex::decode(body).map_err(|_| invalid("not hex"))?;
    let mut raw = RawAddress([0u8; RAW_ADDRESS_LEN]);
    raw.0.copy_from_slice(&bytes);
    check_raw(&raw).map_err(invalid)?;
    Ok(raw)
}

pub fn encode(raw: &RawAddress) -> String {
    raw.to_string()
}

pub fn is_valid(address: &str) -> bool {
    decode(address).is_ok()
}

/// Address owned by an extended XMSS public key.
pub fn from_public_key(extended_pk: &[u8]) -> Result<RawAddress> {
    let descriptor = Descriptor::from_bytes(extended_pk)?;
    let mut raw = [0u8; RAW_ADDRESS_LEN];
    raw[..DESCRIPTOR_LEN].copy_from_slice(&descriptor.to_bytes());
    raw[DESCRIPTOR_LEN..DESCRIPTOR_LEN + 32].copy_from_slice(&sha256(extended_pk));
    let sum = checksum(&raw[..DESCRIPTOR_LEN + 32]);
    raw[DESCRIPTOR_LEN + 32..].copy_from_slice(&sum);
    Ok(RawAddress(raw))
}

#[cfg(test)]
pub(crate) fn sample_address(fill: u8) -> String {
    use crate::crypto::hash::HashFunction;
    let d = Descriptor::new(HashFunction::Sha2_256, 10).unwrap();
    let mut epk = d.to_bytes().to_vec();
    epk.extend_from_slice(&[fill; 64]);
    from_public_key(&epk).unwrap().to_string()
}
