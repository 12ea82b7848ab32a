//! Hash primitives shared by the transfer digest, addresses and XMSS.

use sha2::{Digest, Sha256};
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake128, Shake256,
};

pub type Hash32 = [u8; 32];

/// XMSS tree hash function, as encoded in the low nibble of descriptor byte 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunction {
    Sha2_256 = 0,
    Shake128 = 1,
    Shake256 = 2,
}

impl HashFunction {
    pub fn from_nibble(v: u8) -> Option<Self> {
        match v {
            0 => Some(HashFunction::Sha2_256),
            1 => Some(HashFunction::Shake128),
            2 => Some(HashFunction::Shake256),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashFunction::Sha2_256 => "sha2_256",
            HashFunction::Shake128 => "shake_128",
            HashFunction::Shake256 => "shake_256",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "sha2_256" | "sha256" => Some(HashFunction::Sha2_256),
            "shake_128" | "shake128" => Some(HashFunction::Shake128),
            "shake_256" | "shake256" => Some(HashFunction::Shake256),
            _ => None,
        }
    }

    /// n-byte hash of the concatenation of `parts`.
    pub fn digest(self, parts: &[&[u8]]) -> Hash32 {
        let mut out = [0u8; 32];
        match self {
            HashFunction::Sha2_256 => {
                let mut h = Sha256::new();
                for p in parts {
                    Digest::update(&mut h, p);
                }
                out.copy_from_slice(&h.finalize());
            }
            HashFunction::Shake128 => {
                let mut h = Shake128::default();
                for p in parts {
                    h.update(p);
                }
                h.finalize_xof().read(&mut out);
            }
            HashFunction::Shake256 => {
                let mut h = Shake256::default();
                for p in parts {
                    h.update(p);
                }
                h.finalize_xof().read(&mut out);
            }
        }
        out
    }
}

/// Plain SHA-256, used for the message digest and the transaction hash.
pub fn sha256(data: &[u8]) -> Hash32 {
    sha256_concat(&[data])
}

pub fn sha256_concat(parts: &[&[u8]]) -> Hash32 {
    HashFunction::Sha2_256.digest(parts)
}

/// SHAKE256 expanded to `out.len()` bytes.
pub fn shake256_fill(input: &[u8], out: &mut [u8]) {
    let mut h = Shake256::default();
    h.update(input);
    h.finalize_xof().read(out);
}

/// Big-endian `value` left-padded to `len` bytes (XMSS `toByte`).
pub fn to_byte(value: u64, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let be = value.to_be_bytes();
    let take = len.min(8);
    out[len - take..].copy_from_slice(&be[8 - take..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_answer() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn concat_matches_single_buffer() {
        assert_eq!(sha256_concat(&[b"ab", b"c"]), sha256(b"abc"));
    }

    #[test]
    fn shake_variants_differ() {
        let a = HashFunction::Shake128.digest(&[b"x"]);
        let b = HashFunction::Shake256.digest(&[b"x"]);
        let c = HashFunction::Sha2_256.digest(&[b"x"]);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn to_byte_pads_big_endian() {
        assert_eq!(to_byte(3, 4), vec![0, 0, 0, 3]);
        let b = to_byte(0x0102, 32);
        assert_eq!(b.len(), 32);
        assert_eq!(&b[30..], &[1, 2]);
        assert!(b[..30].iter().all(|&x| x == 0));
    }
}
