//! Cryptographic building blocks for offline signing
//!
//! - hash: SHA-256 / SHAKE primitives and the XMSS hash-function selector
//! - descriptor: 3-byte QRL descriptor (hash function, tree height)
//! - wots / xmss: WOTS+ one-time signatures and the XMSS Merkle tree
//! - mnemonic: 34-word seed phrases over a 4096-word list
//! - aes256: password cipher used by wallet files

#![forbid(unsafe_code)]

pub mod aes256;
pub mod descriptor;
pub mod hash;
pub mod mnemonic;
pub mod wots;
pub mod xmss;

pub use aes256::{Aes256CtrCipher, CipherError, SymmetricCipher};
pub use descriptor::Descriptor;
pub use hash::{Hash32, HashFunction};
pub use mnemonic::Wordlist;
pub use xmss::XmssKeyPair;
