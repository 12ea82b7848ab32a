//! Wallet file storage
//!
//! A wallet file is a JSON array whose first element holds the record. When
//! `encrypted` is set, `address`, `hexseed` and `mnemonic` are each
//! ciphertexts under the same password.

use std::fs;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::address;
use crate::crypto::aes256::SymmetricCipher;
use crate::crypto::descriptor::Descriptor;
use crate::crypto::mnemonic::Wordlist;
use crate::crypto::xmss::{XmssKeyPair, SEED_LEN};
use crate::error::{Result, SignerError};

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub address: String,
    pub hexseed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_function: Option<String>,
    pub encrypted: bool,
}

impl std::fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecord")
            .field("address", &self.address)
            .field("height", &self.height)
            .field("encrypted", &self.encrypted)
            .finish_non_exhaustive()
    }
}

impl WalletRecord {
    /// Load the first record of a wallet file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| SignerError::io(path, e))?;
        let mut records: Vec<WalletRecord> =
            serde_json::from_str(&data).map_err(|_| SignerError::WalletDecrypt("invalid wallet file"))?;
        if records.is_empty() {
            return Err(SignerError::WalletDecrypt("invalid wallet file"));
        }
        Ok(records.swap_remove(0))
    }

    /// Write as a single-element array, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string(&[self])?;
        fs::write(path, data).map_err(|e| SignerError::io(path, e))
    }

    /// Fresh wallet from OS randomness. The mnemonic is filled in when a word
    /// list is available.
    pub fn generate(descriptor: Descriptor, wordlist: Option<&Wordlist>) -> Result<Self> {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        OsRng.fill_bytes(&mut seed[..]);
        Self::from_seed(descriptor, &seed, wordlist)
    }

    pub fn from_seed(descriptor: Descriptor, seed: &[u8; SEED_LEN], wordlist: Option<&Wordlist>) -> Result<Self> {
        let key = XmssKeyPair::from_seed(descriptor, seed);
        let addr = address::from_public_key(&key.public_key())?;

        let mut extended = Zeroizing::new(Vec::with_capacity(3 + SEED_LEN));
        extended.extend_from_slice(&descriptor.to_bytes());
        extended.extend_from_slice(seed);

        let mnemonic = match wordlist {
            Some(wl) => Some(wl.encode(&extended)?.to_string()),
            None => None,
        };

        Ok(Self {
            address: addr.to_string(),
            hexseed: hex::encode(&extended[..]),
            mnemonic,
            height: Some(descriptor.height),
            hash_function: Some(descriptor.hash_function.name().to_string()),
            encrypted: false,
        })
    }

    /// Encrypt the secret-bearing fields in place.
    pub fn encrypt(&mut self, cipher: &dyn SymmetricCipher, password: &str) {
        if self.encrypted {
            return;
        }
        self.address = cipher.encrypt(password, &self.address);
        self.hexseed = cipher.encrypt(password, &self.hexseed);
        if let Some(m) = self.mnemonic.as_mut() {
            *m = cipher.encrypt(password, m);
        }
        self.encrypted = true;
    }
}
