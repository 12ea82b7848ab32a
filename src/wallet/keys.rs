//! Signer key resolution: wallet file or directly supplied hexseed/mnemonic.

use std::path::Path;

use zeroize::Zeroizing;

use crate::address::{self, RawAddress};
use crate::crypto::aes256::SymmetricCipher;
use crate::crypto::mnemonic::{Wordlist, MNEMONIC_WORDS};
use crate::crypto::xmss::{XmssKeyPair, EXTENDED_SEED_LEN};
use crate::error::{Result, SeedForm, SignerError};
use crate::wallet::storage::WalletRecord;

/// Where the signing key comes from.
#[derive(Clone, Copy)]
pub enum SignerSource<'a> {
    WalletFile { path: &'a Path, password: Option<&'a str> },
    Seed(&'a str),
}

impl<'a> SignerSource<'a> {
    /// Exactly one of wallet / seed must be given.
    pub fn select(
        wallet: Option<&'a Path>,
        seed: Option<&'a str>,
        password: Option<&'a str>,
    ) -> Result<Self> {
        match (wallet, seed) {
            (Some(path), None) => Ok(SignerSource::WalletFile { path, password }),
            (None, Some(seed)) => Ok(SignerSource::Seed(seed)),
            (Some(_), Some(_)) => Err(SignerError::ConflictingInput),
            (None, None) => Err(SignerError::MissingSignerMaterial),
        }
    }
}

/// Key pair plus the identity derived from it. Lives for one signing call.
pub struct WalletKeys {
    pub key: XmssKeyPair,
    pub public_key: Vec<u8>,
    pub address: RawAddress,
}

impl WalletKeys {
    fn from_key(key: XmssKeyPair) -> Result<Self> {
        let public_key = key.public_key();
        let address = address::from_public_key(&public_key)?;
        Ok(Self { key, public_key, address })
    }
}

/// Seed material that still needs its XMSS tree built.
pub struct KeyMaterial {
    extended: Zeroizing<Vec<u8>>,
    expected: Option<RawAddress>,
}

impl KeyMaterial {
    /// Builds the whole tree, so run it off the async workers.
    pub fn derive(self) -> Result<WalletKeys> {
        let keys = WalletKeys::from_key(XmssKeyPair::from_extended_seed(&self.extended)?)?;
        match self.expected {
            Some(addr) if keys.address != addr => {
                Err(SignerError::WalletDecrypt("wallet address does not match its seed"))
            }
            _ => Ok(keys),
        }
    }
}

pub struct KeyResolver<'a> {
    cipher: &'a dyn SymmetricCipher,
    wordlist: Option<&'a Wordlist>,
}

impl<'a> KeyResolver<'a> {
    pub fn new(cipher: &'a dyn SymmetricCipher, wordlist: Option<&'a Wordlist>) -> Self {
        Self { cipher, wordlist }
    }

    /// `prompt` is only called for encrypted wallets without a password.
    pub fn resolve<F>(&self, source: SignerSource<'_>, prompt: F) -> Result<WalletKeys>
    where
        F: FnOnce() -> Result<Zeroizing<String>>,
    {
        self.material(source, prompt)?.derive()
    }

    /// Decoded seed plus, for wallet files, the address it must produce.
    /// Cheap; the tree is only built by [`KeyMaterial::derive`].
    pub fn material<F>(&self, source: SignerSource<'_>, prompt: F) -> Result<KeyMaterial>
    where
        F: FnOnce() -> Result<Zeroizing<String>>,
    {
        match source {
            SignerSource::Seed(seed) => Ok(KeyMaterial { extended: self.extended_seed(seed)?, expected: None }),
            SignerSource::WalletFile { path, password } => {
                let record = WalletRecord::load(path)?;
                let (addr, seed) = self.open_record(&record, password, prompt)?;
                tracing::info!(from = %addr, "wallet opened");
                let extended = self
                    .extended_seed(&seed)
                    .map_err(|_| SignerError::WalletDecrypt("invalid wallet file"))?;
                Ok(KeyMaterial { extended, expected: Some(addr) })
            }
        }
    }

    /// Plaintext (address, seed) of a record. Both fields decrypt or neither does.
    pub fn open_record<F>(
        &self,
        record: &WalletRecord,
        password: Option<&str>,
        prompt: F,
    ) -> Result<(RawAddress, Zeroizing<String>)>
    where
        F: FnOnce() -> Result<Zeroizing<String>>,
    {
        if !record.encrypted {
            let addr = address::decode(&record.address)
                .map_err(|_| SignerError::WalletDecrypt("invalid wallet file"))?;
            return Ok((addr, Zeroizing::new(record.hexseed.clone())));
        }

        let password = match password {
            Some(p) => Zeroizing::new(p.to_string()),
            None => prompt()?,
        };
        let bad_password = |_| SignerError::WalletDecrypt("invalid password");
        let addr = self.cipher.decrypt(&password, &record.address).map_err(bad_password)?;
        let seed = self.cipher.decrypt(&password, &record.hexseed).map_err(bad_password)?;
        let addr = address::decode(&addr).map_err(|_| SignerError::WalletDecrypt("invalid password"))?;
        Ok((addr, seed))
    }

    /// 51-byte extended seed from a 102-char hexseed or a 34-word mnemonic.
    pub fn extended_seed(&self, seed: &str) -> Result<Zeroizing<Vec<u8>>> {
        let seed = seed.trim();
        if seed.contains(char::is_whitespace) {
            let words = seed.split_whitespace().count();
            if words != MNEMONIC_WORDS {
                return Err(SignerError::SeedTooShort { form: SeedForm::Mnemonic, found: words });
            }
            let wordlist = self
                .wordlist
                .ok_or_else(|| SignerError::Wordlist("no mnemonic wordlist configured".into()))?;
            return wordlist.decode(seed);
        }
        if seed.len() != EXTENDED_SEED_LEN * 2 {
            return Err(SignerError::SeedTooShort { form: SeedForm::HexSeed, found: seed.len() });
        }
        let bytes = hex::decode(seed).map_err(|e| SignerError::InvalidSeed(e.to_string()))?;
        Ok(Zeroizing::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::aes256::Aes256CtrCipher;
    use crate::crypto::descriptor::Descriptor;
    use crate::crypto::hash::HashFunction;
    use crate::crypto::mnemonic::test_wordlist;
    use crate::crypto::xmss::SEED_LEN;

    fn record(fill: u8) -> WalletRecord {
        let d = Descriptor::new(HashFunction::Sha2_256, 4).unwrap();
        WalletRecord::from_seed(d, &[fill; SEED_LEN], Some(&test_wordlist())).unwrap()
    }

    fn no_prompt() -> Result<Zeroizing<String>> {
        panic!("prompt must not be called")
    }

    #[test]
    fn source_selection() {
        let p = Path::new("w.json");
        assert!(matches!(SignerSource::select(Some(p), None, None), Ok(SignerSource::WalletFile { .. })));
        assert!(matches!(SignerSource::select(None, Some("ab"), None), Ok(SignerSource::Seed("ab"))));
        assert!(matches!(SignerSource::select(Some(p), Some("ab"), None), Err(SignerError::ConflictingInput)));
        assert!(matches!(SignerSource::select(None, None, None), Err(SignerError::MissingSignerMaterial)));
    }

    #[test]
    fn hexseed_length_is_exact() {
        let r = KeyResolver::new(&Aes256CtrCipher, None);
        for len in [0usize, 100, 101, 103, 104] {
            let seed = "0".repeat(len);
            assert!(matches!(
                r.extended_seed(&seed),
                Err(SignerError::SeedTooShort { form: SeedForm::HexSeed, found }) if found == len
            ));
        }
        assert!(matches!(r.extended_seed(&"g".repeat(102)), Err(SignerError::InvalidSeed(_))));
    }

    #[test]
    fn mnemonic_word_count_is_exact() {
        let wl = test_wordlist();
        let r = KeyResolver::new(&Aes256CtrCipher, Some(&wl));
        for n in [33usize, 35] {
            let phrase = vec!["w0000"; n].join(" ");
            assert!(matches!(
                r.extended_seed(&phrase),
                Err(SignerError::SeedTooShort { form: SeedForm::Mnemonic, found }) if found == n
            ));
        }
        let phrase = vec!["w0000"; MNEMONIC_WORDS].join(" ");
        assert_eq!(r.extended_seed(&phrase).unwrap().len(), EXTENDED_SEED_LEN);
    }

    #[test]
    fn mnemonic_without_wordlist_fails() {
        let r = KeyResolver::new(&Aes256CtrCipher, None);
        let phrase = vec!["w0000"; MNEMONIC_WORDS].join(" ");
        assert!(matches!(r.extended_seed(&phrase), Err(SignerError::Wordlist(_))));
    }

    #[test]
    fn mnemonic_word_count_is_checked_without_wordlist() {
        let r = KeyResolver::new(&Aes256CtrCipher, None);
        for n in [2usize, 33, 35] {
            let phrase = vec!["absorb"; n].join(" ");
            assert!(matches!(
                r.extended_seed(&phrase),
                Err(SignerError::SeedTooShort { form: SeedForm::Mnemonic, found }) if found == n
            ));
        }
    }

    #[test]
    fn material_defers_tree_building() {
        let rec = record(9);
        let r = KeyResolver::new(&Aes256CtrCipher, None);
        let material = r.material(SignerSource::Seed(&rec.hexseed), no_prompt).unwrap();
        assert_eq!(material.derive().unwrap().address.to_string(), rec.address);
    }

    #[test]
    fn hexseed_and_mnemonic_give_same_key() {
        let wl = test_wordlist();
        let rec = record(3);
        let r = KeyResolver::new(&Aes256CtrCipher, Some(&wl));
        let a = r.resolve(SignerSource::Seed(&rec.hexseed), no_prompt).unwrap();
        let b = r.resolve(SignerSource::Seed(rec.mnemonic.as_deref().unwrap()), no_prompt).unwrap();
        assert_eq!(a.public_key, b.public_key);
        assert_eq!(a.address.to_string(), rec.address);
    }

    #[test]
    fn plaintext_wallet_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        let rec = record(4);
        rec.save(&path).unwrap();
        let r = KeyResolver::new(&Aes256CtrCipher, None);
        let keys = r
            .resolve(SignerSource::WalletFile { path: &path, password: None }, no_prompt)
            .unwrap();
        assert_eq!(keys.address.to_string(), rec.address);
    }

    #[test]
    fn encrypted_wallet_with_flag_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet-enc.json");
        let mut rec = record(5);
        let addr = rec.address.clone();
        rec.encrypt(&Aes256CtrCipher, "password123");
        rec.save(&path).unwrap();

        let r = KeyResolver::new(&Aes256CtrCipher, None);
        let keys = r
            .resolve(SignerSource::WalletFile { path: &path, password: Some("password123") }, no_prompt)
            .unwrap();
        assert_eq!(keys.address.to_string(), addr);

        let keys = r
            .resolve(SignerSource::WalletFile { path: &path, password: None }, || {
                Ok(Zeroizing::new("password123".to_string()))
            })
            .unwrap();
        assert_eq!(keys.address.to_string(), addr);
    }

    #[test]
    fn wrong_password_is_a_decrypt_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet-enc.json");
        let mut rec = record(6);
        rec.encrypt(&Aes256CtrCipher, "password123");
        rec.save(&path).unwrap();

        let r = KeyResolver::new(&Aes256CtrCipher, None);
        for wrong in ["password124", "", "PASSWORD123"] {
            let res = r.resolve(SignerSource::WalletFile { path: &path, password: Some(wrong) }, no_prompt);
            assert!(matches!(res, Err(SignerError::WalletDecrypt(_))), "{wrong}");
        }
    }

    #[test]
    fn tampered_seed_is_caught_by_address_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        let mut rec = record(7);
        rec.hexseed = record(8).hexseed;
        rec.save(&path).unwrap();
        let r = KeyResolver::new(&Aes256CtrCipher, None);
        let res = r.resolve(SignerSource::WalletFile { path: &path, password: None }, no_prompt);
        assert!(matches!(res, Err(SignerError::WalletDecrypt(_))));
    }
}
