//! 34-word mnemonic encoding of the 51-byte extended seed.
//!
//! Each word carries 12 bits (an index into a 4096-word list), so word `i`
//! spells hex nibbles `3i..3i+3` of the extended seed.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::crypto::xmss::EXTENDED_SEED_LEN;
use crate::error::{Result, SeedForm, SignerError};

pub const WORDLIST_LEN: usize = 4096;
pub const MNEMONIC_WORDS: usize = EXTENDED_SEED_LEN * 2 / 3;

#[derive(Debug, Clone)]
pub struct Wordlist {
    words: Vec<String>,
    index: HashMap<String, u16>,
}

impl Wordlist {
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        if words.len() != WORDLIST_LEN {
            return Err(SignerError::Wordlist(format!(
                "expected {WORDLIST_LEN} words, found {}",
                words.len()
            )));
        }
        let mut index = HashMap::with_capacity(WORDLIST_LEN);
        for (i, w) in words.iter().enumerate() {
            if index.insert(w.clone(), i as u16).is_some() {
                return Err(SignerError::Wordlist(format!("duplicate word {w:?}")));
            }
        }
        Ok(Self { words, index })
    }

    /// One word per line; blank lines are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SignerError::io(path, e))?;
        Self::from_words(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn encode(&self, extended_seed: &[u8]) -> Result<Zeroizing<String>> {
        if extended_seed.len() != EXTENDED_SEED_LEN {
            return Err(SignerError::InvalidSeed(format!(
                "extended seed must be {EXTENDED_SEED_LEN} bytes"
            )));
        }
        let hex = Zeroizing::new(hex::encode(extended_seed));
        let mut out = Zeroizing::new(String::new());
        for (i, chunk) in hex.as_bytes().chunks(3).enumerate() {
            // chunk is ASCII hex produced above
            let s = std::str::from_utf8(chunk).map_err(|e| SignerError::InvalidSeed(e.to_string()))?;
            let idx = u16::from_str_radix(s, 16).map_err(|e| SignerError::InvalidSeed(e.to_string()))?;
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&self.words[idx as usize]);
        }
        Ok(out)
    }

    pub fn decode(&self, phrase: &str) -> Result<Zeroizing<Vec<u8>>> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.len() != MNEMONIC_WORDS {
            return Err(SignerError::SeedTooShort { form: SeedForm::Mnemonic, found: words.len() });
        }
        let mut hex = Zeroizing::new(String::with_capacity(EXTENDED_SEED_LEN * 2));
        for w in words {
            let idx = self
                .index
                .get(&w.to_lowercase())
                .ok_or_else(|| SignerError::InvalidSeed(format!("unknown mnemonic word {w:?}")))?;
            hex.push_str(&format!("{idx:03x}"));
        }
        let bytes = hex::decode(hex.as_str()).map_err(|e| SignerError::InvalidSeed(e.to_string()))?;
        Ok(Zeroizing::new(bytes))
    }
}

#[cfg(test)]
pub(crate) fn test_wordlist() -> Wordlist {
    Wordlist::from_words((0..WORDLIST_LEN).map(|i| format!("w{i:04}"))).unwrap()
}
