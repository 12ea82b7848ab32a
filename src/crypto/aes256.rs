//! Password cipher used by QRL wallet files.
//!
//! key = SHA-256(password); ciphertext = base64(iv16 || AES-256-CTR(plaintext)).
//! There is no authentication tag: a wrong password decrypts to garbage.

use aes::Aes256;
use base64ct::{Base64, Encoding};
use ctr::cipher::generic_array::GenericArray;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::hash::sha256;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

const IV_LEN: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("ciphertext is not valid base64")]
    Encoding,
    #[error("ciphertext shorter than the IV")]
    Truncated,
    #[error("plaintext is not valid UTF-8")]
    NotUtf8,
}

/// Symmetric decrypt/encrypt capability consumed by the wallet resolver.
pub trait SymmetricCipher {
    fn encrypt(&self, password: &str, plaintext: &str) -> String;
    fn decrypt(&self, password: &str, ciphertext: &str) -> Result<Zeroizing<String>, CipherError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Aes256CtrCipher;

fn keystream(password: &str, iv: &[u8; IV_LEN], buf: &mut [u8]) {
    let key = Zeroizing::new(sha256(password.as_bytes()));
    let mut cipher = Aes256Ctr::new(GenericArray::from_slice(&key[..]), GenericArray::from_slice(&iv[..]));
    cipher.apply_keystream(buf);
}

impl Aes256CtrCipher {
    pub fn encrypt_with_iv(&self, password: &str, plaintext: &str, iv: [u8; IV_LEN]) -> String {
        let mut body = Zeroizing::new(plaintext.as_bytes().to_vec());
        keystream(password, &iv, &mut body);
        let mut out = Vec::with_capacity(IV_LEN + body.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&body);
        Base64::encode_string(&out)
    }
}

impl SymmetricCipher for Aes256CtrCipher {
    fn encrypt(&self, password: &str, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        self.encrypt_with_iv(password, plaintext, iv)
    }

    fn decrypt(&self, password: &str, ciphertext: &str) -> Result<Zeroizing<String>, CipherError> {
        let raw = Base64::decode_vec(ciphertext.trim()).map_err(|_| CipherError::Encoding)?;
        if raw.len() < IV_LEN {
            return Err(CipherError::Truncated);
        }
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&raw[..IV_LEN]);
        let mut body = raw[IV_LEN..].to_vec();
        keystream(password, &iv, &mut body);
        let text = String::from_utf8(body).map_err(|e| {
            let mut bytes = e.into_bytes();
            zeroize::Zeroize::zeroize(&mut bytes);
            CipherError::NotUtf8
        })?;
        Ok(Zeroizing::new(text))
    }
}
