//! Signing engine.
//!
//! The pipeline is a chain of typed states, each consumed by the next step:
//!
//! ```text
//! KeyLoaded -> PreimageBuilt -> Signed -> HashBound -> (persisted record)
//! ```
//!
//! Steps cannot be skipped or reordered, and nothing is retried: once a
//! signature exists its OTS index is spent, so any later failure means the
//! whole pipeline has to be run again with a fresh index.

use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;

use crate::config::WordlistSource;
use crate::crypto::descriptor::Descriptor;
use crate::crypto::hash::{sha256, sha256_concat, Hash32, HashFunction};
use crate::crypto::mnemonic::Wordlist;
use crate::crypto::xmss::{self, XmssKeyPair, SEED_LEN};
use crate::error::{Result, SignerError};
use crate::ots_ledger::OtsLedger;
use crate::outputs::Output;
use crate::preimage;
use crate::tx::SignedTransaction;
use crate::wallet::WalletKeys;

/* ============================================================================
 * Primitives
 * ========================================================================== */

/// SHA-256 of the transfer preimage.
pub fn digest(preimage: &[u8]) -> Hash32 {
    sha256(preimage)
}

/// One-time signature over `digest` at leaf `index`.
pub fn sign(key: &XmssKeyPair, index: u32, digest: &Hash32) -> Result<Vec<u8>> {
    key.sign(index, digest)
}

/// Transaction hash: SHA-256(digest || signature || public key).
pub fn bind_hash(digest: &Hash32, signature: &[u8], public_key: &[u8]) -> Hash32 {
    sha256_concat(&[&digest[..], signature, public_key])
}

/* ============================================================================
 * Provider readiness
 * ========================================================================== */

/// Initialised provider state shared by every signing call of a run.
#[derive(Debug)]
pub struct Provider {
    wordlist: Option<Wordlist>,
}

impl Provider {
    pub fn wordlist(&self) -> Option<&Wordlist> {
        self.wordlist.as_ref()
    }
}

/// One-shot initialisation barrier: the first `ready()` runs the self test and
/// loads the word list, every later call gets the same [`Provider`].
pub struct SigningProvider {
    wordlist: WordlistSource,
    cell: OnceCell<Provider>,
}

impl SigningProvider {
    pub fn new(wordlist: WordlistSource) -> Self {
        Self { wordlist, cell: OnceCell::new() }
    }

    pub async fn ready(&self) -> Result<&Provider> {
        self.cell.get_or_try_init(|| Self::init(self.wordlist.clone())).await
    }

    async fn init(source: WordlistSource) -> Result<Provider> {
        tokio::task::spawn_blocking(self_test)
            .await
            .map_err(|e| SignerError::ProviderInit(e.to_string()))??;

        let wordlist = match source {
            WordlistSource::Explicit(path) => Some(load_wordlist(path).await?),
            WordlistSource::Default(path) if path.exists() => Some(load_wordlist(path).await?),
            WordlistSource::Default(_) | WordlistSource::None => None,
        };
        tracing::debug!(mnemonic = wordlist.is_some(), "signing provider ready");
        Ok(Provider { wordlist })
    }
}

async fn load_wordlist(path: PathBuf) -> Result<Wordlist> {
    tokio::task::spawn_blocking(move || Wordlist::load(&path))
        .await
        .map_err(|e| SignerError::ProviderInit(e.to_string()))?
}

fn self_test() -> Result<()> {
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    if hex::encode(sha256(b"abc")) != ABC_SHA256 {
        return Err(SignerError::ProviderInit("sha256 known answer mismatch".into()));
    }
    for hash in [HashFunction::Sha2_256, HashFunction::Shake128, HashFunction::Shake256] {
        let descriptor = Descriptor::new(hash, 2)?;
        let key = XmssKeyPair::from_seed(descriptor, &[0x42; SEED_LEN]);
        let msg = sha256(b"self-test");
        let sig = key.sign(3, &msg)?;
        if !xmss::verify(&msg, &sig, &key.public_key()) {
            return Err(SignerError::ProviderInit(format!("xmss {} sign/verify", hash.name())));
        }
    }
    Ok(())
}

/* ============================================================================
 * Pipeline states
 * ========================================================================== */

pub struct KeyLoaded {
    keys: WalletKeys,
}

pub struct PreimageBuilt {
    keys: WalletKeys,
    fee: u64,
    outputs: Vec<Output>,
    preimage: Vec<u8>,
}

pub struct Signed {
    public_key: Vec<u8>,
    fee: u64,
    outputs: Vec<Output>,
    ots: u32,
    digest: Hash32,
    signature: Vec<u8>,
}

pub struct HashBound {
    record: SignedTransaction,
}

impl KeyLoaded {
    pub fn new(keys: WalletKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &WalletKeys {
        &self.keys
    }

    pub fn build_preimage(self, fee: u64, outputs: Vec<Output>) -> PreimageBuilt {
        let preimage = preimage::encode(fee, &outputs);
        PreimageBuilt { keys: self.keys, fee, outputs, preimage }
    }
}

impl PreimageBuilt {
    pub fn preimage(&self) -> &[u8] {
        &self.preimage
    }

    /// Ledger check, digest, one-time signature, then the index is marked
    /// spent before the signature leaves this call. The key pair is dropped here.
    pub fn sign(self, index: u32, ledger: &mut dyn OtsLedger) -> Result<Signed> {
        ledger.check(&self.keys.public_key, index)?;
        let digest = digest(&self.preimage);
        let signature = sign(&self.keys.key, index, &digest)?;
        ledger.record(&self.keys.public_key, index)?;
        tracing::info!(
            ots = index,
            "transaction signed (nodes will reject this transaction if key reuse is detected)"
        );
        Ok(Signed {
            public_key: self.keys.public_key,
            fee: self.fee,
            outputs: self.outputs,
            ots: index,
            digest,
            signature,
        })
    }
}

impl Signed {
    pub fn digest(&self) -> &Hash32 {
        &self.digest
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn bind(self) -> HashBound {
        let hash = bind_hash(&self.digest, &self.signature, &self.public_key);
        let record = SignedTransaction {
            hash: hex::encode(hash),
            signature: self.signature,
            public_key: self.public_key,
            amounts: self.outputs.iter().map(|o| o.amount).collect(),
            fee: self.fee,
            ots: self.ots,
            addrs_to: self.outputs.iter().map(|o| o.to.as_bytes().to_vec()).collect(),
        };
        HashBound { record }
    }
}

impl HashBound {
    pub fn record(&self) -> &SignedTransaction {
        &self.record
    }

    /// Write the record. On failure the index stays spent and the run has to
    /// be repeated with a fresh one.
    pub fn persist(self, path: &Path) -> Result<SignedTransaction> {
        self.record.write(path)?;
        tracing::info!(path = %path.display(), "transaction written");
        Ok(self.record)
    }
}
