//! `sign-tx-offline` orchestration.
//!
//! [`prepare`] runs every check that can fail before key material is touched
//! for signing; the caller shows the resulting outputs to the operator and
//! then calls [`Prepared::sign_and_write`].

use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::crypto::aes256::Aes256CtrCipher;
use crate::error::{Result, SignerError};
use crate::ots_ledger::{FileLedger, NoLedger, OtsLedger};
use crate::outputs::{self, Output, OutputRequest};
use crate::signing::{KeyLoaded, SigningProvider};
use crate::tx::SignedTransaction;
use crate::wallet::{KeyResolver, SignerSource};

/// Raw `sign-tx-offline` input, as typed by the operator.
#[derive(Debug, Clone, Default)]
pub struct SignRequest {
    pub outputs: OutputRequest,
    pub fee: Option<String>,
    pub ots_index: String,
    pub wallet: Option<PathBuf>,
    pub hexseed: Option<Zeroizing<String>>,
    pub password: Option<Zeroizing<String>>,
}

/// Fee in Shor. Zero, negative and non-numeric values are rejected.
pub fn parse_fee(fee: Option<&str>, default: u64) -> Result<u64> {
    let Some(raw) = fee else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(SignerError::InvalidFee(raw.to_string())),
        Ok(v) => Ok(v),
    }
}

pub fn parse_ots_index(index: &str) -> Result<u32> {
    index
        .trim()
        .parse::<u32>()
        .map_err(|e| SignerError::InvalidOtsIndex(format!("{index:?}: {e}")))
}

pub struct Prepared {
    pub outputs: Vec<Output>,
    pub fee: u64,
    pub ots: u32,
    keys: KeyLoaded,
}

impl Prepared {
    pub fn from_address(&self) -> String {
        self.keys.keys().address.to_string()
    }

    /// Signs and writes the record. Once a signature exists the OTS index is
    /// recorded as spent in `ledger`, even if the write then fails.
    pub fn sign_and_write(self, path: &Path, ledger: &mut dyn OtsLedger) -> Result<SignedTransaction> {
        self.keys
            .build_preimage(self.fee, self.outputs)
            .sign(self.ots, ledger)?
            .bind()
            .persist(path)
    }
}

/// Validate every input and load the signing key.
///
/// Checks run in a fixed order and the first failure wins: output shape,
/// signer material, outputs, OTS index, fee, then the key itself.
pub async fn prepare<F>(
    req: &SignRequest,
    default_fee: u64,
    provider: &SigningProvider,
    prompt: F,
) -> Result<Prepared>
where
    F: FnOnce() -> Result<Zeroizing<String>>,
{
    let source = req.outputs.source()?;
    let signer = SignerSource::select(
        req.wallet.as_deref(),
        req.hexseed.as_ref().map(|s| s.as_str()),
        req.password.as_ref().map(|s| s.as_str()),
    )?;
    let outputs = outputs::build(&source)?;
    let ots = parse_ots_index(&req.ots_index)?;
    let fee = parse_fee(req.fee.as_deref(), default_fee)?;

    let ready = provider.ready().await?;
    let material = KeyResolver::new(&Aes256CtrCipher, ready.wordlist()).material(signer, prompt)?;
    let keys = tokio::task::spawn_blocking(move || material.derive())
        .await
        .map_err(|e| SignerError::KeyDerivation(e.to_string()))??;
    tracing::debug!(outputs = outputs.len(), fee, ots, "inputs validated");

    Ok(Prepared { outputs, fee, ots, keys: KeyLoaded::new(keys) })
}

/// Ledger selected by configuration.
pub fn open_ledger(path: Option<&Path>) -> Result<Box<dyn OtsLedger>> {
    match path {
        Some(p) => Ok(Box::new(FileLedger::open(p)?)),
        None => Ok(Box::new(NoLedger)),
    }
}
