//! Error kinds for the offline signing pipeline.
//!
//! Every failure is fatal to a run: the first error found is returned and
//! nothing after it is evaluated.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which seed encoding a length check was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedForm {
    HexSeed,
    Mnemonic,
}

impl fmt::Display for SeedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedForm::HexSeed => f.write_str("Hexseed"),
            SeedForm::Mnemonic => f.write_str("Mnemonic phrase"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("use either recipient (-r) *or* object containing multiple recipients (-j) *or* JSON file (-R)")]
    ConflictingInput,

    #[error("no recipients")]
    MissingOutputs,

    #[error("-s flag is redundant where JSON used as all values are in Shor")]
    ConflictingFlag,

    #[error("json contains invalid output data ({0})")]
    MalformedJson(String),

    #[error("No transactions found: length of array is 0")]
    EmptyOutputs,

    #[error("Output #{index} {reason}")]
    InvalidOutputEntry { index: usize, reason: String },

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: &'static str },

    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("{form} invalid: too short (got {found})")]
    SeedTooShort { form: SeedForm, found: usize },

    #[error("seed invalid: {0}")]
    InvalidSeed(String),

    #[error("unsupported descriptor: {0}")]
    UnsupportedDescriptor(String),

    #[error("mnemonic wordlist: {0}")]
    Wordlist(String),

    #[error("Unable to open wallet file: {0}")]
    WalletDecrypt(&'static str),

    #[error("no wallet json file or hexseed specified")]
    MissingSignerMaterial,

    #[error("Fee is invalid ({0:?})")]
    InvalidFee(String),

    #[error("OTS key is invalid ({0})")]
    InvalidOtsIndex(String),

    #[error("OTS key {0} has already been used with this public key")]
    OtsIndexReused(u32),

    #[error("signing provider initialisation failed: {0}")]
    ProviderInit(String),

    #[error("key derivation task failed: {0}")]
    KeyDerivation(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl SignerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SignerError::Io { path: path.into(), source }
    }

    pub(crate) fn entry(index: usize, reason: impl Into<String>) -> Self {
        SignerError::InvalidOutputEntry { index, reason: reason.into() }
    }
}

pub type Result<T, E = SignerError> = std::result::Result<T, E>;
