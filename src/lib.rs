//! QRL offline transaction signer
//!
//! Turns payment outputs into a signed, network-ready transfer record without
//! contacting a node:
//! - outputs: recipient input shapes, address and amount validation
//! - wallet: wallet files, password decryption, hexseed/mnemonic keys
//! - preimage: canonical fee/output byte layout hashed for signing
//! - signing: XMSS signing state machine and provider readiness
//! - tx: signed record, its JSON file form and offline verification
//! - ots_ledger: optional guard against OTS index reuse

#![forbid(unsafe_code)]

pub mod address;
pub mod amount;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod ots_ledger;
pub mod outputs;
pub mod pipeline;
pub mod preimage;
pub mod signing;
pub mod tx;
pub mod wallet;

// Re-export main types for convenience
pub use address::RawAddress;
pub use error::{Result, SeedForm, SignerError};
pub use ots_ledger::{FileLedger, NoLedger, OtsLedger};
pub use outputs::{Output, OutputRequest, OutputSource};
pub use pipeline::{Prepared, SignRequest};
pub use signing::SigningProvider;
pub use tx::SignedTransaction;
pub use wallet::{KeyResolver, SignerSource, WalletKeys, WalletRecord};
