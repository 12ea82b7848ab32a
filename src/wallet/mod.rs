//! Wallet files and signer key resolution

pub mod keys;
pub mod storage;

pub use keys::{KeyMaterial, KeyResolver, SignerSource, WalletKeys};
pub use storage::WalletRecord;
