//! OTS index ledger.
//!
//! XMSS leaves are one-time: signing twice at the same index leaks key
//! material. The signer itself keeps no state between runs, so reuse
//! detection is delegated to an optional ledger that is consulted before
//! signing and updated as soon as a signature exists, whether or not the
//! record is written afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SignerError};

pub trait OtsLedger {
    /// Fails with [`SignerError::OtsIndexReused`] if `index` was already recorded for `public_key`.
    fn check(&self, public_key: &[u8], index: u32) -> Result<()>;
    fn record(&mut self, public_key: &[u8], index: u32) -> Result<()>;
}

/// No reuse tracking; the operator is responsible for index hygiene.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLedger;

impl OtsLedger for NoLedger {
    fn check(&self, _public_key: &[u8], _index: u32) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, _public_key: &[u8], _index: u32) -> Result<()> {
        Ok(())
    }
}

/// JSON file mapping hex public key to the set of consumed indices.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    used: BTreeMap<String, BTreeSet<u32>>,
}

impl FileLedger {
    /// Opens `path`, treating a missing file as an empty ledger.
    pub fn open(path: &Path) -> Result<Self> {
        let used = match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(SignerError::io(path, e)),
        };
        Ok(Self { path: path.to_path_buf(), used })
    }

    pub fn used(&self, public_key: &[u8]) -> Option<&BTreeSet<u32>> {
        self.used.get(&hex::encode(public_key))
    }

    fn persist(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| SignerError::io(dir, e))?;
        }
        let data = serde_json::to_string_pretty(&self.used)?;
        fs::write(&self.path, data).map_err(|e| SignerError::io(&self.path, e))
    }
}

impl OtsLedger for FileLedger {
    fn check(&self, public_key: &[u8], index: u32) -> Result<()> {
        match self.used(public_key) {
            Some(set) if set.contains(&index) => Err(SignerError::OtsIndexReused(index)),
            _ => Ok(()),
        }
    }

    fn record(&mut self, public_key: &[u8], index: u32) -> Result<()> {
        self.used.entry(hex::encode(public_key)).or_default().insert(index);
        self.persist()?;
        tracing::debug!(index, ledger = %self.path.display(), "ots index recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ledger_never_objects() {
        let mut l = NoLedger;
        l.record(b"pk", 1).unwrap();
        l.check(b"pk", 1).unwrap();
    }

    #[test]
    fn file_ledger_detects_reuse_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let mut l = FileLedger::open(&path).unwrap();
        l.check(b"pk-a", 5).unwrap();
        l.record(b"pk-a", 5).unwrap();
        assert!(matches!(l.check(b"pk-a", 5), Err(SignerError::OtsIndexReused(5))));

        let reopened = FileLedger::open(&path).unwrap();
        assert!(matches!(reopened.check(b"pk-a", 5), Err(SignerError::OtsIndexReused(5))));
        reopened.check(b"pk-a", 6).unwrap();
        reopened.check(b"pk-b", 5).unwrap();
    }

    #[test]
    fn corrupt_ledger_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(FileLedger::open(&path), Err(SignerError::Json(_))));
    }
}
