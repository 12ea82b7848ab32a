//! Signed transfer record and its on-disk JSON form.
//!
//! Byte fields are written in the Node `Buffer` JSON shape
//! (`{"type":"Buffer","data":[...]}`) and amounts as decimal strings, which is
//! what the broadcast tooling reads back.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::RawAddress;
use crate::crypto::xmss;
use crate::error::{Result, SignerError};
use crate::outputs::Output;
use crate::preimage;
use crate::signing::{bind_hash, digest};

/* ============================================================================
 * Serde helpers
 * ========================================================================== */

mod node_buffer {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Buffer {
        #[serde(rename = "type")]
        kind: String,
        data: Vec<u8>,
    }

    fn buffer(bytes: &[u8]) -> Buffer {
        Buffer { kind: "Buffer".to_string(), data: bytes.to_vec() }
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        buffer(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let b = Buffer::deserialize(d)?;
        if b.kind != "Buffer" {
            return Err(serde::de::Error::custom(format!("expected Buffer, got {:?}", b.kind)));
        }
        Ok(b.data)
    }

    pub mod vec {
        use super::*;

        pub fn serialize<S: Serializer>(items: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
            let bufs: Vec<Buffer> = items.iter().map(|b| buffer(b)).collect();
            bufs.serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
            let bufs: Vec<Buffer> = Vec::deserialize(d)?;
            bufs.into_iter()
                .map(|b| match b.kind.as_str() {
                    "Buffer" => Ok(b.data),
                    other => Err(serde::de::Error::custom(format!("expected Buffer, got {other:?}"))),
                })
                .collect()
        }
    }
}

mod decimal_strings {
    use super::*;

    pub fn serialize<S: Serializer>(amounts: &[u64], s: S) -> Result<S::Ok, S::Error> {
        let strs: Vec<String> = amounts.iter().map(u64::to_string).collect();
        strs.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u64>, D::Error> {
        let strs: Vec<String> = Vec::deserialize(d)?;
        strs.iter()
            .map(|s| s.parse::<u64>().map_err(serde::de::Error::custom))
            .collect()
    }
}

/* ============================================================================
 * Record
 * ========================================================================== */

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Lowercase hex of SHA-256(digest || signature || public_key).
    pub hash: String,
    #[serde(with = "node_buffer")]
    pub signature: Vec<u8>,
    #[serde(with = "node_buffer")]
    pub public_key: Vec<u8>,
    #[serde(with = "decimal_strings")]
    pub amounts: Vec<u64>,
    pub fee: u64,
    pub ots: u32,
    #[serde(with = "node_buffer::vec")]
    pub addrs_to: Vec<Vec<u8>>,
}

impl SignedTransaction {
    pub fn outputs(&self) -> Result<Vec<Output>> {
        if self.addrs_to.len() != self.amounts.len() {
            return Err(SignerError::MalformedJson("addrs_to and amounts differ in length".into()));
        }
        self.addrs_to
            .iter()
            .zip(&self.amounts)
            .map(|(a, &amount)| -> Result<Output> { Ok(Output { to: RawAddress::from_slice(a)?, amount }) })
            .collect()
    }

    /// Rebuild the preimage and check both the signature and the hash binding.
    pub fn verify(&self) -> Result<bool> {
        let preimage = preimage::encode(self.fee, &self.outputs()?);
        let msg_digest = digest(&preimage);
        if !xmss::verify(&msg_digest, &self.signature, &self.public_key) {
            return Ok(false);
        }
        let sig_ots = self.signature.get(..4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]));
        if sig_ots != Some(self.ots) {
            return Ok(false);
        }
        Ok(hex::encode(bind_hash(&msg_digest, &self.signature, &self.public_key)) == self.hash)
    }

    /// Write to `path`, overwriting whatever is there.
    pub fn write(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string(self)?;
        fs::write(path, data).map_err(|e| SignerError::io(path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| SignerError::io(path, e))?;
        Ok(serde_json::from_str(&data)?)
    }
}
