//! Transfer outputs: input-shape resolution, validation and normalisation.
//!
//! Exactly one input shape is accepted per run:
//! - a single recipient with a quantity (Quanta, or Shor with `--shor`)
//! - an inline JSON object `{"tx": [{"to": ..., "shor": ...}, ...]}`
//! - a file containing the same JSON object
//!
//! JSON forms are always in Shor. Validation stops at the first bad entry.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::address::{self, RawAddress};
use crate::amount;
use crate::error::{Result, SignerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub to: RawAddress,
    /// Shor.
    pub amount: u64,
}

/// Raw, possibly conflicting, user input.
#[derive(Debug, Clone, Default)]
pub struct OutputRequest {
    pub recipient: Option<String>,
    pub quantity: Option<String>,
    pub shor: bool,
    pub json_object: Option<String>,
    pub file: Option<PathBuf>,
}

/// The single input shape selected from an [`OutputRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSource<'a> {
    Single { recipient: &'a str, quantity: &'a str, shor: bool },
    JsonObject(&'a str),
    JsonFile(&'a Path),
}

impl OutputRequest {
    pub fn source(&self) -> Result<OutputSource<'_>> {
        let supplied = [self.recipient.is_some(), self.json_object.is_some(), self.file.is_some()]
            .iter()
            .filter(|s| **s)
            .count();
        match supplied {
            0 => return Err(SignerError::MissingOutputs),
            1 => {}
            _ => return Err(SignerError::ConflictingInput),
        }
        if self.shor && (self.json_object.is_some() || self.file.is_some()) {
            return Err(SignerError::ConflictingFlag);
        }

        if let Some(recipient) = &self.recipient {
            let quantity = self.quantity.as_deref().ok_or_else(|| SignerError::InvalidAmount(String::new()))?;
            return Ok(OutputSource::Single { recipient, quantity, shor: self.shor });
        }
        if let Some(json) = &self.json_object {
            return Ok(OutputSource::JsonObject(json));
        }
        match &self.file {
            Some(path) => Ok(OutputSource::JsonFile(path)),
            None => Err(SignerError::MissingOutputs),
        }
    }

    pub fn build(&self) -> Result<Vec<Output>> {
        build(&self.source()?)
    }
}

pub fn build(source: &OutputSource<'_>) -> Result<Vec<Output>> {
    let outputs = match source {
        OutputSource::Single { recipient, quantity, shor } => {
            let to = address::decode(recipient)?;
            let amount = if *shor { amount::parse_shor(quantity)? } else { amount::quanta_to_shor(quantity)? };
            vec![Output { to, amount }]
        }
        OutputSource::JsonObject(text) => parse_tx_json(text)?,
        OutputSource::JsonFile(path) => {
            let text = fs::read_to_string(path).map_err(|e| SignerError::io(*path, e))?;
            parse_tx_json(&text)?
        }
    };
    for (i, o) in outputs.iter().enumerate() {
        tracing::debug!(index = i, to = %o.to, shor = o.amount, "output");
    }
    Ok(outputs)
}

/// Parse and validate `{"tx": [...]}`.
pub fn parse_tx_json(text: &str) -> Result<Vec<Output>> {
    let doc: Value = serde_json::from_str(text).map_err(|e| SignerError::MalformedJson(e.to_string()))?;
    let entries = match doc.get("tx") {
        Some(Value::Array(a)) => a,
        Some(_) => return Err(SignerError::MalformedJson("\"tx\" is not an array".into())),
        None => return Err(SignerError::MalformedJson("array is undefined".into())),
    };
    if entries.is_empty() {
        return Err(SignerError::EmptyOutputs);
    }
    entries.iter().enumerate().map(|(i, e)| parse_entry(i, e)).collect()
}

fn parse_entry(index: usize, entry: &Value) -> Result<Output> {
    let to = match entry.get("to") {
        Some(Value::String(s)) => s,
        Some(_) | None => return Err(SignerError::entry(index, "does not have a 'to' key")),
    };
    let to = address::decode(to).map_err(|_| SignerError::entry(index, "does not contain a valid QRL address"))?;

    let amount = match entry.get("shor") {
        Some(Value::String(s)) => amount::parse_shor(s).ok(),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::Null) | None => return Err(SignerError::entry(index, "does not have a 'shor' key")),
        Some(_) => None,
    };
    let amount = amount.ok_or_else(|| SignerError::entry(index, "has an invalid 'shor' amount"))?;
    Ok(Output { to, amount })
}
