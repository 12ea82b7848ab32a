//! Quanta (display unit) to Shor (base unit) conversion.

use crate::error::{Result, SignerError};

/// Shor per Quanta.
pub const SHOR_PER_QUANTA: u64 = 1_000_000_000;
const DECIMALS: usize = 9;

/// Base-unit integer string, e.g. `"1000000000"`.
pub fn parse_shor(s: &str) -> Result<u64> {
    let t = s.trim();
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SignerError::InvalidAmount(s.to_string()));
    }
    t.parse::<u64>().map_err(|_| SignerError::InvalidAmount(s.to_string()))
}

/// Decimal Quanta amount scaled by 10^9. Digits past the ninth decimal are
/// truncated toward zero.
pub fn quanta_to_shor(s: &str) -> Result<u64> {
    let invalid = || SignerError::InvalidAmount(s.to_string());
    let t = s.trim();
    let (whole, frac) = match t.split_once('.') {
        Some((w, f)) => (w, f),
        None => (t, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(frac) {
        return Err(invalid());
    }
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };

    let kept = &frac[..frac.len().min(DECIMALS)];
    if frac.len() > DECIMALS {
        tracing::warn!(amount = s, "precision below 1 Shor truncated");
    }
    let mut frac_shor: u64 = if kept.is_empty() { 0 } else { kept.parse().map_err(|_| invalid())? };
    for _ in kept.len()..DECIMALS {
        frac_shor *= 10;
    }

    whole
        .checked_mul(SHOR_PER_QUANTA)
        .and_then(|w| w.checked_add(frac_shor))
        .ok_or_else(invalid)
}
