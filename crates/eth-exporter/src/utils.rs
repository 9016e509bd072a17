//! Small shared helpers.

use alloy_primitives::{Address, U256};
use anyhow::{Context, bail};

/// A `name|0xaddress` pair from configuration, before on-chain metadata is
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub name: String,
    pub address: Address,
}

/// Parses repeated `name|0xaddress` flag values into target entries.
pub fn parse_targets(raw: &[String]) -> anyhow::Result<Vec<TargetEntry>> {
    let mut entries = Vec::with_capacity(raw.len());
    for value in raw {
        let parts: Vec<&str> = value.split('|').collect();
        if parts.len() != 2 {
            bail!("invalid target '{value}', expected 'name|0xaddress'");
        }
        if parts[0].is_empty() {
            bail!("invalid target '{value}', name must not be empty");
        }
        let address: Address = parts[1]
            .parse()
            .with_context(|| format!("invalid address in target '{value}'"))?;
        entries.push(TargetEntry { name: parts[0].to_string(), address });
    }
    Ok(entries)
}

/// Convert a raw token amount to an `f64` in whole-token units.
///
/// Amounts above `u128::MAX` saturate before the division. For very large
/// values this loses precision, but it is sufficient for metric reporting.
pub fn scale_amount(amount: U256, decimals: u8) -> f64 {
    u128::try_from(amount).unwrap_or(u128::MAX) as f64 / 10_f64.powi(decimals as i32)
}
