//! Transfer scan targets and their on-chain metadata.

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use tracing::info;

use crate::{
    bindings::ERC20,
    error::{SourceError, TargetResolveError},
    source::ChainSource,
    utils::TargetEntry,
};

/// A token contract whose `Transfer` events are scanned.
#[derive(Debug, Clone)]
pub struct Target {
    pub address: Address,
    /// Operator-chosen name from configuration.
    pub name: String,
    /// `symbol()` as reported by the contract.
    pub symbol: String,
    /// `decimals()` as reported by the contract.
    pub decimals: u8,
}

/// Resolves `symbol()` and `decimals()` for every configured entry.
///
/// Fail-fast: the first unresolvable entry aborts resolution, so a typo'd
/// address is caught at startup instead of producing a dead series.
pub async fn resolve_targets<S: ChainSource>(
    source: &S,
    entries: &[TargetEntry],
) -> Result<Vec<Target>, TargetResolveError> {
    let mut targets = Vec::with_capacity(entries.len());
    for entry in entries {
        let symbol = fetch_symbol(source, entry.address).await?;
        let decimals = fetch_decimals(source, entry.address).await?;
        info!(
            address = %entry.address,
            name = %entry.name,
            symbol = %symbol,
            decimals,
            "resolved transfer target"
        );
        targets.push(Target {
            address: entry.address,
            name: entry.name.clone(),
            symbol,
            decimals,
        });
    }
    Ok(targets)
}

async fn fetch_symbol<S: ChainSource>(
    source: &S,
    address: Address,
) -> Result<String, TargetResolveError> {
    let ret = source
        .call(address, ERC20::symbolCall {}.abi_encode().into())
        .await
        .map_err(|source| TargetResolveError::Symbol { address, source })?;
    ERC20::symbolCall::abi_decode_returns(&ret)
        .map_err(|e| TargetResolveError::Symbol { address, source: SourceError::Decode(e) })
}

async fn fetch_decimals<S: ChainSource>(
    source: &S,
    address: Address,
) -> Result<u8, TargetResolveError> {
    let ret = source
        .call(address, ERC20::decimalsCall {}.abi_encode().into())
        .await
        .map_err(|source| TargetResolveError::Decimals { address, source })?;
    ERC20::decimalsCall::abi_decode_returns(&ret)
        .map_err(|e| TargetResolveError::Decimals { address, source: SourceError::Decode(e) })
}
