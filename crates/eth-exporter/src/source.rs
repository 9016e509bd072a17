//! Chain access capability: the three outbound operations the collectors
//! consume, plus the alloy-backed production implementation.

use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, TransactionRequest};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;

use crate::{bindings::ERC20, error::SourceError};

/// One decoded ERC-20 `Transfer` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Read-only chain access used by the transfer-event collector.
///
/// `block_number` and `transfer_logs` are queried on every pass; `call` is
/// used only at construction time to resolve token metadata. Implementations
/// must be safe to share across concurrent per-target tasks.
#[async_trait]
pub trait ChainSource: Send + Sync + 'static {
    /// Current chain head height.
    async fn block_number(&self) -> Result<u64, SourceError>;

    /// Decoded `Transfer` events emitted by `token` in the inclusive block
    /// range `[from_block, to_block]`.
    async fn transfer_logs(
        &self,
        token: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawTransfer>, SourceError>;

    /// Read-only contract call, returning the raw ABI-encoded result.
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, SourceError>;
}

/// [`ChainSource`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct RpcSource<P> {
    provider: P,
}

impl<P> RpcSource<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> ChainSource for RpcSource<P> {
    async fn block_number(&self) -> Result<u64, SourceError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn transfer_logs(
        &self,
        token: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawTransfer>, SourceError> {
        let filter = Filter::new()
            .address(token)
            .event_signature(ERC20::Transfer::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.provider.get_logs(&filter).await?;

        let mut transfers = Vec::with_capacity(logs.len());
        for log in &logs {
            let event = log.log_decode::<ERC20::Transfer>()?.inner.data;
            transfers.push(RawTransfer {
                from: event.from,
                to: event.to,
                amount: event.value,
            });
        }
        Ok(transfers)
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, SourceError> {
        let tx = TransactionRequest::default().to(to).input(calldata.into());
        Ok(self.provider.call(tx).await?)
    }
}
