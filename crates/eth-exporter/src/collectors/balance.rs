//! Wallet balance.

use std::sync::Arc;

use alloy_primitives::Address;
use alloy_provider::Provider;
use async_trait::async_trait;

use super::Collector;
use crate::{
    metrics::{Desc, Sample},
    utils::scale_amount,
};

const BALANCE: Desc = Desc {
    name: "eth_get_balance",
    help: "get balance",
    labels: &[],
};

/// Reports the configured wallet's balance, in wei, as a gauge.
///
/// Only registered when a wallet address is configured.
#[derive(Debug)]
pub struct BalanceCollector<P> {
    provider: Arc<P>,
    address: Address,
}

impl<P> BalanceCollector<P> {
    pub const fn new(provider: Arc<P>, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for BalanceCollector<P> {
    fn name(&self) -> &'static str {
        "balance"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![BALANCE]
    }

    async fn collect(&self) -> Vec<Sample> {
        match self.provider.get_balance(self.address).await {
            Ok(wei) => vec![Sample::gauge(BALANCE, vec![], scale_amount(wei, 0))],
            Err(e) => vec![Sample::invalid(
                BALANCE,
                format!("failed to get balance of {}: {e}", self.address),
            )],
        }
    }
}
