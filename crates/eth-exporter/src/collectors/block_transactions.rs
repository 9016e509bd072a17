//! Transaction counts of the earliest, latest, and pending blocks.

use std::sync::Arc;

use alloy_primitives::U64;
use alloy_provider::Provider;
use alloy_transport::TransportError;
use async_trait::async_trait;

use super::Collector;
use crate::metrics::{Desc, Sample};

const EARLIEST_BLOCK_TXS: Desc = Desc {
    name: "eth_earliest_block_transactions",
    help: "the number of transactions in an earliest block",
    labels: &[],
};

const LATEST_BLOCK_TXS: Desc = Desc {
    name: "eth_latest_block_transactions",
    help: "the number of transactions in a latest block",
    labels: &[],
};

const PENDING_BLOCK_TXS: Desc = Desc {
    name: "eth_pending_block_transactions",
    help: "the number of transactions in a pending block",
    labels: &[],
};

/// Reports per-tag block transaction counts as gauges. The three lookups run
/// concurrently and fail independently.
#[derive(Debug)]
pub struct BlockTransactionsCollector<P> {
    provider: Arc<P>,
}

impl<P> BlockTransactionsCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: Provider + Send + Sync + 'static> BlockTransactionsCollector<P> {
    async fn transaction_count(&self, tag: &'static str) -> Result<u64, TransportError> {
        let count: U64 = self
            .provider
            .client()
            .request("eth_getBlockTransactionCountByNumber", (tag,))
            .await?;
        Ok(count.to::<u64>())
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for BlockTransactionsCollector<P> {
    fn name(&self) -> &'static str {
        "block_transactions"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![EARLIEST_BLOCK_TXS, LATEST_BLOCK_TXS, PENDING_BLOCK_TXS]
    }

    async fn collect(&self) -> Vec<Sample> {
        let (earliest, latest, pending) = tokio::join!(
            self.transaction_count("earliest"),
            self.transaction_count("latest"),
            self.transaction_count("pending"),
        );

        vec![
            count_sample(EARLIEST_BLOCK_TXS, "earliest", earliest),
            count_sample(LATEST_BLOCK_TXS, "latest", latest),
            count_sample(PENDING_BLOCK_TXS, "pending", pending),
        ]
    }
}

fn count_sample(desc: Desc, tag: &str, outcome: Result<u64, TransportError>) -> Sample {
    match outcome {
        Ok(count) => Sample::gauge(desc, vec![], count as f64),
        Err(e) => {
            Sample::invalid(desc, format!("failed to get {tag} block transaction count: {e}"))
        }
    }
}
