//! Timestamp of the latest block.

use std::sync::Arc;

use alloy_eips::BlockNumberOrTag;
use alloy_provider::Provider;
use async_trait::async_trait;

use super::Collector;
use crate::metrics::{Desc, Sample};

const BLOCK_TIMESTAMP: Desc = Desc {
    name: "eth_block_timestamp",
    help: "timestamp of the most recent block",
    labels: &[],
};

/// Reports the latest block's timestamp as a gauge.
#[derive(Debug)]
pub struct BlockTimestampCollector<P> {
    provider: Arc<P>,
}

impl<P> BlockTimestampCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for BlockTimestampCollector<P> {
    fn name(&self) -> &'static str {
        "block_timestamp"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![BLOCK_TIMESTAMP]
    }

    async fn collect(&self) -> Vec<Sample> {
        let sample = match self.provider.get_block_by_number(BlockNumberOrTag::Latest).await {
            Ok(Some(block)) => {
                Sample::gauge(BLOCK_TIMESTAMP, vec![], block.header.timestamp as f64)
            }
            Ok(None) => Sample::invalid(BLOCK_TIMESTAMP, "latest block not available"),
            Err(e) => Sample::invalid(BLOCK_TIMESTAMP, format!("failed to get latest block: {e}")),
        };
        vec![sample]
    }
}
