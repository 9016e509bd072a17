//! Metric collector trait and implementations.
//!
//! Each collector owns one metric family (or a small related group) and
//! produces fresh samples on every scrape of the metrics endpoint.

use async_trait::async_trait;

use crate::metrics::{Desc, Sample};

/// A metric collector queries the node and emits samples on demand.
///
/// `collect` never returns an error: a failed query is reported as a
/// [`Sample::Invalid`] so the rest of the scrape can proceed.
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Human-readable name, used in error logs.
    fn name(&self) -> &'static str;

    /// Every metric family this collector can emit.
    fn describe(&self) -> Vec<Desc>;

    /// Produce the samples for one scrape.
    async fn collect(&self) -> Vec<Sample>;
}

pub mod balance;
pub mod block_number;
pub mod block_timestamp;
pub mod block_transactions;
pub mod erc20_transfers;
pub mod gas_price;
pub mod hashrate;
pub mod peer_count;
pub mod peers;
pub mod sync_status;
