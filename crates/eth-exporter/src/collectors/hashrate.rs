//! Mining hashrate.

use std::sync::Arc;

use alloy_primitives::U64;
use alloy_provider::Provider;
use async_trait::async_trait;

use super::Collector;
use crate::metrics::{Desc, Sample};

const HASHRATE: Desc = Desc {
    name: "eth_hashrate",
    help: "the number of hashes per second that the node is mining with",
    labels: &[],
};

/// Reports the node's mining hashrate as a gauge. Zero on non-mining nodes.
#[derive(Debug)]
pub struct HashrateCollector<P> {
    provider: Arc<P>,
}

impl<P> HashrateCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for HashrateCollector<P> {
    fn name(&self) -> &'static str {
        "hashrate"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![HASHRATE]
    }

    async fn collect(&self) -> Vec<Sample> {
        let request = self.provider.client().request_noparams::<U64>("eth_hashrate");
        match request.await {
            Ok(rate) => vec![Sample::gauge(HASHRATE, vec![], rate.to::<u64>() as f64)],
            Err(e) => vec![Sample::invalid(HASHRATE, format!("failed to get hashrate: {e}"))],
        }
    }
}
