//! Connected peer count via the standard `net_peerCount` call.

use std::sync::Arc;

use alloy_primitives::U64;
use alloy_provider::Provider;
use async_trait::async_trait;

use super::Collector;
use crate::metrics::{Desc, Sample};

const NET_PEERS: Desc = Desc {
    name: "net_peers",
    help: "number of peers currently connected to the client",
    labels: &[],
};

/// Reports the number of connected peers as a gauge.
#[derive(Debug)]
pub struct PeerCountCollector<P> {
    provider: Arc<P>,
}

impl<P> PeerCountCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for PeerCountCollector<P> {
    fn name(&self) -> &'static str {
        "peer_count"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![NET_PEERS]
    }

    async fn collect(&self) -> Vec<Sample> {
        let request = self.provider.client().request_noparams::<U64>("net_peerCount");
        match request.await {
            Ok(count) => vec![Sample::gauge(NET_PEERS, vec![], count.to::<u64>() as f64)],
            Err(e) => vec![Sample::invalid(NET_PEERS, format!("failed to get peer count: {e}"))],
        }
    }
}
