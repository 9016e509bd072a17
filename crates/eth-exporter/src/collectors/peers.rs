//! Peer counts via the OpenEthereum `parity_netPeers` call.

use std::sync::Arc;

use alloy_provider::Provider;
use async_trait::async_trait;
use serde::Deserialize;

use super::Collector;
use crate::metrics::{Desc, Sample};

const ACTIVE_PEERS: Desc = Desc {
    name: "parity_net_active_peers",
    help: "number of active peers",
    labels: &[],
};

const CONNECTED_PEERS: Desc = Desc {
    name: "parity_net_connected_peers",
    help: "number of peers currently connected to this client",
    labels: &[],
};

#[derive(Debug, Deserialize)]
struct PeerCounts {
    active: u64,
    connected: u64,
}

/// Reports active and connected peer counts. Fails on nodes without the
/// `parity` namespace.
#[derive(Debug)]
pub struct PeersCollector<P> {
    provider: Arc<P>,
}

impl<P> PeersCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for PeersCollector<P> {
    fn name(&self) -> &'static str {
        "peers"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![ACTIVE_PEERS, CONNECTED_PEERS]
    }

    async fn collect(&self) -> Vec<Sample> {
        let request = self.provider.client().request_noparams::<PeerCounts>("parity_netPeers");
        match request.await {
            Ok(counts) => vec![
                Sample::gauge(ACTIVE_PEERS, vec![], counts.active as f64),
                Sample::gauge(CONNECTED_PEERS, vec![], counts.connected as f64),
            ],
            Err(e) => {
                let message =
                    format!("parity metrics are only available in OpenEthereum: {e}");
                vec![
                    Sample::invalid(ACTIVE_PEERS, &message),
                    Sample::invalid(CONNECTED_PEERS, message),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_provider::ProviderBuilder;
    use axum::{Json, Router, routing::post};

    use super::*;

    #[tokio::test]
    async fn reports_peer_count_gauges() {
        async fn rpc_handler(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
            let id = body.get("id").cloned().unwrap_or_else(|| serde_json::json!(1));
            Json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "active": 29, "connected": 25, "max": 50 }
            }))
        }

        let app = Router::new().route("/", post(rpc_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(format!("http://{addr}").parse().unwrap());
        let samples = PeersCollector::new(Arc::new(provider)).collect().await;

        assert_eq!(
            samples,
            vec![
                Sample::gauge(ACTIVE_PEERS, vec![], 29.0),
                Sample::gauge(CONNECTED_PEERS, vec![], 25.0),
            ]
        );
    }

    #[tokio::test]
    async fn missing_namespace_yields_invalids() {
        async fn rpc_handler(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
            let id = body.get("id").cloned().unwrap_or_else(|| serde_json::json!(1));
            Json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "method not found" }
            }))
        }

        let app = Router::new().route("/", post(rpc_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(format!("http://{addr}").parse().unwrap());
        let samples = PeersCollector::new(Arc::new(provider)).collect().await;

        assert_eq!(samples.len(), 2);
        for sample in &samples {
            assert!(matches!(sample, Sample::Invalid { message, .. }
                if message.contains("only available in OpenEthereum")));
        }
    }
}
