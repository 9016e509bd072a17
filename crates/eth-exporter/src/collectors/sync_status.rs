//! Sync progress of the node.
//!
//! `eth_syncing` answers `false` when the node is in sync and a progress
//! object while it imports, so the response has to be sniffed before parsing.

use std::sync::Arc;

use alloy_primitives::U64;
use alloy_provider::Provider;
use async_trait::async_trait;
use serde::Deserialize;

use super::Collector;
use crate::metrics::{Desc, Sample};

const SYNC_STARTING: Desc = Desc {
    name: "eth_sync_starting",
    help: "the block at which the import started",
    labels: &[],
};

const SYNC_CURRENT: Desc = Desc {
    name: "eth_sync_current",
    help: "the number of most recent block",
    labels: &[],
};

const SYNC_HIGHEST: Desc = Desc {
    name: "eth_sync_highest",
    help: "the estimated highest block",
    labels: &[],
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncProgress {
    starting_block: U64,
    current_block: U64,
    highest_block: U64,
}

/// Reports sync progress as three gauges while the node is importing.
#[derive(Debug)]
pub struct SyncStatusCollector<P> {
    provider: Arc<P>,
}

impl<P> SyncStatusCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for SyncStatusCollector<P> {
    fn name(&self) -> &'static str {
        "sync_status"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![SYNC_STARTING, SYNC_CURRENT, SYNC_HIGHEST]
    }

    async fn collect(&self) -> Vec<Sample> {
        let request = self.provider.client().request_noparams::<serde_json::Value>("eth_syncing");
        let raw = match request.await {
            Ok(raw) => raw,
            Err(e) => return invalid_all(&format!("failed to get sync status: {e}")),
        };

        if raw.is_boolean() {
            return invalid_all("not syncing");
        }

        let progress: SyncProgress = match serde_json::from_value(raw) {
            Ok(progress) => progress,
            Err(e) => return invalid_all(&format!("unexpected sync status: {e}")),
        };

        vec![
            Sample::gauge(SYNC_STARTING, vec![], progress.starting_block.to::<u64>() as f64),
            Sample::gauge(SYNC_CURRENT, vec![], progress.current_block.to::<u64>() as f64),
            Sample::gauge(SYNC_HIGHEST, vec![], progress.highest_block.to::<u64>() as f64),
        ]
    }
}

fn invalid_all(message: &str) -> Vec<Sample> {
    vec![
        Sample::invalid(SYNC_STARTING, message),
        Sample::invalid(SYNC_CURRENT, message),
        Sample::invalid(SYNC_HIGHEST, message),
    ]
}

#[cfg(test)]
mod tests {
    use alloy_provider::ProviderBuilder;
    use axum::{Json, Router, routing::post};

    use super::*;

    async fn spawn_rpc(result: serde_json::Value) -> std::net::SocketAddr {
        let app = Router::new().route(
            "/",
            post(move |Json(body): Json<serde_json::Value>| {
                let result = result.clone();
                async move {
                    let id = body.get("id").cloned().unwrap_or_else(|| serde_json::json!(1));
                    Json(serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    async fn collect_from(addr: std::net::SocketAddr) -> Vec<Sample> {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(format!("http://{addr}").parse().unwrap());
        SyncStatusCollector::new(Arc::new(provider)).collect().await
    }

    #[tokio::test]
    async fn synced_node_yields_three_invalids() {
        let addr = spawn_rpc(serde_json::json!(false)).await;
        let samples = collect_from(addr).await;

        assert_eq!(samples.len(), 3);
        for sample in &samples {
            assert!(matches!(sample, Sample::Invalid { message, .. } if message == "not syncing"));
        }
    }

    #[tokio::test]
    async fn syncing_node_yields_progress_gauges() {
        let addr = spawn_rpc(serde_json::json!({
            "startingBlock": "0x64",
            "currentBlock": "0xc8",
            "highestBlock": "0x12c",
        }))
        .await;
        let samples = collect_from(addr).await;

        assert_eq!(
            samples,
            vec![
                Sample::gauge(SYNC_STARTING, vec![], 100.0),
                Sample::gauge(SYNC_CURRENT, vec![], 200.0),
                Sample::gauge(SYNC_HIGHEST, vec![], 300.0),
            ]
        );
    }
}
