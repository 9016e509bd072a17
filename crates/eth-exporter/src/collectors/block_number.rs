//! Current head block number.

use std::sync::Arc;

use alloy_provider::Provider;
use async_trait::async_trait;

use super::Collector;
use crate::metrics::{Desc, Sample};

const BLOCK_NUMBER: Desc = Desc {
    name: "eth_block_number",
    help: "the number of most recent block",
    labels: &[],
};

/// Reports the node's current block number as a gauge.
#[derive(Debug)]
pub struct BlockNumberCollector<P> {
    provider: Arc<P>,
}

impl<P> BlockNumberCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for BlockNumberCollector<P> {
    fn name(&self) -> &'static str {
        "block_number"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![BLOCK_NUMBER]
    }

    async fn collect(&self) -> Vec<Sample> {
        match self.provider.get_block_number().await {
            Ok(number) => vec![Sample::gauge(BLOCK_NUMBER, vec![], number as f64)],
            Err(e) => {
                vec![Sample::invalid(BLOCK_NUMBER, format!("failed to get block number: {e}"))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_provider::ProviderBuilder;
    use axum::{Json, Router, routing::post};

    use super::*;

    async fn rpc_handler(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
        let id = body.get("id").cloned().unwrap_or_else(|| serde_json::json!(1));
        Json(serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": "0x10" }))
    }

    #[tokio::test]
    async fn reports_block_number_gauge() {
        let app = Router::new().route("/", post(rpc_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(format!("http://{addr}").parse().unwrap());
        let collector = BlockNumberCollector::new(Arc::new(provider));

        let samples = collector.collect().await;
        assert_eq!(samples, vec![Sample::gauge(BLOCK_NUMBER, vec![], 16.0)]);
    }

    #[tokio::test]
    async fn unreachable_node_yields_invalid_sample() {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http("http://127.0.0.1:1".parse().unwrap());
        let collector = BlockNumberCollector::new(Arc::new(provider));

        let samples = collector.collect().await;
        assert!(matches!(&samples[0], Sample::Invalid { message, .. }
            if message.contains("failed to get block number")));
    }
}
