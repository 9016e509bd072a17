//! Current gas price.

use std::sync::Arc;

use alloy_provider::Provider;
use async_trait::async_trait;

use super::Collector;
use crate::metrics::{Desc, Sample};

const GAS_PRICE: Desc = Desc {
    name: "eth_gas_price",
    help: "current gas price in wei",
    labels: &[],
};

/// Reports the node's suggested gas price, in wei, as a gauge.
#[derive(Debug)]
pub struct GasPriceCollector<P> {
    provider: Arc<P>,
}

impl<P> GasPriceCollector<P> {
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> Collector for GasPriceCollector<P> {
    fn name(&self) -> &'static str {
        "gas_price"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![GAS_PRICE]
    }

    async fn collect(&self) -> Vec<Sample> {
        match self.provider.get_gas_price().await {
            Ok(price) => vec![Sample::gauge(GAS_PRICE, vec![], price as f64)],
            Err(e) => vec![Sample::invalid(GAS_PRICE, format!("failed to get gas price: {e}"))],
        }
    }
}
