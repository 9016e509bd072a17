//! Incremental ERC-20 `Transfer` event collector.
//!
//! Keeps a watermark across scrapes. Each pass scans the inclusive block
//! range from the watermark to the current head once per target, emits one
//! count/sum summary per target, then moves the watermark to the head. The
//! head block is scanned again by the next pass, so events land at least once.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::Mutex, task::JoinSet};
use tracing::{debug, error};

use super::Collector;
use crate::{
    aggregate::{Summary, aggregate},
    error::ScanError,
    metrics::{Desc, Sample},
    scanner::LogScanner,
    source::ChainSource,
    targets::Target,
};

pub const TRANSFER_EVENTS: Desc = Desc {
    name: "erc20_transfer_event",
    help: "ERC20 Transfer events count",
    labels: &["contract", "symbol", "address_name"],
};

/// Scans `Transfer` events for a fixed set of token contracts.
pub struct Erc20TransferCollector<S> {
    source: Arc<S>,
    scanner: LogScanner<S>,
    targets: Vec<Target>,
    /// First block of the next pass. Held locked for a whole pass so
    /// concurrent scrapes cannot interleave scans of the same range.
    watermark: Mutex<u64>,
}

impl<S> std::fmt::Debug for Erc20TransferCollector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erc20TransferCollector")
            .field("targets", &self.targets.len())
            .finish()
    }
}

impl<S: ChainSource> Erc20TransferCollector<S> {
    pub fn new(source: Arc<S>, targets: Vec<Target>, start_block: u64, page_span: u64) -> Self {
        Self {
            scanner: LogScanner::new(Arc::clone(&source), page_span),
            source,
            targets,
            watermark: Mutex::new(start_block),
        }
    }
}

#[async_trait]
impl<S: ChainSource> Collector for Erc20TransferCollector<S> {
    fn name(&self) -> &'static str {
        "erc20_transfers"
    }

    fn describe(&self) -> Vec<Desc> {
        vec![TRANSFER_EVENTS]
    }

    async fn collect(&self) -> Vec<Sample> {
        let mut watermark = self.watermark.lock().await;

        let head = match self.source.block_number().await {
            Ok(head) => head,
            Err(e) => {
                error!(error = %e, "failed to get current block number");
                return vec![Sample::invalid(
                    TRANSFER_EVENTS,
                    format!("failed to get current block number: {e}"),
                )];
            }
        };

        // A head behind the watermark means the node answered from a stale or
        // reorged view. Report empty summaries and leave the watermark alone.
        if head < *watermark {
            debug!(head, watermark = *watermark, "head below watermark, skipping scan");
            return self
                .targets
                .iter()
                .map(|target| summary_sample(target, Summary::default()))
                .collect();
        }

        let from = *watermark;
        let mut set = JoinSet::new();
        for target in &self.targets {
            let scanner = self.scanner.clone();
            let target = target.clone();
            set.spawn(async move {
                let outcome = scan_target(&scanner, &target, from, head).await;
                (target, outcome)
            });
        }

        let mut samples = Vec::with_capacity(self.targets.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((target, Ok(summary))) => samples.push(summary_sample(&target, summary)),
                Ok((target, Err(e))) => {
                    error!(
                        contract = %target.address,
                        symbol = %target.symbol,
                        error = %e,
                        "failed to read transfer events"
                    );
                    samples.push(Sample::invalid(
                        TRANSFER_EVENTS,
                        format!(
                            "failed to read transfer events for contract {}: {e}",
                            target.address
                        ),
                    ));
                }
                Err(e) => {
                    error!(error = %e, "transfer scan task failed");
                    samples.push(Sample::invalid(
                        TRANSFER_EVENTS,
                        format!("transfer scan task failed: {e}"),
                    ));
                }
            }
        }

        // Failed targets are reported, not retried: the watermark moves to
        // the head regardless, and the next pass starts there.
        *watermark = head;

        samples
    }
}

async fn scan_target<S: ChainSource>(
    scanner: &LogScanner<S>,
    target: &Target,
    from: u64,
    to: u64,
) -> Result<Summary, ScanError> {
    let mut stream = scanner.scan(target.address, from, to).await?;
    aggregate(&mut stream, target.decimals).await
}

fn summary_sample(target: &Target, summary: Summary) -> Sample {
    Sample::summary(
        TRANSFER_EVENTS,
        vec![target.address.to_string(), target.symbol.clone(), target.name.clone()],
        summary.count,
        summary.sum,
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy_primitives::{Address, U256};

    use super::*;
    use crate::test_helpers::{FakeSource, token_a, token_b, transfer, transfer_amount};

    fn target(address: Address, name: &str, symbol: &str, decimals: u8) -> Target {
        Target {
            address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
        }
    }

    /// Pull `(count, sum)` out of the summary whose symbol label matches.
    fn summary_for(samples: &[Sample], symbol: &str) -> (u64, f64) {
        samples
            .iter()
            .find_map(|sample| match sample {
                Sample::Summary { labels, count, sum, .. } if labels[1] == symbol => {
                    Some((*count, *sum))
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("no summary for {symbol}"))
    }

    #[tokio::test]
    async fn summarizes_each_target_and_advances_watermark() {
        let one_token = U256::from(10).pow(U256::from(18));
        let source = Arc::new(
            FakeSource::new().with_head(100).with_pages(
                token_a(),
                vec![Ok(vec![
                    transfer_amount(one_token),
                    transfer_amount(one_token * U256::from(2)),
                ])],
            ),
        );
        let collector = Erc20TransferCollector::new(
            Arc::clone(&source),
            vec![target(token_a(), "circle", "USDC", 18), target(token_b(), "tether", "USDT", 18)],
            50,
            1_000,
        );

        let samples = collector.collect().await;

        assert_eq!(samples.len(), 2);
        let (count, sum) = summary_for(&samples, "USDC");
        assert_eq!(count, 2);
        assert!((sum - 3.0).abs() < 1e-9);
        assert_eq!(summary_for(&samples, "USDT"), (0, 0.0));

        // Both targets scanned the same inclusive range.
        let mut calls = source.log_calls();
        calls.sort();
        assert_eq!(calls, vec![(token_a(), 50, 100), (token_b(), 50, 100)]);

        assert_eq!(*collector.watermark.lock().await, 100);
    }

    #[tokio::test]
    async fn head_failure_yields_single_invalid_sample() {
        let source = Arc::new(FakeSource::new().with_head_error("connection refused"));
        let collector = Erc20TransferCollector::new(
            Arc::clone(&source),
            vec![target(token_a(), "circle", "USDC", 18), target(token_b(), "tether", "USDT", 18)],
            50,
            1_000,
        );

        let samples = collector.collect().await;

        assert_eq!(samples.len(), 1);
        assert!(matches!(&samples[0], Sample::Invalid { message, .. }
            if message.contains("current block number")));
        assert!(source.log_calls().is_empty());
        assert_eq!(*collector.watermark.lock().await, 50);
    }

    #[tokio::test]
    async fn target_failure_is_isolated_and_watermark_still_advances() {
        // Span 30 over [50, 100] forces two pages per target; the second
        // target breaks on its second page.
        let source = Arc::new(
            FakeSource::new()
                .with_head(100)
                .with_pages(token_a(), vec![Ok(vec![transfer(5)])])
                .with_pages(token_b(), vec![Ok(vec![transfer(7)]), Err("timeout")]),
        );
        let collector = Erc20TransferCollector::new(
            Arc::clone(&source),
            vec![target(token_a(), "circle", "USDC", 0), target(token_b(), "tether", "USDT", 0)],
            50,
            30,
        );

        let samples = collector.collect().await;

        assert_eq!(samples.len(), 2);
        assert_eq!(summary_for(&samples, "USDC"), (1, 5.0));
        assert!(samples.iter().any(|sample| matches!(sample, Sample::Invalid { message, .. }
            if message.contains(&token_b().to_string()))));

        assert_eq!(*collector.watermark.lock().await, 100);
    }

    #[tokio::test]
    async fn head_equal_to_watermark_scans_one_block() {
        let source = Arc::new(FakeSource::new().with_head(100));
        let collector = Erc20TransferCollector::new(
            Arc::clone(&source),
            vec![target(token_a(), "circle", "USDC", 18)],
            100,
            1_000,
        );

        let samples = collector.collect().await;

        assert_eq!(summary_for(&samples, "USDC"), (0, 0.0));
        assert_eq!(source.log_calls(), vec![(token_a(), 100, 100)]);
        assert_eq!(*collector.watermark.lock().await, 100);
    }

    #[tokio::test]
    async fn head_below_watermark_skips_scan() {
        let source = Arc::new(FakeSource::new().with_head(90));
        let collector = Erc20TransferCollector::new(
            Arc::clone(&source),
            vec![target(token_a(), "circle", "USDC", 18)],
            100,
            1_000,
        );

        let samples = collector.collect().await;

        assert_eq!(summary_for(&samples, "USDC"), (0, 0.0));
        assert!(source.log_calls().is_empty());
        assert_eq!(*collector.watermark.lock().await, 100);
    }

    #[tokio::test]
    async fn concurrent_scrapes_run_as_serial_passes() {
        let source = Arc::new(
            FakeSource::new()
                .with_head(10)
                .with_head(20)
                .with_log_delay(Duration::from_millis(50)),
        );
        let collector = Arc::new(Erc20TransferCollector::new(
            Arc::clone(&source),
            vec![target(token_a(), "circle", "USDC", 18)],
            0,
            1_000,
        ));

        let first = tokio::spawn({
            let collector = Arc::clone(&collector);
            async move { collector.collect().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = tokio::spawn({
            let collector = Arc::clone(&collector);
            async move { collector.collect().await }
        });

        first.await.unwrap();
        second.await.unwrap();

        // The pass lock keeps head lookup and scan of each pass together.
        assert_eq!(source.events(), vec!["head", "logs", "head", "logs"]);
        // The second pass starts at the first pass's head, re-scanning the
        // boundary block.
        assert_eq!(source.log_calls(), vec![(token_a(), 0, 10), (token_a(), 10, 20)]);
        assert_eq!(*collector.watermark.lock().await, 20);
    }
}
