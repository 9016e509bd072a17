//! Folds a transfer stream into an observation count and a scaled amount sum.

use crate::{error::ScanError, scanner::TransferStream, source::ChainSource, utils::scale_amount};

/// Count and token-unit sum of the transfers seen in one range scan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub count: u64,
    pub sum: f64,
}

/// Drains `stream`, counting every transfer and summing amounts scaled by the
/// token's `decimals`.
///
/// A mid-stream failure discards the partial tallies; the caller never sees a
/// summary built from an incomplete range.
pub async fn aggregate<S: ChainSource>(
    stream: &mut TransferStream<S>,
    decimals: u8,
) -> Result<Summary, ScanError> {
    let mut summary = Summary::default();
    while let Some(next) = stream.next().await {
        let transfer = next?;
        summary.count += 1;
        summary.sum += scale_amount(transfer.amount, decimals);
    }
    Ok(summary)
}
