//! Paged log-range scanner. Turns one inclusive block range into a lazy,
//! finite sequence of decoded transfer events.

use std::sync::Arc;

use alloy_primitives::Address;

use crate::{
    error::ScanError,
    source::{ChainSource, RawTransfer},
};

/// Default number of blocks per `eth_getLogs` page.
pub const DEFAULT_PAGE_SPAN: u64 = 10_000;

/// Scans transfer logs for one token over an inclusive block range, fetching
/// the range in fixed page spans.
pub struct LogScanner<S> {
    source: Arc<S>,
    page_span: u64,
}

impl<S> Clone for LogScanner<S> {
    fn clone(&self) -> Self {
        Self { source: Arc::clone(&self.source), page_span: self.page_span }
    }
}

impl<S> std::fmt::Debug for LogScanner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogScanner").field("page_span", &self.page_span).finish()
    }
}

impl<S: ChainSource> LogScanner<S> {
    /// `page_span` is clamped to at least one block.
    pub fn new(source: Arc<S>, page_span: u64) -> Self {
        Self { source, page_span: page_span.max(1) }
    }

    /// Start a scan of `[from, to]` (inclusive) for `token`.
    ///
    /// The first page is fetched here, so a failure to establish the range
    /// query surfaces as [`ScanError::Start`] before any event is observed.
    /// A `from > to` range yields an already-exhausted stream without any
    /// remote call.
    pub async fn scan(
        &self,
        token: Address,
        from: u64,
        to: u64,
    ) -> Result<TransferStream<S>, ScanError> {
        if from > to {
            return Ok(TransferStream {
                source: Arc::clone(&self.source),
                token,
                page: Vec::new().into_iter(),
                cursor: from,
                to,
                page_span: self.page_span,
                done: true,
            });
        }

        let page_to = page_end(from, self.page_span, to);
        let first =
            self.source.transfer_logs(token, from, page_to).await.map_err(ScanError::Start)?;

        Ok(TransferStream {
            source: Arc::clone(&self.source),
            token,
            page: first.into_iter(),
            cursor: if page_to == to { from } else { page_to + 1 },
            to,
            page_span: self.page_span,
            done: page_to == to,
        })
    }
}

/// End of the page starting at `start`, capped at the range end.
fn page_end(start: u64, page_span: u64, to: u64) -> u64 {
    start.saturating_add(page_span - 1).min(to)
}

/// A lazy, finite sequence of transfer events scoped to one range query.
///
/// Later pages are fetched on demand during iteration; a page fetch failure
/// surfaces as [`ScanError::Stream`] and fuses the stream. Consume with
/// `while let Some(item) = stream.next().await`.
#[derive(Debug)]
pub struct TransferStream<S> {
    source: Arc<S>,
    token: Address,
    page: std::vec::IntoIter<RawTransfer>,
    /// Start of the next unfetched page. Meaningless once `done`.
    cursor: u64,
    to: u64,
    page_span: u64,
    done: bool,
}

impl<S: ChainSource> TransferStream<S> {
    /// Next event, fetching further pages as needed.
    pub async fn next(&mut self) -> Option<Result<RawTransfer, ScanError>> {
        loop {
            if let Some(transfer) = self.page.next() {
                return Some(Ok(transfer));
            }
            if self.done {
                return None;
            }

            let page_to = page_end(self.cursor, self.page_span, self.to);
            match self.source.transfer_logs(self.token, self.cursor, page_to).await {
                Ok(transfers) => {
                    if page_to == self.to {
                        self.done = true;
                    } else {
                        self.cursor = page_to + 1;
                    }
                    self.page = transfers.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(ScanError::Stream(e)));
                }
            }
        }
    }
}
