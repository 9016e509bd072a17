//! Error types for the exporter library.

use alloy_primitives::Address;
use alloy_transport::TransportError;

/// Failure of one outbound call on a [`ChainSource`](crate::source::ChainSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport-level failure (connection, RPC error response, timeout).
    #[error(transparent)]
    Rpc(#[from] TransportError),

    /// A log or call return that does not decode as the expected ABI shape.
    #[error("failed to decode contract response: {0}")]
    Decode(#[from] alloy_sol_types::Error),
}

/// Failure of a log-range scan.
///
/// The two variants matter to callers: a `Start` failure means no events were
/// observed at all, while a `Stream` failure may follow events that were
/// already consumed, so any partial aggregation must be discarded.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The range query could not be established.
    #[error("failed to start transfer scan: {0}")]
    Start(#[source] SourceError),

    /// The event sequence broke partway through.
    #[error("transfer scan failed mid-read: {0}")]
    Stream(#[source] SourceError),
}

/// Failure to resolve a target's on-chain metadata at startup.
#[derive(Debug, thiserror::Error)]
pub enum TargetResolveError {
    #[error("failed to get symbol for {address}: {source}")]
    Symbol { address: Address, source: SourceError },

    #[error("failed to get decimals for {address}: {source}")]
    Decimals { address: Address, source: SourceError },
}
