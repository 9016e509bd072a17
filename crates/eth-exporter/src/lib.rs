//! Ethereum Exporter: Prometheus metrics collected from an Ethereum JSON-RPC endpoint.

pub mod aggregate;
pub mod bindings;
pub mod collectors;
pub mod error;
pub mod metrics;
pub mod scanner;
pub mod server;
pub mod source;
pub mod targets;
pub mod utils;
