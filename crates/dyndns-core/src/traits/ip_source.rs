// # IP Source Trait
//
// Defines the interface for resolving the caller's public IP address.
//
// ## Implementations
//
// - HTTP echo service: `dyndns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let ip = source.current().await?;
//     println!("public IP: {ip}");
//     Ok(())
// }
// ```

use crate::ip::IpAddress;
use async_trait::async_trait;

/// Trait for external IP resolvers
///
/// # Contract
///
/// - One lookup per call, no caching: every run must observe current truth
/// - The returned address has already passed [`crate::ip::is_valid_ip_address`]
/// - A non-success answer from the echo service is a `Transport` error
///   carrying the status code
/// - A body that is not an IP literal is a `Validation` error, so callers can
///   tell a broken network from a broken payload
/// - Timeouts and transient-failure retries belong to the implementation's
///   transport, never to the reconciler
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    async fn current(&self) -> Result<IpAddress, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
