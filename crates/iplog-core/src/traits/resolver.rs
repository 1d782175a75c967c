// # Resolver Trait
//
// Defines the interface for looking up the caller's public IP address.
//
// ## Implementations
//
// - HTTP/JSON endpoint: `iplog-resolver-http` crate
// - DNS echo server: `iplog-resolver-dns` crate
//
// ## Usage
//
// ```rust,ignore
// use iplog_core::Resolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* Resolver implementation */;
//
//     let ip = resolver.resolve().await?;
//     println!("public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP resolver implementations
///
/// A resolver performs exactly one lookup per call. It does not retry,
/// sleep, cache, or decide whether the result should be logged; the
/// driver owns all of that.
///
/// # Errors
///
/// Failures are reported as `Err`, never as a panic:
/// - HTTP strategies return [`Error::Network`](crate::Error::Network)
/// - DNS strategies return [`Error::Resolution`](crate::Error::Resolution)
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Look up the current public IP address
    async fn resolve(&self) -> Result<IpAddr, crate::Error>;

    /// Strategy name (for logging/debugging), e.g. "http" or "dns"
    fn strategy_name(&self) -> &'static str;
}

/// Helper trait for constructing resolvers from configuration
pub trait ResolverFactory: Send + Sync {
    /// Create a Resolver instance from configuration
    ///
    /// Returns [`Error::Config`](crate::Error::Config) when handed a
    /// configuration for another strategy.
    fn create(
        &self,
        config: &crate::config::ResolverConfig,
    ) -> Result<Box<dyn Resolver>, crate::Error>;
}
