// # DNS Echo Resolver
//
// This crate provides a DNS-based public IP resolver for iplog.
//
// ## Protocol
//
// Some public resolvers answer a special name with the address of the
// client asking. With OpenDNS:
//
// ```text
// $ dig +short myip.opendns.com @resolver1.opendns.com
// 203.0.113.7
// ```
//
// The echo server host is looked up through the system resolver first,
// then queried directly for the echo name. Nothing is cached between
// calls, so every resolve sees the current address.
//
// ## Failure Model
//
// Bootstrap failures, query failures, timeouts and empty answers all map
// to `Error::Resolution`.

use iplog_core::ResolverRegistry;
use iplog_core::config::ResolverConfig;
use iplog_core::traits::{Resolver, ResolverFactory};
use iplog_core::{Error, Result};

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{
    NameServerConfigGroup, ResolverConfig as DnsClientConfig, ResolverOpts,
};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Strategy name used in configuration and the registry
pub const STRATEGY: &str = "dns";

/// Standard DNS port
const DNS_PORT: u16 = 53;

/// DNS echo public IP resolver
#[derive(Debug, Clone)]
pub struct DnsEchoResolver {
    /// Echo server host name or address
    server: String,

    /// Echo server port
    port: u16,

    /// Name the echo server answers with the client address
    query: String,

    /// Timeout for the bootstrap lookup and for the echo query
    timeout: Duration,
}

impl DnsEchoResolver {
    /// Create a new DNS echo resolver
    ///
    /// # Parameters
    ///
    /// - `server`: Echo server (e.g., "resolver1.opendns.com")
    /// - `query`: Echo name (e.g., "myip.opendns.com")
    /// - `timeout`: Per-step timeout
    pub fn new(server: impl Into<String>, query: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            port: DNS_PORT,
            query: query.into(),
            timeout,
        }
    }

    /// Use a non-standard server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Resolve the echo server's own addresses through the system resolver
    async fn echo_server_ips(&self) -> Result<Vec<IpAddr>> {
        let lookup = tokio::net::lookup_host((self.server.as_str(), self.port));
        let addrs = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| {
                Error::resolution(format!("Timed out looking up echo server {}", self.server))
            })?
            .map_err(|e| {
                Error::resolution(format!("Failed to look up echo server {}: {}", self.server, e))
            })?;

        let ips: Vec<IpAddr> = addrs.map(|addr: SocketAddr| addr.ip()).collect();
        if ips.is_empty() {
            return Err(Error::resolution(format!(
                "Echo server {} has no addresses",
                self.server
            )));
        }
        Ok(ips)
    }

    /// Build a client that talks only to the echo server
    fn client_for(&self, ips: &[IpAddr]) -> TokioAsyncResolver {
        let name_servers = NameServerConfigGroup::from_ips_clear(ips, self.port, true);
        let config = DnsClientConfig::from_parts(None, vec![], name_servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = self.timeout;
        opts.attempts = 1;
        opts.cache_size = 0;

        TokioAsyncResolver::tokio(config, opts)
    }
}

#[async_trait::async_trait]
impl Resolver for DnsEchoResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        let server_ips = self.echo_server_ips().await?;
        tracing::trace!("Echo server {} is at {:?}", self.server, server_ips);

        let client = self.client_for(&server_ips);
        let answer = client.lookup_ip(self.query.as_str()).await.map_err(|e| {
            Error::resolution(format!(
                "Query for {} at {} failed: {}",
                self.query, self.server, e
            ))
        })?;

        answer.iter().next().ok_or_else(|| {
            Error::resolution(format!("Empty answer for {} from {}", self.query, self.server))
        })
    }

    fn strategy_name(&self) -> &'static str {
        STRATEGY
    }
}

/// Factory for creating DNS echo resolvers
pub struct DnsFactory;

impl ResolverFactory for DnsFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Box<dyn Resolver>> {
        match config {
            ResolverConfig::Dns { server, query, .. } => Ok(Box::new(DnsEchoResolver::new(
                server.clone(),
                query.clone(),
                config.timeout(),
            ))),
            _ => Err(Error::config("Invalid config for DNS resolver")),
        }
    }
}

/// Register the DNS echo resolver with a registry
pub fn register(registry: &ResolverRegistry) {
    registry.register_resolver(STRATEGY, Box::new(DnsFactory));
}
