// # HTTP Resolver
//
// This crate provides an HTTP-based public IP resolver for iplog.
//
// ## Protocol
//
// A single GET to an endpoint that answers with a JSON body:
//
// ```json
// {"ip": "203.0.113.7"}
// ```
//
// The default endpoint is `https://api.ipify.org?format=json`.
//
// ## Failure Model
//
// Connection failures, timeouts, non-2xx statuses, malformed JSON and an
// `ip` field that is not an address all map to `Error::Network`. The
// resolver never retries; the driver simply tries again next tick.

use iplog_core::ResolverRegistry;
use iplog_core::config::ResolverConfig;
use iplog_core::traits::{Resolver, ResolverFactory};
use iplog_core::{Error, Result};

use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Strategy name used in configuration and the registry
pub const STRATEGY: &str = "http";

/// Body returned by "what is my IP" JSON endpoints
#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// HTTP/JSON public IP resolver
pub struct HttpResolver {
    /// Endpoint returning `{"ip": "..."}`
    url: String,

    /// HTTP client (carries the request timeout)
    client: reqwest::Client,
}

impl HttpResolver {
    /// Create a new HTTP resolver
    ///
    /// # Parameters
    ///
    /// - `url`: Endpoint URL (e.g., "https://api.ipify.org?format=json")
    /// - `timeout`: Whole-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("iplog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a resolver around an existing client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

/// Extract the address from a JSON response body
fn parse_body(body: &str) -> Result<IpAddr> {
    let response: IpResponse = serde_json::from_str(body)
        .map_err(|e| Error::network(format!("Malformed response body: {}", e)))?;

    let ip = response.ip.trim();
    ip.parse()
        .map_err(|_| Error::network(format!("Invalid IP address in response: {:?}", ip)))
}

#[async_trait::async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("HTTP error: {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = parse_body(&body)?;
        tracing::trace!("{} answered {}", self.url, ip);
        Ok(ip)
    }

    fn strategy_name(&self) -> &'static str {
        STRATEGY
    }
}

/// Factory for creating HTTP resolvers
pub struct HttpFactory;

impl ResolverFactory for HttpFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Box<dyn Resolver>> {
        match config {
            ResolverConfig::Http { url, .. } => {
                Ok(Box::new(HttpResolver::new(url.clone(), config.timeout())?))
            }
            _ => Err(Error::config("Invalid config for HTTP resolver")),
        }
    }
}

/// Register the HTTP resolver with a registry
pub fn register(registry: &ResolverRegistry) {
    registry.register_resolver(STRATEGY, Box::new(HttpFactory));
}
