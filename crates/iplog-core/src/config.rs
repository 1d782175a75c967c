//! Configuration types for the IP change logger
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default log file location
pub const DEFAULT_LOG_PATH: &str = "ip_log.txt";

/// Default poll period in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default HTTP endpoint (returns `{"ip": "..."}`)
pub const DEFAULT_HTTP_URL: &str = "https://api.ipify.org?format=json";

/// Default DNS echo server
pub const DEFAULT_DNS_SERVER: &str = "resolver1.opendns.com";

/// Default DNS echo query name
pub const DEFAULT_DNS_QUERY: &str = "myip.opendns.com";

/// Default resolver timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLogConfig {
    /// Path to the IP change log
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Poll period in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Resolver strategy
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Capacity of the driver event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl IpLogConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            log_path: default_log_path(),
            interval_secs: default_interval_secs(),
            resolver: ResolverConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the log file path
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Set the poll period
    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Set the resolver strategy
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Poll period as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.log_path.as_os_str().is_empty() {
            return Err(crate::Error::config("Log path cannot be empty"));
        }
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.resolver.validate()
    }
}

impl Default for IpLogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolver strategy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverConfig {
    /// Query an HTTP endpoint that answers `{"ip": "<address>"}`
    Http {
        /// Endpoint URL
        #[serde(default = "default_http_url")]
        url: String,
        /// Request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Ask a DNS server that echoes the querying client's address
    Dns {
        /// Echo server host (resolved through the system resolver)
        #[serde(default = "default_dns_server")]
        server: String,
        /// Name the echo server answers with the client address
        #[serde(default = "default_dns_query")]
        query: String,
        /// Query timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ResolverConfig {
    /// HTTP strategy with default endpoint and timeout
    pub fn http() -> Self {
        ResolverConfig::Http {
            url: default_http_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// DNS strategy with default echo server, query and timeout
    pub fn dns() -> Self {
        ResolverConfig::Dns {
            server: default_dns_server(),
            query: default_dns_query(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ResolverConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(crate::Error::config("HTTP resolver URL cannot be empty"));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("HTTP resolver timeout must be > 0"));
                }
                Ok(())
            }
            ResolverConfig::Dns {
                server,
                query,
                timeout_secs,
            } => {
                if server.is_empty() {
                    return Err(crate::Error::config("DNS resolver server cannot be empty"));
                }
                if query.is_empty() {
                    return Err(crate::Error::config("DNS resolver query cannot be empty"));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("DNS resolver timeout must be > 0"));
                }
                Ok(())
            }
        }
    }

    /// Get the strategy name used for registry lookup
    pub fn type_name(&self) -> &'static str {
        match self {
            ResolverConfig::Http { .. } => "http",
            ResolverConfig::Dns { .. } => "dns",
        }
    }

    /// Resolver timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        match self {
            ResolverConfig::Http { timeout_secs, .. } | ResolverConfig::Dns { timeout_secs, .. } => {
                Duration::from_secs(*timeout_secs)
            }
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::http()
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_http_url() -> String {
    DEFAULT_HTTP_URL.to_string()
}

fn default_dns_server() -> String {
    DEFAULT_DNS_SERVER.to_string()
}

fn default_dns_query() -> String {
    DEFAULT_DNS_QUERY.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_event_channel_capacity() -> usize {
    100
}
