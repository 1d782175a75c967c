// # iplogd - public IP change logger
//
// The iplogd daemon is a thin integration layer. It is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering resolver strategies
// 4. Running the polling driver until SIGINT/SIGTERM
//
// All change-detection logic lives in iplog-core.
//
// ## Configuration
//
// All configuration is done via environment variables (all optional):
//
// - `IPLOG_LOG_PATH`: Path of the IP change log (default: ip_log.txt)
// - `IPLOG_INTERVAL_SECS`: Poll interval in seconds (default: 60)
// - `IPLOG_RESOLVER`: Resolver strategy, `http` or `dns` (default: http)
// - `IPLOG_HTTP_URL`: JSON endpoint for the http strategy
// - `IPLOG_DNS_SERVER`: Echo server for the dns strategy
// - `IPLOG_DNS_QUERY`: Echo name for the dns strategy
// - `IPLOG_TIMEOUT_SECS`: Resolver timeout in seconds (default: 10)
// - `IPLOG_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//
// ## Example
//
// ```bash
// export IPLOG_LOG_PATH=/var/lib/iplog/ip_log.txt
// export IPLOG_RESOLVER=dns
// export IPLOG_INTERVAL_SECS=300
//
// iplogd
// ```

use anyhow::{Context, Result};
use iplog_core::config::{
    DEFAULT_DNS_QUERY, DEFAULT_DNS_SERVER, DEFAULT_HTTP_URL, DEFAULT_INTERVAL_SECS,
    DEFAULT_LOG_PATH, DEFAULT_TIMEOUT_SECS,
};
use iplog_core::{FileLogStore, IpLogConfig, IpLogDriver, ResolverConfig, ResolverRegistry};
use std::env;
use std::future::Future;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum IplogExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IplogExitCode> for ExitCode {
    fn from(code: IplogExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    log_path: String,
    interval_secs: u64,
    resolver_type: String,
    http_url: String,
    dns_server: String,
    dns_query: String,
    timeout_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_secs = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a whole number of seconds. Got: {:?}", key, raw)),
                None => Ok(default),
            }
        };

        Ok(Self {
            log_path: lookup("IPLOG_LOG_PATH").unwrap_or_else(|| DEFAULT_LOG_PATH.to_string()),
            interval_secs: parse_secs("IPLOG_INTERVAL_SECS", DEFAULT_INTERVAL_SECS)?,
            resolver_type: lookup("IPLOG_RESOLVER")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_else(|| "http".to_string()),
            http_url: lookup("IPLOG_HTTP_URL").unwrap_or_else(|| DEFAULT_HTTP_URL.to_string()),
            dns_server: lookup("IPLOG_DNS_SERVER")
                .unwrap_or_else(|| DEFAULT_DNS_SERVER.to_string()),
            dns_query: lookup("IPLOG_DNS_QUERY").unwrap_or_else(|| DEFAULT_DNS_QUERY.to_string()),
            timeout_secs: parse_secs("IPLOG_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            log_level: lookup("IPLOG_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks value ranges, the resolver strategy name, the URL scheme and
    /// the log level. Everything else is checked by `IpLogConfig::validate`.
    fn validate(&self) -> Result<()> {
        if self.log_path.trim().is_empty() {
            anyhow::bail!("IPLOG_LOG_PATH cannot be empty");
        }

        if !(1..=86_400).contains(&self.interval_secs) {
            anyhow::bail!(
                "IPLOG_INTERVAL_SECS must be between 1 and 86400 seconds. Got: {}",
                self.interval_secs
            );
        }

        if !(1..=300).contains(&self.timeout_secs) {
            anyhow::bail!(
                "IPLOG_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.timeout_secs
            );
        }

        match self.resolver_type.as_str() {
            "http" => {
                if !self.http_url.starts_with("https://") && !self.http_url.starts_with("http://")
                {
                    anyhow::bail!(
                        "IPLOG_HTTP_URL must use HTTP or HTTPS scheme. Got: {}",
                        self.http_url
                    );
                }

                if self.http_url.starts_with("http://") {
                    eprintln!(
                        "WARNING: IPLOG_HTTP_URL uses HTTP (not HTTPS). \
                         The reported address can be tampered with in transit."
                    );
                }
            }
            "dns" => {
                if self.dns_server.trim().is_empty() || self.dns_query.trim().is_empty() {
                    anyhow::bail!("IPLOG_DNS_SERVER and IPLOG_DNS_QUERY cannot be empty");
                }
            }
            other => anyhow::bail!(
                "IPLOG_RESOLVER '{}' is not supported. Supported strategies: http, dns",
                other
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "IPLOG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the library configuration
    fn to_iplog_config(&self) -> IpLogConfig {
        let resolver = match self.resolver_type.as_str() {
            "dns" => ResolverConfig::Dns {
                server: self.dns_server.trim().to_string(),
                query: self.dns_query.trim().to_string(),
                timeout_secs: self.timeout_secs,
            },
            _ => ResolverConfig::Http {
                url: self.http_url.trim().to_string(),
                timeout_secs: self.timeout_secs,
            },
        };

        IpLogConfig::new()
            .with_log_path(&self.log_path)
            .with_interval_secs(self.interval_secs)
            .with_resolver(resolver)
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return IplogExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IplogExitCode::ConfigError.into();
    }

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IplogExitCode::ConfigError.into();
    }

    info!("Starting iplogd");

    // The loop is sequential; one worker thread is plenty
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IplogExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> IplogExitCode {
    let iplog_config = config.to_iplog_config();

    // Before anything slow runs, so an early Ctrl-C still stops cleanly
    let shutdown = match shutdown_signal() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            error!("Failed to install signal handlers: {}", e);
            return IplogExitCode::RuntimeError;
        }
    };

    // Create resolver registry and register built-in strategies
    let registry = ResolverRegistry::new();

    #[cfg(feature = "http")]
    iplog_resolver_http::register(&registry);

    #[cfg(feature = "dns")]
    iplog_resolver_dns::register(&registry);

    let resolver = match registry.create_resolver(&iplog_config.resolver) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!(
                "Cannot create resolver (available: {:?}): {}",
                registry.list_resolvers(),
                e
            );
            return IplogExitCode::ConfigError;
        }
    };

    let store = FileLogStore::new(&iplog_config.log_path);

    // Nobody consumes driver events here; a closed channel drops them quietly
    let (driver, _) = match IpLogDriver::new(resolver, Box::new(store), &iplog_config) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return IplogExitCode::ConfigError;
        }
    };

    info!("Log file: {}", iplog_config.log_path.display());
    info!("Resolver strategy: {}", iplog_config.resolver.type_name());

    match driver.run_until(shutdown).await {
        Ok(()) => IplogExitCode::CleanShutdown,
        Err(e) => {
            error!("Daemon error: {}", e);
            IplogExitCode::RuntimeError
        }
    }
}

/// Install the SIGTERM/SIGINT handlers and return a future that resolves
/// on the first signal
///
/// The handlers are in place as soon as this returns, so a signal that
/// arrives before the future is first polled is still seen.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Install the Ctrl-C handler and return a future that resolves on Ctrl-C
#[cfg(windows)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
        info!("Received shutdown signal: Ctrl-C");
    })
}
