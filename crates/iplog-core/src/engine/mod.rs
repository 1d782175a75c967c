//! Polling driver
//!
//! The IpLogDriver is responsible for:
//! - Initializing the log store at startup
//! - Resolving the current public IP on every tick
//! - Comparing it against the last logged entry
//! - Appending an entry only when the IP changed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Resolver   │─── IpAddr ──────────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │ IpLogDriver  │
//!                            └──────────────┘
//!                                     │
//!                     ┌───────────────┴───────────────┐
//!                     │                               │
//!                     ▼                               ▼
//!             ┌──────────────┐                ┌─────────────┐
//!             │  LogStore    │                │   Events    │
//!             │ (read/append)│                │  (notify)   │
//!             └──────────────┘                └─────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Resolve the current IP (on failure: warn, skip to 4)
//! 2. Read the log and take the last entry's IP
//! 3. If there is none, or it differs, append a new entry
//! 4. Sleep for the poll interval

use std::future::Future;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::IpLogConfig;
use crate::entry::LogEntry;
use crate::error::Result;
use crate::traits::{LogStore, Resolver};

/// Events emitted by the IpLogDriver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// Startup finished
    Started {
        /// Entries already in the log
        previous_entries: usize,
        /// Whether the log was created during startup
        created: bool,
    },

    /// A changed IP was appended to the log
    EntryAppended {
        entry: LogEntry,
        previous_ip: Option<String>,
    },

    /// The resolved IP matches the last entry
    Unchanged {
        ip: String,
    },

    /// The resolver failed; the log was not touched
    ResolveFailed {
        error: String,
    },

    /// Reading or appending the log failed; retried next tick
    StoreFailed {
        error: String,
    },

    /// Driver stopped
    Stopped {
        reason: String,
    },
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new entry was written
    Appended(LogEntry),
    /// The IP matched the last entry; nothing was written
    Unchanged(String),
    /// The resolver failed; nothing was written
    ResolveFailed(String),
}

/// Public IP change logger
///
/// ## Lifecycle
///
/// 1. Create with [`IpLogDriver::new()`]
/// 2. Start with [`IpLogDriver::run()`] or [`IpLogDriver::run_until()`]
/// 3. Driver ticks until the shutdown future resolves
///
/// ## Threading
///
/// Everything runs on the caller's task. A tick is never interrupted:
/// shutdown is observed before each tick and while sleeping between ticks.
pub struct IpLogDriver {
    /// Public IP lookup
    resolver: Box<dyn Resolver>,

    /// Append-only change log
    store: Box<dyn LogStore>,

    /// Sleep between ticks
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<DriverEvent>,
}

impl IpLogDriver {
    /// Create a new driver
    ///
    /// # Returns
    ///
    /// A tuple of (driver, event_receiver) where event_receiver yields driver events
    pub fn new(
        resolver: Box<dyn Resolver>,
        store: Box<dyn LogStore>,
        config: &IpLogConfig,
    ) -> Result<(Self, mpsc::Receiver<DriverEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let driver = Self {
            resolver,
            store,
            interval: config.interval(),
            event_tx: tx,
        };

        Ok((driver, rx))
    }

    /// Run until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Startup failed (log could not be initialized or read)
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.startup().await?;

        info!(
            "Started checking for IP change every {} seconds",
            self.interval.as_secs()
        );

        tokio::pin!(shutdown);

        loop {
            // A signal that arrived during startup or the previous tick
            // stops the loop before another resolve starts
            let stop_requested = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = std::future::ready(()) => false,
            };
            if stop_requested {
                break;
            }

            if let Err(e) = self.tick().await {
                error!("Failed to access log {}: {}", self.store.location(), e);
                self.emit_event(DriverEvent::StoreFailed {
                    error: e.to_string(),
                });
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => break,
            }
        }

        info!("Program stopped.");
        self.emit_event(DriverEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Test hook: run with a oneshot shutdown channel
    ///
    /// Passing `None` runs until Ctrl-C, like [`IpLogDriver::run()`].
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        match shutdown_rx {
            Some(rx) => {
                self.run_until(async {
                    let _ = rx.await;
                })
                .await
            }
            None => self.run().await,
        }
    }

    /// Initialize the log and report its current contents
    ///
    /// # Returns
    ///
    /// The entries already present in the log
    pub async fn startup(&self) -> Result<Vec<LogEntry>> {
        let created = self.store.ensure_initialized().await?;
        if created {
            info!("Created log file: {}", self.store.location());
        }

        let entries = self.store.read_all_entries().await?;
        if entries.is_empty() {
            info!("No previous IPs found in the log file.");
        } else {
            info!("Previous IPs:");
            for entry in &entries {
                info!("{}", entry);
            }
        }

        self.emit_event(DriverEvent::Started {
            previous_entries: entries.len(),
            created,
        });

        Ok(entries)
    }

    /// Run one resolve → compare → maybe-append cycle
    ///
    /// Resolver failures are absorbed into [`TickOutcome::ResolveFailed`];
    /// only log store failures are returned as `Err`.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let current_ip = match self.resolver.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                if e.is_lookup_failure() {
                    warn!("Failed to fetch IP via {}: {}", self.resolver.strategy_name(), e);
                } else {
                    error!("Resolver {} failed: {}", self.resolver.strategy_name(), e);
                }
                self.emit_event(DriverEvent::ResolveFailed {
                    error: e.to_string(),
                });
                return Ok(TickOutcome::ResolveFailed(e.to_string()));
            }
        };
        debug!("Resolved public IP: {}", current_ip);

        let last = self.store.last_entry().await?;

        if let Some(last) = last.as_ref().filter(|entry| entry.records(current_ip)) {
            debug!("IP unchanged: {}", last.ip);
            self.emit_event(DriverEvent::Unchanged {
                ip: last.ip.clone(),
            });
            return Ok(TickOutcome::Unchanged(last.ip.clone()));
        }
        let last_ip = last.map(|entry| entry.ip);

        let entry = self
            .store
            .append_entry(&current_ip.to_string(), Local::now().naive_local())
            .await?;
        info!("Logged: {}", entry);

        self.emit_event(DriverEvent::EntryAppended {
            entry: entry.clone(),
            previous_ip: last_ip,
        });

        Ok(TickOutcome::Appended(entry))
    }

    /// Emit a driver event
    fn emit_event(&self, event: DriverEvent) {
        // A full or closed channel must never stall the loop
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryLogStore;
    use std::net::IpAddr;

    struct FixedResolver(Option<IpAddr>);

    #[async_trait::async_trait]
    impl Resolver for FixedResolver {
        async fn resolve(&self) -> Result<IpAddr> {
            self.0.ok_or_else(|| Error::network("unreachable"))
        }

        fn strategy_name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_first_tick_on_empty_log_appends() {
        let store = MemoryLogStore::new();
        let (driver, _rx) = IpLogDriver::new(
            Box::new(FixedResolver(Some(IpAddr::from([1, 2, 3, 4])))),
            Box::new(store.clone()),
            &IpLogConfig::default(),
        )
        .unwrap();

        let entries = driver.startup().await.unwrap();
        assert!(entries.is_empty());

        let outcome = driver.tick().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Appended(ref e) if e.ip == "1.2.3.4"));
        assert_eq!(store.lines().await.len(), 2);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_absorbed() {
        let store = MemoryLogStore::new();
        let (driver, mut rx) = IpLogDriver::new(
            Box::new(FixedResolver(None)),
            Box::new(store.clone()),
            &IpLogConfig::default(),
        )
        .unwrap();

        let outcome = driver.tick().await.unwrap();
        assert!(matches!(outcome, TickOutcome::ResolveFailed(_)));
        assert!(store.lines().await.is_empty());
        assert!(matches!(rx.try_recv(), Ok(DriverEvent::ResolveFailed { .. })));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = IpLogDriver::new(
            Box::new(FixedResolver(None)),
            Box::new(MemoryLogStore::new()),
            &IpLogConfig::default().with_interval_secs(0),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
