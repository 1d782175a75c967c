//! Test doubles and common utilities for driver contract tests

#![allow(dead_code)]

use iplog_core::config::IpLogConfig;
use iplog_core::error::{Error, Result};
use iplog_core::traits::Resolver;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted resolver answer
#[derive(Debug, Clone, Copy)]
pub enum Answer {
    Ip(IpAddr),
    Fail,
}

/// A resolver that replays a fixed script of answers
///
/// Once the script is exhausted the last answer repeats.
pub struct ScriptedResolver {
    script: Arc<Vec<Answer>>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedResolver {
    pub fn new(script: Vec<Answer>) -> Self {
        assert!(!script.is_empty(), "script needs at least one answer");
        Self {
            script: Arc::new(script),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Take `delay` to answer, like a slow endpoint
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Always answer with the same IP
    pub fn fixed(ip: IpAddr) -> Self {
        Self::new(vec![Answer::Ip(ip)])
    }

    /// Always fail
    pub fn failing() -> Self {
        Self::new(vec![Answer::Fail])
    }

    /// Get the number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedResolver that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            calls: Arc::clone(&other.calls),
            delay: other.delay,
        }
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.script[call.min(self.script.len() - 1)];

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match answer {
            Answer::Ip(ip) => Ok(ip),
            Answer::Fail => Err(Error::network("scripted failure")),
        }
    }

    fn strategy_name(&self) -> &'static str {
        "scripted"
    }
}

pub fn ip(octets: [u8; 4]) -> IpAddr {
    IpAddr::from(octets)
}

/// Helper to create a config with a short interval for testing
pub fn test_config(interval_secs: u64) -> IpLogConfig {
    IpLogConfig::new().with_interval_secs(interval_secs)
}

/// A log store whose reads always succeed empty and whose appends always fail
pub struct ReadOnlyLogStore {
    append_calls: Arc<AtomicUsize>,
}

impl ReadOnlyLogStore {
    pub fn new() -> Self {
        Self {
            append_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times append_entry() was called
    pub fn append_call_count(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    /// Create a new ReadOnlyLogStore that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            append_calls: Arc::clone(&other.append_calls),
        }
    }
}

#[async_trait::async_trait]
impl iplog_core::traits::LogStore for ReadOnlyLogStore {
    async fn ensure_initialized(&self) -> Result<bool> {
        Ok(false)
    }

    async fn read_all_entries(&self) -> Result<Vec<iplog_core::LogEntry>> {
        Ok(Vec::new())
    }

    async fn append_entry(
        &self,
        _ip: &str,
        _timestamp: chrono::NaiveDateTime,
    ) -> Result<iplog_core::LogEntry> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only log",
        )))
    }

    fn location(&self) -> String {
        "read-only".to_string()
    }
}

/// Drain every event currently buffered in the channel
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<iplog_core::DriverEvent>,
) -> Vec<iplog_core::DriverEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
