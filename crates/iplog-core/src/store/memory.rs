// # Memory Log Store
//
// In-memory implementation of LogStore.
//
// ## Purpose
//
// Holds the log as a list of lines with exactly the same parsing rules as
// the file store. Nothing survives a restart. Useful for tests and for
// embedding the driver where the history is consumed through events.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;

use crate::entry::{self, LogEntry, LOG_HEADER};
use crate::traits::log_store::LogStore;
use crate::Error;

/// In-memory log store implementation
///
/// Clones share the same underlying lines, so a test can keep a handle
/// while the driver owns another.
///
/// # Example
///
/// ```rust,no_run
/// use iplog_core::store::MemoryLogStore;
/// use iplog_core::traits::LogStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryLogStore::new();
///     store.ensure_initialized().await?;
///
///     store.append_entry("1.2.3.4", chrono::Local::now().naive_local()).await?;
///
///     let last = store.last_entry().await?;
///     assert_eq!(last.map(|e| e.ip), Some("1.2.3.4".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    /// `None` until initialized
    lines: Arc<RwLock<Option<Vec<String>>>>,
}

impl MemoryLogStore {
    /// Create a new, uninitialized memory log store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds the given raw lines
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(RwLock::new(Some(
                lines.into_iter().map(Into::into).collect(),
            ))),
        }
    }

    /// Snapshot of the raw lines (empty if uninitialized)
    pub async fn lines(&self) -> Vec<String> {
        self.lines.read().await.clone().unwrap_or_default()
    }

    /// Replace the raw lines, as a hand edit of the log would
    pub async fn replace_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.lines.write().await = Some(lines.into_iter().map(Into::into).collect());
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn ensure_initialized(&self) -> Result<bool, Error> {
        let mut guard = self.lines.write().await;
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(vec![LOG_HEADER.to_string()]);
        Ok(true)
    }

    async fn read_all_entries(&self) -> Result<Vec<LogEntry>, Error> {
        let guard = self.lines.read().await;
        Ok(guard
            .as_deref()
            .map(|lines| entry::parse_entries(lines.iter().map(String::as_str)))
            .unwrap_or_default())
    }

    async fn append_entry(&self, ip: &str, timestamp: NaiveDateTime) -> Result<LogEntry, Error> {
        let entry = LogEntry::checked(ip, timestamp)?;
        let mut guard = self.lines.write().await;
        guard
            .get_or_insert_with(|| vec![LOG_HEADER.to_string()])
            .push(entry.to_string());
        Ok(entry)
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
