// # Log Store Trait
//
// Defines the interface for the append-only IP change log.
//
// ## Layout
//
// A header line followed by one entry per detected change, oldest first.
// See [`crate::entry`] for the line format.
//
// ## Implementations
//
// - File-based: [`crate::store::FileLogStore`]
// - In-memory: [`crate::store::MemoryLogStore`]

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::entry::LogEntry;

/// Trait for log store implementations
///
/// # Guarantees
///
/// - Entries are returned in insertion order
/// - Appended entries are never rewritten or removed by this system
/// - Every appended entry is visible to the next `read_all_entries()` call
/// - Malformed lines are skipped on read, never reported as errors
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Create the log with its header line if it does not exist yet
    ///
    /// Idempotent: calling it on an existing log changes nothing.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The log was created by this call
    /// - `Ok(false)`: The log already existed
    /// - `Err(Error)`: Storage error
    async fn ensure_initialized(&self) -> Result<bool, crate::Error>;

    /// Read every well-formed entry, oldest first
    ///
    /// A log that does not exist yet reads as empty.
    async fn read_all_entries(&self) -> Result<Vec<LogEntry>, crate::Error>;

    /// Append one entry and make it durable before returning
    ///
    /// `ip` must be an IP address; anything else is rejected with
    /// [`crate::Error::InvalidIp`] and nothing is written.
    async fn append_entry(
        &self,
        ip: &str,
        timestamp: NaiveDateTime,
    ) -> Result<LogEntry, crate::Error>;

    /// The most recent entry, if any
    async fn last_entry(&self) -> Result<Option<LogEntry>, crate::Error> {
        Ok(self.read_all_entries().await?.pop())
    }

    /// Human-readable location (for logging)
    fn location(&self) -> String;
}
