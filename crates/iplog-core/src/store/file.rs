// # File Log Store
//
// File-based implementation of LogStore.
//
// ## Purpose
//
// Keeps a durable, human-readable history of public IP changes across
// restarts. The file is the only state: the last known IP is recovered by
// reading it back, so hand edits are picked up on the next read.
//
// ## File Format
//
// ```text
// IP Change Log
// 2025-01-09 12:00:00 - IP: 1.2.3.4
// 2025-01-10 08:30:15 - IP: 5.6.7.8
// ```
//
// ## Write Discipline
//
// - Append-only: existing bytes are never rewritten
// - Each append opens, writes, flushes, syncs and closes its own handle
// - No handle is held between operations

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;

use crate::Error;
use crate::entry::{self, LOG_HEADER, LogEntry};
use crate::traits::log_store::LogStore;

/// File-based log store
///
/// # Example
///
/// ```rust,no_run
/// use iplog_core::store::FileLogStore;
/// use iplog_core::traits::LogStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileLogStore::new("ip_log.txt");
///     store.ensure_initialized().await?;
///
///     store.append_entry("1.2.3.4", chrono::Local::now().naive_local()).await?;
///
///     for entry in store.read_all_entries().await? {
///         println!("{}", entry);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileLogStore {
    path: PathBuf,
}

impl FileLogStore {
    /// Create a store for the given path
    ///
    /// Nothing is touched on disk until [`LogStore::ensure_initialized`]
    /// or [`LogStore::append_entry`] is called.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create parent directory if it doesn't exist
    async fn create_parent_dir(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !fs::try_exists(parent).await?
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create log directory {}: {}", parent.display(), e),
                ))
            })?;
        }
        Ok(())
    }

    /// Whether the file is non-empty and lacks a trailing newline
    ///
    /// Only happens after a hand edit; appending straight away would glue
    /// the new entry onto the last line.
    async fn needs_leading_newline(file: &mut fs::File) -> Result<bool, Error> {
        let len = file.metadata().await?.len();
        if len == 0 {
            return Ok(false);
        }

        file.seek(SeekFrom::End(-1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        Ok(last[0] != b'\n')
    }
}

#[async_trait]
impl LogStore for FileLogStore {
    async fn ensure_initialized(&self) -> Result<bool, Error> {
        if fs::try_exists(&self.path).await? {
            tracing::trace!("Log file already exists: {}", self.path.display());
            return Ok(false);
        }

        self.create_parent_dir().await?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(file) => file,
            // Created by someone else between the check and the open
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        file.write_all(format!("{}\n", LOG_HEADER).as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;

        tracing::debug!("Created log file: {}", self.path.display());
        Ok(true)
    }

    async fn read_all_entries(&self) -> Result<Vec<LogEntry>, Error> {
        let file = match fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Log file does not exist: {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        // Split on raw bytes so a stray non-UTF-8 line cannot abort the read
        let mut lines = SplitStream::new(BufReader::new(file).split(b'\n'));
        let mut entries = Vec::new();
        let mut first = true;

        while let Some(line) = lines.next().await {
            let line = line?;
            let line = String::from_utf8_lossy(&line);

            if std::mem::take(&mut first) && line.trim() == LOG_HEADER {
                continue;
            }
            if let Some(entry) = entry::parse_candidate(&line) {
                entries.push(entry);
            }
        }

        tracing::trace!(
            "Read {} entries from {}",
            entries.len(),
            self.path.display()
        );
        Ok(entries)
    }

    async fn append_entry(&self, ip: &str, timestamp: NaiveDateTime) -> Result<LogEntry, Error> {
        let entry = LogEntry::checked(ip, timestamp)?;

        // Keeps the header invariant if the file vanished since startup
        self.ensure_initialized().await?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut line = String::new();
        if Self::needs_leading_newline(&mut file).await? {
            line.push('\n');
        }
        line.push_str(&entry.to_string());
        line.push('\n');

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;

        Ok(entry)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
