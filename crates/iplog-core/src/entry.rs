//! Log entry format
//!
//! One entry per line:
//!
//! ```text
//! IP Change Log
//! 2025-01-09 12:00:00 - IP: 1.2.3.4
//! 2025-01-10 08:30:15 - IP: 5.6.7.8
//! ```
//!
//! The first line is a fixed header. Every line produced by
//! [`LogEntry`]'s `Display` impl parses back with [`LogEntry::parse_line`].

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// First line of every log file
pub const LOG_HEADER: &str = "IP Change Log";

/// Marker that identifies an entry line
pub const IP_MARKER: &str = "IP: ";

/// Separator between the timestamp and the marker
const SEPARATOR: &str = " - ";

/// Timestamp layout, second precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One persisted record of a detected IP at a point in time
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    /// Local wall-clock time, truncated to whole seconds
    pub timestamp: NaiveDateTime,
    /// The address as it appears in the log
    pub ip: String,
}

impl LogEntry {
    /// Create an entry, dropping any sub-second part of `timestamp`
    pub fn new(ip: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self {
            timestamp,
            ip: ip.into(),
        }
    }

    /// Create an entry for writing to a log
    ///
    /// `ip` must be an IPv4 or IPv6 address, so the formatted line always
    /// parses back to the same entry.
    pub fn checked(ip: &str, timestamp: NaiveDateTime) -> Result<Self> {
        let ip = ip.trim();
        if ip.parse::<IpAddr>().is_err() {
            return Err(Error::invalid_ip(ip));
        }
        Ok(Self::new(ip, timestamp))
    }

    /// Whether this entry records `ip`
    ///
    /// Compares as addresses when the logged text parses as one, so a hand
    /// edit such as `2001:DB8::1` still matches `2001:db8::1`.
    pub fn records(&self, ip: IpAddr) -> bool {
        match self.ip.parse::<IpAddr>() {
            Ok(logged) => logged == ip,
            Err(_) => self.ip == ip.to_string(),
        }
    }

    /// Create an entry stamped with the current local time
    pub fn now(ip: impl Into<String>) -> Self {
        Self::new(ip, Local::now().naive_local())
    }

    /// Parse one log line
    ///
    /// Leading and trailing whitespace (including a trailing `\r`) is ignored.
    /// The header, blank lines and anything not shaped like
    /// `<YYYY-MM-DD HH:MM:SS> - IP: <ip>` yield [`Error::MalformedLogLine`].
    pub fn parse_line(line: &str) -> Result<Self> {
        let trimmed = line.trim();

        let (stamp, rest) = trimmed
            .split_once(SEPARATOR)
            .ok_or_else(|| Error::malformed(trimmed))?;
        let ip = rest
            .strip_prefix(IP_MARKER)
            .map(str::trim)
            .filter(|ip| !ip.is_empty() && !ip.contains(char::is_whitespace))
            .ok_or_else(|| Error::malformed(trimmed))?;
        let timestamp = NaiveDateTime::parse_from_str(stamp.trim(), TIMESTAMP_FORMAT)
            .map_err(|_| Error::malformed(trimmed))?;

        Ok(Self {
            timestamp,
            ip: ip.to_string(),
        })
    }

    /// Whether `line` looks like an entry at all (contains the `IP: ` marker)
    pub fn is_candidate(line: &str) -> bool {
        line.contains(IP_MARKER)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            SEPARATOR,
            IP_MARKER,
            self.ip
        )
    }
}

impl FromStr for LogEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_line(s)
    }
}

/// Parse a sequence of log lines, keeping only well-formed entries
///
/// The first line is skipped when it is the header. Lines without the
/// `IP: ` marker are ignored; marked lines that fail to parse are dropped
/// with a debug log.
pub fn parse_entries<'a, I>(lines: I) -> Vec<LogEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .filter(|(index, line)| !(*index == 0 && line.trim() == LOG_HEADER))
        .filter_map(|(_, line)| parse_candidate(line))
        .collect()
}

/// Parse a single line if it carries the entry marker
pub(crate) fn parse_candidate(line: &str) -> Option<LogEntry> {
    if !LogEntry::is_candidate(line) {
        return None;
    }

    match LogEntry::parse_line(line) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!("Skipping log line: {}", e);
            None
        }
    }
}
