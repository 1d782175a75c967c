// # iplog-core
//
// Core library for the public IP change logger.
//
// ## Architecture Overview
//
// This library provides the core functionality for recording public IP changes:
// - **Resolver**: Trait for looking up the current public IP address
// - **LogStore**: Trait for the append-only IP change log
// - **IpLogDriver**: Polling loop that orchestrates resolve → compare → append
// - **ResolverRegistry**: Plugin-based registry for resolver strategies
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from resolver implementations
// 2. **Plugin-Based**: Resolvers are registered by strategy name, no hard-coded if-else
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Append-Only**: Log entries are never rewritten, truncated or compacted

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod entry;
pub mod store;

// Re-export core types for convenience
pub use traits::{Resolver, LogStore};
pub use engine::{IpLogDriver, DriverEvent, TickOutcome};
pub use registry::ResolverRegistry;
pub use config::{IpLogConfig, ResolverConfig};
pub use entry::LogEntry;
pub use error::{Error, Result};
pub use store::{MemoryLogStore, FileLogStore};
