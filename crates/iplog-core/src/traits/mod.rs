//! Core traits for the IP change logger
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Resolver`]: Look up the current public IP address
//! - [`LogStore`]: Append-only IP change log

pub mod resolver;
pub mod log_store;

pub use resolver::{Resolver, ResolverFactory};
pub use log_store::LogStore;
