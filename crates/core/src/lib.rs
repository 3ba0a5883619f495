//! Core types and shared functionality for hubble.
//!
//! This crate provides:
//! - Cache facade with Redis and Memcached backends
//! - Resolution orchestrator contract (cache read, resolve, write back)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod resolve;

pub use cache::{BackendState, Cache, CacheError, Cached};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use resolve::{Resolver, resolve_cached};
