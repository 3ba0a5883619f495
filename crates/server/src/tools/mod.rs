//! MCP tool implementations.
//!
//! This module contains all tools exposed by the hubble server.

pub mod healthcheck;
pub mod lookup;

pub use healthcheck::healthcheck_impl;
pub use lookup::{UrlParams, lookup_impl};
