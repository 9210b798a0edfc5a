//! mnkeeper Engine Library
//!
//! This library provides the core functionality of mnkeeper.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Telemetry and Observability
pub mod telemetry;

/// Effective per-coin path resolution
pub mod paths;

/// Coin registry and command dispatch
pub mod registry;

/// JSON-over-HTTP daemon client
pub mod rpc;

/// Coin daemon process launch
pub mod daemon;

/// Daemon polling supervisor
pub mod supervisor;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
