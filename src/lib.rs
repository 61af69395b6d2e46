//! Gateway Cache - short-lived response cache for an API gateway client
//!
//! Absorbs repeated authorization checks (TTL + LRU bound) and batches
//! usage-report transactions in a hierarchical in-memory store.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::ResponseCache;
pub use client::{GatewayClient, Transport};
pub use config::{CacheSettings, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
