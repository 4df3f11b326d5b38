//! Favorite and follow relations with store-owned counters and a
//! cache-aside existence index.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
