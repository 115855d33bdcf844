//! gitcal Library
//!
//! Scrapes a user's public contribution calendar, aggregates it into weekly
//! buckets and serves it as JSON behind a single-slot, time-based cache.

pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod server;
