//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations for the webhook client:
//! - Injectable time source
//! - TTL cache with capacity eviction
//! - Exponential backoff rate limiting
//! - Outbound payload sanitization

pub mod cache;
pub mod clock;
pub mod rate_limit;
pub mod sanitize;
