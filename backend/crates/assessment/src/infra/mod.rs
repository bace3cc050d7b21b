//! Infrastructure Layer
//!
//! Concrete implementations of domain interfaces.

pub mod http;
