//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains the webhook client and the generation use case.

pub mod config;
pub mod generate_assessment;
pub mod progress;
pub mod webhook_service;
