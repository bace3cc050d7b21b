//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Assessment, Question)
//! - Domain value objects (FormValues, ResponseShape, DebugInfo)
//! - Domain services (envelope detection, normalization)
//! - Transport trait (interface)

pub mod entities;
pub mod envelope;
pub mod normalizer;
pub mod transport;
pub mod value_objects;
