//! Core types

/// Driver configuration
pub mod config;
pub mod format;
/// Object, client and process identifiers
pub mod ids;

pub use config::{DriverConfig, DriverConfigBuilder};
pub use format::StreamFormat;
pub use ids::{ClientId, Direction, ObjectId, ProcessId};
