//! Connected client tracking

/// Registry of connected clients
pub mod registry;


pub use registry::{ClientInfo, ClientRegistry};
