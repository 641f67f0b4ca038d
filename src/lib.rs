//! # appfaders-driver
//!
//! Core of a virtual output device for the macOS audio server that applies
//! an independent volume fader to every connected application.
//!
//! ## Features
//!
//! - Property protocol for the plug-in, the device and its two streams
//! - Client tracking with per-client and per-process gain
//! - Click-free gain ramps applied on the real-time IO thread
//! - Zero time stamps and a loopback of the device mix to its input
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use appfaders_driver::prelude::*;
//!
//! # fn example() -> Result<(), DriverError> {
//! let device = DeviceController::new(DriverConfig::default(), Arc::new(SystemHost::new()))?;
//!
//! device.add_client(ObjectId::DEVICE, ClientId(1), 4242)?;
//! device.start_io(ObjectId::DEVICE, ClientId(1))?;
//! device.set_process_gain(4242, 0.5)?;
//!
//! let info = IoCycleInfo::at(0, 2, 0.0);
//! let mut buffer = [1.0f32; 4];
//! device.do_io_operation(
//!     ObjectId::DEVICE,
//!     ObjectId::OUTPUT_STREAM,
//!     ClientId(1),
//!     IoOperation::ProcessOutput,
//!     2,
//!     &info,
//!     &mut buffer,
//! );
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Architecture
//!
//! - **Control plane**: [`DeviceController`] routes host calls to the
//!   [`ClientRegistry`](client::ClientRegistry) and the
//!   [`PropertyStore`](property::PropertyStore)
//! - **Render path**: the [`IoEngine`](io::IoEngine) reads the lock-free
//!   [`GainTable`](gain::GainTable) from the host's IO thread
//! - **Host**: reached only through the [`Host`] trait

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

pub mod client;
pub mod device;
pub mod gain;
pub mod host;
pub mod io;
pub mod property;

// Re-exports
pub use client::{ClientInfo, ClientRegistry};
pub use device::DeviceController;
pub use error::{DriverError, OsStatus, Result};
pub use gain::GainTable;
pub use host::{Host, SystemHost};
pub use io::{IoCycleInfo, IoOperation, IoState, ZeroTimeStamp};
pub use property::{PropertyAddress, Scope, Selector, SetOutcome};
pub use types::{ClientId, DriverConfig, ObjectId, ProcessId, StreamFormat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        ClientId, DeviceController, DriverConfig, DriverError, Host, IoCycleInfo, IoOperation,
        ObjectId, PropertyAddress, Selector, SetOutcome, SystemHost,
    };
}
