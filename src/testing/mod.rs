//! Test support: a host double and canned configurations

pub mod mock_host;

use std::sync::Arc;

pub use mock_host::{MockHost, Notification};

use crate::device::DeviceController;
use crate::error::Result;
use crate::types::DriverConfig;

/// Small configuration suited to tests: stereo, 48 kHz, 4-frame ramp
#[must_use]
pub fn test_config() -> DriverConfig {
    DriverConfig::builder()
        .channels(2)
        .buffer_frame_size(64)
        .zero_timestamp_period(4096)
        .gain_ramp_frames(4)
        .max_clients(16)
        .build()
}

/// Controller wired to a fresh [`MockHost`]
///
/// # Errors
///
/// Returns an error if `config` does not validate.
pub fn controller_with(config: DriverConfig) -> Result<(DeviceController, Arc<MockHost>)> {
    let host = Arc::new(MockHost::new());
    let controller = DeviceController::new(config, Arc::clone(&host) as Arc<dyn crate::Host>)?;
    Ok((controller, host))
}
