//! The host (audio daemon) as seen from the core
//!
//! The plug-in adapter implements [`Host`] on top of the
//! `AudioServerPlugInHostInterface` it receives at initialization and hands
//! it to [`DeviceController::new`](crate::DeviceController::new).

use std::time::Instant;

use crate::property::PropertyAddress;
use crate::types::ObjectId;

/// Services the host provides to the driver
pub trait Host: Send + Sync {
    /// Tell the host that properties of `object_id` changed
    fn properties_changed(&self, object_id: ObjectId, addresses: &[PropertyAddress]);

    /// Ask the host to schedule a configuration change
    ///
    /// The host answers by calling
    /// [`DeviceController::perform_configuration_change`](crate::DeviceController::perform_configuration_change)
    /// (or the abort variant) once IO is quiesced.
    fn request_configuration_change(&self, device_id: ObjectId, action: u64);

    /// Current host clock value in ticks
    ///
    /// Called from the render path; must not block or allocate.
    fn host_time(&self) -> u64;

    /// Host clock rate
    fn host_ticks_per_second(&self) -> f64;
}

/// Stand-alone host backed by a monotonic nanosecond clock
///
/// Used when the core runs outside the audio daemon. Notifications and
/// configuration requests are only logged.
#[derive(Debug, Clone)]
pub struct SystemHost {
    epoch: Instant,
}

impl SystemHost {
    /// Create a host whose clock starts now
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for SystemHost {
    fn properties_changed(&self, object_id: ObjectId, addresses: &[PropertyAddress]) {
        for address in addresses {
            tracing::debug!(object = %object_id, %address, "Property changed");
        }
    }

    fn request_configuration_change(&self, device_id: ObjectId, action: u64) {
        tracing::warn!(
            device = %device_id,
            action,
            "Configuration change requested with no host to perform it"
        );
    }

    #[allow(clippy::cast_possible_truncation)]
    fn host_time(&self) -> u64 {
        // Nanoseconds fit in u64 for ~584 years of uptime
        self.epoch.elapsed().as_nanos() as u64
    }

    fn host_ticks_per_second(&self) -> f64 {
        1_000_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_host_clock_monotonic() {
        let host = SystemHost::new();
        let a = host.host_time();
        let b = host.host_time();
        assert!(b >= a);
        assert!((host.host_ticks_per_second() - 1e9).abs() < f64::EPSILON);
    }
}
