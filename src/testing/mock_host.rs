//! Scriptable host for driving the device without the audio daemon

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::host::Host;
use crate::property::{PropertyAddress, Selector};
use crate::types::ObjectId;

/// One `properties_changed` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Object whose properties changed
    pub object_id: ObjectId,
    /// Addresses reported
    pub addresses: Vec<PropertyAddress>,
}

#[derive(Debug, Default)]
struct Recorded {
    notifications: Vec<Notification>,
    change_requests: Vec<(ObjectId, u64)>,
}

/// Host with a manual clock that records everything the driver tells it
#[derive(Debug)]
pub struct MockHost {
    now: AtomicU64,
    ticks_per_second: f64,
    recorded: Mutex<Recorded>,
}

impl MockHost {
    /// Host with a nanosecond clock starting at zero
    #[must_use]
    pub fn new() -> Self {
        Self::with_ticks_per_second(1_000_000_000.0)
    }

    /// Host whose clock runs at `ticks_per_second`
    #[must_use]
    pub fn with_ticks_per_second(ticks_per_second: f64) -> Self {
        Self {
            now: AtomicU64::new(0),
            ticks_per_second,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the host clock
    pub fn set_time(&self, ticks: u64) {
        self.now.store(ticks, Ordering::SeqCst);
    }

    /// Move the host clock forward
    pub fn advance(&self, ticks: u64) {
        self.now.fetch_add(ticks, Ordering::SeqCst);
    }

    /// Every notification so far
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// Check whether `selector` was reported changed on `object_id`
    #[must_use]
    pub fn was_notified(&self, object_id: ObjectId, selector: Selector) -> bool {
        self.lock().notifications.iter().any(|n| {
            n.object_id == object_id && n.addresses.iter().any(|a| a.selector == selector)
        })
    }

    /// Every configuration change request so far
    #[must_use]
    pub fn change_requests(&self) -> Vec<(ObjectId, u64)> {
        self.lock().change_requests.clone()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        let mut recorded = self.lock();
        recorded.notifications.clear();
        recorded.change_requests.clear();
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn properties_changed(&self, object_id: ObjectId, addresses: &[PropertyAddress]) {
        self.lock().notifications.push(Notification {
            object_id,
            addresses: addresses.to_vec(),
        });
    }

    fn request_configuration_change(&self, device_id: ObjectId, action: u64) {
        self.lock().change_requests.push((device_id, action));
    }

    fn host_time(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn host_ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }
}
