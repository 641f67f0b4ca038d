//! Lock-free per-client gain storage

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use super::ramp::GainRamp;
use crate::types::ClientId;

const EMPTY: u64 = 0;
const TOMBSTONE: u64 = u64::MAX;
const OCCUPIED: u64 = 1 << 32;

fn key_for(client: ClientId) -> u64 {
    OCCUPIED | u64::from(client.0)
}

/// Gain value applied when a client has no entry
pub const UNITY_GAIN: f32 = 1.0;

struct GainSlot {
    key: AtomicU64,
    target: AtomicU32,
    current: AtomicU32,
    active: AtomicBool,
}

impl GainSlot {
    fn empty() -> Self {
        Self {
            key: AtomicU64::new(EMPTY),
            target: AtomicU32::new(UNITY_GAIN.to_bits()),
            current: AtomicU32::new(UNITY_GAIN.to_bits()),
            active: AtomicBool::new(false),
        }
    }
}

/// Why an insert did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The client already has a slot
    Exists,
    /// Every slot is occupied
    Full,
}

/// Fixed-capacity open-addressed table of client gains
///
/// # Concurrency
///
/// Mutating calls (`insert`, `remove`, `set_target`, `set_active`,
/// `clear_tombstones`) must be serialized by the caller; the
/// [`ClientRegistry`](crate::client::ClientRegistry) holds its lock across
/// them. Render-side calls (`current_gain`, `load_ramp`, `store_ramp`,
/// `is_active`) only load, store, and compare-exchange atomics, never
/// allocate, and probe at most `capacity` slots.
pub struct GainTable {
    slots: Box<[GainSlot]>,
    mask: usize,
    len: AtomicUsize,
    step: f32,
    max_gain: f32,
}

impl GainTable {
    /// Create a table with `capacity` slots
    ///
    /// `capacity` is rounded up to a power of two. `ramp_step` is the
    /// per-frame increment of the smoothing ramp.
    #[must_use]
    pub fn new(capacity: usize, ramp_step: f32, max_gain: f32) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let slots = (0..capacity).map(|_| GainSlot::empty()).collect();
        Self {
            slots,
            mask: capacity - 1,
            len: AtomicUsize::new(0),
            step: ramp_step,
            max_gain,
        }
    }

    /// Number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of clients with an entry
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Check if the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-frame ramp increment
    #[must_use]
    pub fn ramp_step(&self) -> f32 {
        self.step
    }

    /// Upper gain clamp
    #[must_use]
    pub fn max_gain(&self) -> f32 {
        self.max_gain
    }

    #[inline]
    fn home(&self, client: ClientId) -> usize {
        (client.0.wrapping_mul(0x9E37_79B9) as usize) & self.mask
    }

    #[inline]
    fn find(&self, client: ClientId) -> Option<usize> {
        let key = key_for(client);
        let home = self.home(client);
        for probe in 0..self.slots.len() {
            let idx = (home + probe) & self.mask;
            match self.slots[idx].key.load(Ordering::Acquire) {
                EMPTY => return None,
                k if k == key => return Some(idx),
                _ => {}
            }
        }
        None
    }

    /// Check whether `client` has an entry
    #[must_use]
    pub fn contains(&self, client: ClientId) -> bool {
        self.find(client).is_some()
    }

    /// Add an entry for `client` starting (and targeting) `initial_gain`
    ///
    /// # Errors
    ///
    /// Returns `InsertError::Exists` if the client already has an entry and
    /// `InsertError::Full` if no slot is free.
    pub fn insert(&self, client: ClientId, initial_gain: f32) -> Result<(), InsertError> {
        if self.find(client).is_some() {
            return Err(InsertError::Exists);
        }
        let home = self.home(client);
        let gain = self.clamp(initial_gain).to_bits();
        for probe in 0..self.slots.len() {
            let idx = (home + probe) & self.mask;
            let slot = &self.slots[idx];
            let k = slot.key.load(Ordering::Acquire);
            if k == EMPTY || k == TOMBSTONE {
                slot.target.store(gain, Ordering::Relaxed);
                slot.current.store(gain, Ordering::Relaxed);
                slot.active.store(false, Ordering::Relaxed);
                // Publishes the values above
                slot.key.store(key_for(client), Ordering::Release);
                self.len.fetch_add(1, Ordering::AcqRel);
                return Ok(());
            }
        }
        Err(InsertError::Full)
    }

    /// Drop the entry for `client`; returns whether one existed
    pub fn remove(&self, client: ClientId) -> bool {
        let Some(idx) = self.find(client) else {
            return false;
        };
        let slot = &self.slots[idx];
        slot.active.store(false, Ordering::Release);
        slot.key.store(TOMBSTONE, Ordering::Release);
        self.len.fetch_sub(1, Ordering::AcqRel);
        true
    }

    /// Turn every tombstone back into an empty slot
    ///
    /// Only valid while the table has no entries, otherwise a probe chain
    /// could be cut short.
    pub fn clear_tombstones(&self) {
        if !self.is_empty() {
            return;
        }
        for slot in self.slots.iter() {
            let _ = slot.key.compare_exchange(
                TOMBSTONE,
                EMPTY,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }

    fn clamp(&self, gain: f32) -> f32 {
        if gain.is_nan() {
            return UNITY_GAIN;
        }
        gain.clamp(0.0, self.max_gain)
    }

    /// Store a new target gain; the render path ramps toward it
    ///
    /// Returns `false` if the client has no entry.
    pub fn set_target(&self, client: ClientId, gain: f32) -> bool {
        let Some(idx) = self.find(client) else {
            return false;
        };
        self.slots[idx]
            .target
            .store(self.clamp(gain).to_bits(), Ordering::Release);
        true
    }

    /// Target gain for `client`, if it has an entry
    #[must_use]
    pub fn target_gain(&self, client: ClientId) -> Option<f32> {
        self.find(client)
            .map(|idx| f32::from_bits(self.slots[idx].target.load(Ordering::Acquire)))
    }

    /// Gain currently applied for `client`, unity if it has no entry
    #[must_use]
    pub fn current_gain(&self, client: ClientId) -> f32 {
        self.find(client).map_or(UNITY_GAIN, |idx| {
            f32::from_bits(self.slots[idx].current.load(Ordering::Acquire))
        })
    }

    /// Mark whether `client` is running IO
    pub fn set_active(&self, client: ClientId, active: bool) -> bool {
        let Some(idx) = self.find(client) else {
            return false;
        };
        self.slots[idx].active.store(active, Ordering::Release);
        true
    }

    /// Check whether `client` is running IO
    #[must_use]
    pub fn is_active(&self, client: ClientId) -> bool {
        self.find(client)
            .is_some_and(|idx| self.slots[idx].active.load(Ordering::Acquire))
    }

    /// Snapshot `client`'s gain state for one buffer of render work
    #[must_use]
    pub fn load_ramp(&self, client: ClientId) -> Option<GainRamp> {
        let idx = self.find(client)?;
        let slot = &self.slots[idx];
        let loaded = slot.current.load(Ordering::Acquire);
        let target = f32::from_bits(slot.target.load(Ordering::Acquire));
        Some(GainRamp::new(idx, key_for(client), loaded, target, self.step))
    }

    /// Publish the gain a ramp reached
    ///
    /// Dropped silently if the slot changed hands since `load_ramp`.
    pub fn store_ramp(&self, ramp: &GainRamp) {
        let slot = &self.slots[ramp.slot];
        if slot.key.load(Ordering::Acquire) != ramp.key {
            return;
        }
        let _ = slot.current.compare_exchange(
            ramp.loaded_bits,
            ramp.current().to_bits(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Advance `client`'s ramp by `frames` without touching audio
    ///
    /// Returns the resulting gain (unity for unknown clients).
    pub fn advance(&self, client: ClientId, frames: u32) -> f32 {
        let Some(mut ramp) = self.load_ramp(client) else {
            return UNITY_GAIN;
        };
        let mut gain = ramp.current();
        for _ in 0..frames {
            gain = ramp.next_gain();
            if ramp.is_settled() {
                break;
            }
        }
        self.store_ramp(&ramp);
        gain
    }

    /// Jump `client` straight to its target, skipping the ramp
    pub fn settle(&self, client: ClientId) -> bool {
        let Some(idx) = self.find(client) else {
            return false;
        };
        let slot = &self.slots[idx];
        let target = slot.target.load(Ordering::Acquire);
        slot.current.store(target, Ordering::Release);
        true
    }
}

impl std::fmt::Debug for GainTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GainTable")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("step", &self.step)
            .field("max_gain", &self.max_gain)
            .finish()
    }
}
