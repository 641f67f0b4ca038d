//! Device clock anchored on the host clock
//!
//! The device's sample clock runs at exactly the nominal rate against the
//! host clock, starting from an anchor taken when IO starts. Zero time stamps
//! are the period boundaries of that clock.

use std::hint;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering, fence};

/// One point of the device clock, as handed to the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroTimeStamp {
    /// Sample time of the most recent period boundary
    pub sample_time: f64,
    /// Host time at that boundary
    pub host_time: u64,
    /// Changes whenever the timeline is re-anchored
    pub seed: u64,
}

/// Reader attempts before falling back to the previous anchor
const MAX_READ_ATTEMPTS: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    host_time: u64,
    ticks_per_frame: f64,
    seed: u64,
}

#[derive(Debug)]
struct AnchorCell {
    host_time: AtomicU64,
    ticks_per_frame: AtomicU64,
    seed: AtomicU64,
}

impl AnchorCell {
    fn new(anchor: Anchor) -> Self {
        Self {
            host_time: AtomicU64::new(anchor.host_time),
            ticks_per_frame: AtomicU64::new(anchor.ticks_per_frame.to_bits()),
            seed: AtomicU64::new(anchor.seed),
        }
    }

    fn load(&self) -> Anchor {
        Anchor {
            host_time: self.host_time.load(Ordering::Relaxed),
            ticks_per_frame: f64::from_bits(self.ticks_per_frame.load(Ordering::Relaxed)),
            seed: self.seed.load(Ordering::Relaxed),
        }
    }

    fn store(&self, anchor: Anchor) {
        self.host_time.store(anchor.host_time, Ordering::Relaxed);
        self.ticks_per_frame
            .store(anchor.ticks_per_frame.to_bits(), Ordering::Relaxed);
        self.seed.store(anchor.seed, Ordering::Relaxed);
    }
}

/// Anchor state shared with the render path
///
/// Published through a sequence lock: the writer copies the published anchor
/// aside, makes the sequence odd, stores the new anchor, then makes it even
/// again. A reader that finds the sequence odd reads the copy instead of
/// waiting, and every read is bounded by `MAX_READ_ATTEMPTS`. Writers must be
/// serialized by the caller.
#[derive(Debug)]
pub struct DeviceClock {
    sequence: AtomicU64,
    current: AnchorCell,
    previous: AnchorCell,
    period: AtomicU32,
}

impl DeviceClock {
    /// Create an unanchored clock
    #[must_use]
    pub fn new(sample_rate: f64, host_ticks_per_second: f64, period: u32) -> Self {
        let anchor = Anchor {
            host_time: 0,
            ticks_per_frame: host_ticks_per_second / sample_rate,
            seed: 1,
        };
        Self {
            sequence: AtomicU64::new(0),
            current: AnchorCell::new(anchor),
            previous: AnchorCell::new(anchor),
            period: AtomicU32::new(period),
        }
    }

    /// Open a write and store the new anchor, leaving the sequence odd
    ///
    /// Returns the sequence to hand to [`Self::end_write`].
    pub(super) fn begin_write(
        &self,
        host_time: u64,
        ticks_per_frame: f64,
        bump_seed: bool,
    ) -> u64 {
        let published = self.current.load();
        fence(Ordering::Release);
        self.previous.store(published);
        fence(Ordering::Release);

        let sequence = self.sequence.load(Ordering::Relaxed);
        self.sequence.store(sequence.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.current.store(Anchor {
            host_time,
            ticks_per_frame,
            seed: if bump_seed {
                published.seed.wrapping_add(1)
            } else {
                published.seed
            },
        });
        sequence
    }

    /// Publish a write opened by [`Self::begin_write`]
    pub(super) fn end_write(&self, sequence: u64) {
        self.sequence
            .store(sequence.wrapping_add(2), Ordering::Release);
    }

    fn write(&self, host_time: u64, ticks_per_frame: f64, bump_seed: bool) {
        let sequence = self.begin_write(host_time, ticks_per_frame, bump_seed);
        self.end_write(sequence);
    }

    /// Restart the timeline at `host_time`
    pub fn anchor(&self, host_time: u64) {
        let ticks = self.current.load().ticks_per_frame;
        self.write(host_time, ticks, true);
        tracing::debug!(host_time, seed = self.seed(), "Clock anchored");
    }

    /// Change the nominal rate and restart the timeline at `host_time`
    pub fn set_rate(&self, sample_rate: f64, host_ticks_per_second: f64, host_time: u64) {
        self.write(host_time, host_ticks_per_second / sample_rate, true);
        tracing::debug!(sample_rate, seed = self.seed(), "Clock rate changed");
    }

    /// Current seed
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.current.seed.load(Ordering::Acquire)
    }

    /// Frames between zero time stamps
    #[must_use]
    pub fn period(&self) -> u32 {
        self.period.load(Ordering::Relaxed)
    }

    fn read(&self) -> Anchor {
        for _ in 0..MAX_READ_ATTEMPTS {
            let before = self.sequence.load(Ordering::Acquire);
            let cell = if before & 1 == 0 {
                &self.current
            } else {
                &self.previous
            };
            let anchor = cell.load();
            fence(Ordering::Acquire);
            if self.sequence.load(Ordering::Relaxed) == before {
                return anchor;
            }
            hint::spin_loop();
        }
        self.previous.load()
    }

    /// Zero time stamp for the period boundary at or before `now`
    ///
    /// Render-safe: no locks, no allocation.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn zero_time_stamp(&self, now: u64) -> ZeroTimeStamp {
        let Anchor {
            host_time: anchor,
            ticks_per_frame,
            seed,
        } = self.read();
        let period = f64::from(self.period());
        let ticks_per_period = ticks_per_frame * period;

        let elapsed = now.saturating_sub(anchor) as f64;
        let periods = if ticks_per_period > 0.0 {
            (elapsed / ticks_per_period).floor()
        } else {
            0.0
        };

        ZeroTimeStamp {
            sample_time: periods * period,
            host_time: anchor + (periods * ticks_per_period) as u64,
            seed,
        }
    }
}
