//! Loopback ring carrying the device mix to the input stream

use std::sync::atomic::{AtomicU32, Ordering};

/// Fixed ring of interleaved `f32` samples indexed by sample time
///
/// Samples are stored as bits in atomics so the ring can be shared without a
/// lock. Only the render thread reads and writes samples; the control path
/// only clears the ring while IO is stopped.
pub struct LoopbackRing {
    samples: Box<[AtomicU32]>,
    frames: usize,
    channels: usize,
}

impl LoopbackRing {
    /// Create a silent ring of `frames` frames
    #[must_use]
    pub fn new(frames: usize, channels: usize) -> Self {
        let samples = (0..frames * channels)
            .map(|_| AtomicU32::new(0.0f32.to_bits()))
            .collect();
        Self {
            samples,
            frames,
            channels,
        }
    }

    /// Ring length in frames
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn start_index(&self, sample_time: f64) -> usize {
        let frame = sample_time.max(0.0) as u64;
        (frame % self.frames as u64) as usize * self.channels
    }

    /// Add `mix` into the ring starting at `sample_time`
    pub fn write_mix(&self, sample_time: f64, mix: &[f32]) {
        let len = self.samples.len();
        let mut idx = self.start_index(sample_time);
        for &sample in mix {
            let cell = &self.samples[idx];
            let sum = f32::from_bits(cell.load(Ordering::Relaxed)) + sample;
            cell.store(sum.to_bits(), Ordering::Relaxed);
            idx += 1;
            if idx == len {
                idx = 0;
            }
        }
    }

    /// Move the ring contents at `sample_time` into `out`, leaving silence
    pub fn read_into(&self, sample_time: f64, out: &mut [f32]) {
        let len = self.samples.len();
        let mut idx = self.start_index(sample_time);
        let silence = 0.0f32.to_bits();
        for sample in out {
            *sample = f32::from_bits(self.samples[idx].swap(silence, Ordering::Relaxed));
            idx += 1;
            if idx == len {
                idx = 0;
            }
        }
    }

    /// Silence the whole ring
    pub fn clear(&self) {
        let silence = 0.0f32.to_bits();
        for cell in &self.samples {
            cell.store(silence, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for LoopbackRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackRing")
            .field("frames", &self.frames)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}
