//! Linear gain smoothing

/// Move `current` one step of size `step` toward `target`
///
/// Never overshoots: once the remaining distance is within one step the
/// result is exactly `target`.
#[must_use]
pub fn step_toward(current: f32, target: f32, step: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= step {
        target
    } else if delta > 0.0 {
        current + step
    } else {
        current - step
    }
}

/// Frames needed for a ramp from `current` to reach `target`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn frames_to_converge(current: f32, target: f32, step: f32) -> u32 {
    if step <= 0.0 {
        return u32::MAX;
    }
    ((target - current).abs() / step).ceil() as u32
}

/// Render-side view of one client's gain for the duration of a cycle
///
/// Loaded from the [`GainTable`](super::GainTable) at the start of a buffer,
/// advanced once per frame, and committed back when the buffer is done.
#[derive(Debug, Clone, Copy)]
pub struct GainRamp {
    pub(super) slot: usize,
    pub(super) key: u64,
    pub(super) loaded_bits: u32,
    current: f32,
    target: f32,
    step: f32,
}

impl GainRamp {
    pub(super) fn new(
        slot: usize,
        key: u64,
        loaded_bits: u32,
        target: f32,
        step: f32,
    ) -> Self {
        Self {
            slot,
            key,
            loaded_bits,
            current: f32::from_bits(loaded_bits),
            target,
            step,
        }
    }

    /// Advance one frame and return the gain to apply to it
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        self.current = step_toward(self.current, self.target, self.step);
        self.current
    }

    /// Gain reached so far
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Gain the ramp is heading to
    #[must_use]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Check whether the ramp has reached its target
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.current.to_bits() == self.target.to_bits()
    }
}
