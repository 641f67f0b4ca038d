//! Per-client gain with click-free smoothing

pub mod ramp;
pub mod table;

#[cfg(test)]
mod tests;

pub use ramp::{GainRamp, frames_to_converge, step_toward};
pub use table::{GainTable, InsertError, UNITY_GAIN};
