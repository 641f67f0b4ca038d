//! IO cycle engine
//!
//! Everything the host's real-time IO thread calls lives here: start/stop
//! bookkeeping, the zero time stamp, and the begin/do/end cycle triad that
//! applies per-client gain.

pub mod clock;
pub mod diagnostics;
pub mod engine;
pub mod loopback;
pub mod operation;

#[cfg(test)]
mod tests;

pub use clock::{DeviceClock, ZeroTimeStamp};
pub use diagnostics::{DiagnosticsSnapshot, IoDiagnostics, IoFault};
pub use engine::{IoEngine, IoState};
pub use loopback::LoopbackRing;
pub use operation::{CycleTime, IoCycleInfo, IoOperation, WillDo};
