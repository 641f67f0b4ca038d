//! Render-path counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Reason a render call fell back to pass-through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFault {
    /// Called while the device was not running
    NotRunning,
    /// Buffer length disagrees with frames and channels, or too many frames
    BufferMismatch,
    /// Client unknown or not started
    InactiveClient,
    /// Operation called for a stream it does not apply to
    WrongStream,
}

/// Atomic counters the render path bumps
#[derive(Debug, Default)]
pub struct IoDiagnostics {
    cycles: AtomicU64,
    buffers: AtomicU64,
    not_running: AtomicU64,
    buffer_mismatch: AtomicU64,
    inactive_client: AtomicU64,
    wrong_stream: AtomicU64,
}

impl IoDiagnostics {
    pub(crate) fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_buffer(&self) {
        self.buffers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self, fault: IoFault) {
        let counter = match fault {
            IoFault::NotRunning => &self.not_running,
            IoFault::BufferMismatch => &self.buffer_mismatch,
            IoFault::InactiveClient => &self.inactive_client,
            IoFault::WrongStream => &self.wrong_stream,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            buffers: self.buffers.load(Ordering::Relaxed),
            not_running: self.not_running.load(Ordering::Relaxed),
            buffer_mismatch: self.buffer_mismatch.load(Ordering::Relaxed),
            inactive_client: self.inactive_client.load(Ordering::Relaxed),
            wrong_stream: self.wrong_stream.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`IoDiagnostics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    /// `begin_cycle` calls
    pub cycles: u64,
    /// Buffers processed without fault
    pub buffers: u64,
    /// Calls while stopped
    pub not_running: u64,
    /// Buffers with the wrong size
    pub buffer_mismatch: u64,
    /// Calls for unknown or stopped clients
    pub inactive_client: u64,
    /// Calls on the wrong stream
    pub wrong_stream: u64,
}

impl DiagnosticsSnapshot {
    /// Sum of all fault counters
    #[must_use]
    pub fn total_faults(&self) -> u64 {
        self.not_running + self.buffer_mismatch + self.inactive_client + self.wrong_stream
    }
}
