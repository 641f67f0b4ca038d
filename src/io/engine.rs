//! IO state machine and the render path

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::clock::{DeviceClock, ZeroTimeStamp};
use super::diagnostics::{DiagnosticsSnapshot, IoDiagnostics, IoFault};
use super::loopback::LoopbackRing;
use super::operation::{IoCycleInfo, IoOperation};
use crate::client::{ClientInfo, ClientRegistry};
use crate::error::Result;
use crate::gain::{GainTable, UNITY_GAIN};
use crate::host::Host;
use crate::types::{ClientId, DriverConfig, ObjectId};

/// Running state of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoState {
    /// Never started, or reset since the last stop
    Idle,
    /// At least one client is running IO
    Started,
    /// The last client stopped
    Stopped,
}

#[derive(Debug)]
struct ControlState {
    state: IoState,
    active: BTreeSet<ClientId>,
    sample_rate: f64,
}

/// Start/stop bookkeeping plus the allocation-free render entry points
///
/// Control methods take a short lock; `begin_cycle`, `do_cycle`, `end_cycle`
/// and `zero_time_stamp` touch only atomics.
pub struct IoEngine {
    channels: usize,
    max_frames: u32,
    host: Arc<dyn Host>,
    registry: Arc<ClientRegistry>,
    gains: Arc<GainTable>,
    clock: DeviceClock,
    loopback: LoopbackRing,
    diagnostics: IoDiagnostics,
    running: AtomicBool,
    control: Mutex<ControlState>,
}

impl IoEngine {
    /// Create an idle engine
    #[must_use]
    pub fn new(config: &DriverConfig, registry: Arc<ClientRegistry>, host: Arc<dyn Host>) -> Self {
        let clock = DeviceClock::new(
            config.sample_rate,
            host.host_ticks_per_second(),
            config.zero_timestamp_period,
        );
        let channels = config.channels as usize;
        Self {
            channels,
            max_frames: config.max_buffer_frame_size,
            gains: Arc::clone(registry.gains()),
            registry,
            host,
            clock,
            loopback: LoopbackRing::new(config.zero_timestamp_period as usize, channels),
            diagnostics: IoDiagnostics::default(),
            running: AtomicBool::new(false),
            control: Mutex::new(ControlState {
                state: IoState::Idle,
                active: BTreeSet::new(),
                sample_rate: config.sample_rate,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> IoState {
        self.lock().state
    }

    /// Check whether any client is running IO
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clients currently running IO, sorted
    #[must_use]
    pub fn active_clients(&self) -> Vec<ClientId> {
        self.lock().active.iter().copied().collect()
    }

    /// Start IO for `client`
    ///
    /// Returns `true` when this start took the device from not running to
    /// running. Starting a client twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClient` if the client is not registered.
    pub fn start(&self, client: ClientId) -> Result<bool> {
        let mut control = self.lock();
        if control.active.contains(&client) {
            return Ok(false);
        }
        self.registry.set_active(client, true)?;
        control.active.insert(client);

        if control.state == IoState::Started {
            tracing::debug!(client = %client, "Client joined running IO");
            return Ok(false);
        }

        self.loopback.clear();
        self.clock.anchor(self.host.host_time());
        control.state = IoState::Started;
        self.running.store(true, Ordering::Release);
        tracing::info!(
            client = %client,
            sample_rate = control.sample_rate,
            seed = self.clock.seed(),
            "IO started"
        );
        Ok(true)
    }

    /// Stop IO for `client`
    ///
    /// Returns `true` when this stop left no running clients. Stopping a
    /// client that never started is a no-op.
    pub fn stop(&self, client: ClientId) -> bool {
        let mut control = self.lock();
        self.stop_locked(&mut control, client)
    }

    /// Unregister `client`, stopping its IO in the same critical section
    ///
    /// Holding the control lock across both steps keeps a concurrent
    /// `start` from re-activating a client the registry no longer holds.
    /// The flag is `true` when this removal left no running clients.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClient` if the client is not registered.
    pub fn remove_client(&self, client: ClientId) -> Result<(ClientInfo, bool)> {
        let mut control = self.lock();
        let info = self.registry.remove(client)?;
        let stopped = self.stop_locked(&mut control, client);
        Ok((info, stopped))
    }

    fn stop_locked(&self, control: &mut ControlState, client: ClientId) -> bool {
        if !control.active.remove(&client) {
            tracing::debug!(client = %client, "Stop for client not running IO");
            return false;
        }
        // The client may already be gone from the registry; its gain entry
        // went with it.
        let _ = self.registry.set_active(client, false);

        if !control.active.is_empty() {
            return false;
        }

        self.running.store(false, Ordering::Release);
        control.state = IoState::Stopped;
        let diagnostics = self.diagnostics.snapshot();
        tracing::info!(
            client = %client,
            cycles = diagnostics.cycles,
            buffers = diagnostics.buffers,
            "IO stopped"
        );
        if diagnostics.total_faults() > 0 {
            tracing::warn!(
                not_running = diagnostics.not_running,
                buffer_mismatch = diagnostics.buffer_mismatch,
                inactive_client = diagnostics.inactive_client,
                wrong_stream = diagnostics.wrong_stream,
                "Render faults since startup"
            );
        }
        true
    }

    /// Adopt a new nominal sample rate
    ///
    /// Re-anchors the clock (bumping the seed) and silences the loopback
    /// ring. A stopped engine returns to idle.
    pub fn reset(&self, sample_rate: f64) {
        let mut control = self.lock();
        control.sample_rate = sample_rate;
        self.clock.set_rate(
            sample_rate,
            self.host.host_ticks_per_second(),
            self.host.host_time(),
        );
        self.loopback.clear();
        if control.state == IoState::Stopped {
            control.state = IoState::Idle;
        }
        tracing::info!(sample_rate, seed = self.clock.seed(), "IO reset");
    }

    /// Zero time stamp for the current host time
    #[must_use]
    pub fn zero_time_stamp(&self) -> ZeroTimeStamp {
        self.clock.zero_time_stamp(self.host.host_time())
    }

    /// Counters collected by the render path
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Start of one IO operation
    ///
    /// Only counts the cycle; faults are recorded by `do_cycle`, which makes
    /// the pass-through decision.
    pub fn begin_cycle(
        &self,
        _client: ClientId,
        _operation: IoOperation,
        _frames: u32,
        _info: &IoCycleInfo,
    ) {
        self.diagnostics.record_cycle();
    }

    /// Perform one IO operation on an interleaved buffer, in place
    ///
    /// Any fault leaves `buffer` untouched and bumps a diagnostics counter.
    pub fn do_cycle(
        &self,
        stream: ObjectId,
        client: ClientId,
        operation: IoOperation,
        frames: u32,
        info: &IoCycleInfo,
        buffer: &mut [f32],
    ) {
        if !operation.will_do().will_do {
            return;
        }
        if !self.is_running() {
            self.diagnostics.record_fault(IoFault::NotRunning);
            return;
        }
        let samples = frames as usize * self.channels;
        if frames > self.max_frames || buffer.len() != samples {
            self.diagnostics.record_fault(IoFault::BufferMismatch);
            return;
        }

        match operation {
            IoOperation::ProcessOutput => {
                if stream != ObjectId::OUTPUT_STREAM {
                    self.diagnostics.record_fault(IoFault::WrongStream);
                    return;
                }
                if !self.apply_gain(client, buffer) {
                    self.diagnostics.record_fault(IoFault::InactiveClient);
                    return;
                }
            }
            IoOperation::WriteMix => {
                if stream != ObjectId::OUTPUT_STREAM {
                    self.diagnostics.record_fault(IoFault::WrongStream);
                    return;
                }
                self.loopback.write_mix(info.output_time.sample_time, buffer);
            }
            IoOperation::ReadInput => {
                if stream != ObjectId::INPUT_STREAM {
                    self.diagnostics.record_fault(IoFault::WrongStream);
                    return;
                }
                self.loopback.read_into(info.input_time.sample_time, buffer);
            }
            _ => return,
        }
        self.diagnostics.record_buffer();
    }

    /// End of one IO operation
    pub fn end_cycle(
        &self,
        _client: ClientId,
        _operation: IoOperation,
        _frames: u32,
        _info: &IoCycleInfo,
    ) {
    }

    fn apply_gain(&self, client: ClientId, buffer: &mut [f32]) -> bool {
        if !self.gains.is_active(client) {
            return false;
        }
        let Some(mut ramp) = self.gains.load_ramp(client) else {
            return false;
        };

        if ramp.is_settled() {
            let gain = ramp.current();
            if (gain - UNITY_GAIN).abs() > f32::EPSILON {
                for sample in buffer.iter_mut() {
                    *sample *= gain;
                }
            }
            return true;
        }

        for frame in buffer.chunks_exact_mut(self.channels) {
            let gain = ramp.next_gain();
            for sample in frame {
                *sample *= gain;
            }
        }
        self.gains.store_ramp(&ramp);
        true
    }
}

impl std::fmt::Debug for IoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoEngine")
            .field("channels", &self.channels)
            .field("max_frames", &self.max_frames)
            .field("running", &self.is_running())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
