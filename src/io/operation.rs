//! IO operations and per-cycle timing

use std::fmt;

use crate::error::four_cc;

/// Operation the host performs within an IO cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoOperation {
    /// `kAudioServerPlugInIOOperationThread`
    Thread,
    /// `kAudioServerPlugInIOOperationCycle`
    Cycle,
    /// Fill the input stream's buffer
    ReadInput,
    /// `kAudioServerPlugInIOOperationConvertInput`
    ConvertInput,
    /// `kAudioServerPlugInIOOperationProcessInput`
    ProcessInput,
    /// Per-client output processing, where client gain is applied
    ProcessOutput,
    /// `kAudioServerPlugInIOOperationMixOutput`
    MixOutput,
    /// `kAudioServerPlugInIOOperationProcessMix`
    ProcessMix,
    /// `kAudioServerPlugInIOOperationConvertMix`
    ConvertMix,
    /// Deliver the device mix
    WriteMix,
}

impl IoOperation {
    /// Every operation, in the order the host runs them
    pub const ALL: [Self; 10] = [
        Self::Thread,
        Self::Cycle,
        Self::ReadInput,
        Self::ConvertInput,
        Self::ProcessInput,
        Self::ProcessOutput,
        Self::MixOutput,
        Self::ProcessMix,
        Self::ConvertMix,
        Self::WriteMix,
    ];

    /// Host operation id
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::Thread => four_cc(b"thrd"),
            Self::Cycle => four_cc(b"cycl"),
            Self::ReadInput => four_cc(b"read"),
            Self::ConvertInput => four_cc(b"cinp"),
            Self::ProcessInput => four_cc(b"pinp"),
            Self::ProcessOutput => four_cc(b"pout"),
            Self::MixOutput => four_cc(b"mixo"),
            Self::ProcessMix => four_cc(b"pmix"),
            Self::ConvertMix => four_cc(b"cmix"),
            Self::WriteMix => four_cc(b"rite"),
        }
    }

    /// Operation for a host id
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.id() == id)
    }

    /// Whether the device takes part in this operation
    #[must_use]
    pub fn will_do(self) -> WillDo {
        let will_do = matches!(self, Self::ReadInput | Self::ProcessOutput | Self::WriteMix);
        WillDo {
            will_do,
            in_place: true,
        }
    }
}

impl fmt::Display for IoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.id().to_be_bytes();
        write!(f, "'{}'", String::from_utf8_lossy(&bytes))
    }
}

/// Answer to the host's will-do query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WillDo {
    /// The device handles the operation
    pub will_do: bool,
    /// The operation works on the buffer in place
    pub in_place: bool,
}

/// Sample time paired with host time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleTime {
    /// Device sample time
    pub sample_time: f64,
    /// Host clock ticks
    pub host_time: u64,
}

/// Timing of one IO cycle (`AudioServerPlugInIOCycleInfo`)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IoCycleInfo {
    /// Host's running cycle count
    pub cycle_counter: u64,
    /// Frames per buffer this cycle
    pub nominal_io_buffer_frame_size: u32,
    /// When the input data was captured
    pub input_time: CycleTime,
    /// When the output data will be presented
    pub output_time: CycleTime,
    /// Time at the start of the cycle
    pub current_time: CycleTime,
}

impl IoCycleInfo {
    /// Cycle info with the same sample time for input and output
    #[must_use]
    pub fn at(cycle_counter: u64, frames: u32, sample_time: f64) -> Self {
        let time = CycleTime {
            sample_time,
            host_time: 0,
        };
        Self {
            cycle_counter,
            nominal_io_buffer_frame_size: frames,
            input_time: time,
            output_time: time,
            current_time: time,
        }
    }
}
