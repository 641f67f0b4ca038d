use std::fmt;

/// Host object identifier (`AudioObjectID`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// `kAudioObjectUnknown`
    pub const UNKNOWN: Self = Self(0);
    /// `kAudioObjectPlugInObject`
    pub const PLUGIN: Self = Self(1);
    /// The single virtual device
    pub const DEVICE: Self = Self(2);
    /// Input stream of the device
    pub const INPUT_STREAM: Self = Self(3);
    /// Output stream of the device
    pub const OUTPUT_STREAM: Self = Self(4);

    /// Raw value
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Host-assigned client identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Raw value
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClientId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Process identifier (`pid_t`)
pub type ProcessId = i32;

/// Which way audio flows through a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Device to client
    Input,
    /// Client to device
    Output,
}

impl Direction {
    /// Value of `kAudioStreamPropertyDirection` (1 = input, 0 = output)
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Direction::Input => 1,
            Direction::Output => 0,
        }
    }
}
