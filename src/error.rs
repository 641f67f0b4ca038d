use thiserror::Error;

use crate::property::PropertyAddress;
use crate::types::{ClientId, ObjectId};

/// Host status code (`OSStatus`)
pub type OsStatus = i32;

/// Builds a four-character code the way the host headers spell them
#[must_use]
pub const fn four_cc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// Status codes understood by the host
pub mod status {
    use super::{OsStatus, four_cc};

    #[allow(clippy::cast_possible_wrap)]
    const fn code(bytes: &[u8; 4]) -> OsStatus {
        four_cc(bytes) as OsStatus
    }

    /// `kAudioHardwareNoError`
    pub const NO_ERROR: OsStatus = 0;
    /// `kAudioHardwareUnspecifiedError`
    pub const UNSPECIFIED: OsStatus = code(b"what");
    /// `kAudioHardwareUnknownPropertyError`
    pub const UNKNOWN_PROPERTY: OsStatus = code(b"who?");
    /// `kAudioHardwareBadPropertySizeError`
    pub const BAD_PROPERTY_SIZE: OsStatus = code(b"!siz");
    /// `kAudioHardwareIllegalOperationError`
    pub const ILLEGAL_OPERATION: OsStatus = code(b"nope");
    /// `kAudioHardwareBadObjectError`
    pub const BAD_OBJECT: OsStatus = code(b"!obj");
    /// `kAudioHardwareUnsupportedOperationError`
    pub const UNSUPPORTED_OPERATION: OsStatus = code(b"unop");
    /// `kAudioDeviceUnsupportedFormatError`
    pub const UNSUPPORTED_FORMAT: OsStatus = code(b"!dat");
    /// `kAudioDevicePermissionsError`
    pub const PERMISSIONS: OsStatus = code(b"!hog");
}

/// Errors returned to the control domain
///
/// The render path never produces these; faults there fall back to
/// pass-through and show up in [`crate::io::IoDiagnostics`] instead.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The selector is not implemented for this object
    #[error("unknown property {address} on object {object_id}")]
    UnknownProperty {
        /// Object the query was made against
        object_id: ObjectId,
        /// Queried address
        address: PropertyAddress,
    },

    /// The property exists but cannot be written
    #[error("property {address} on object {object_id} is not settable")]
    NotSettable {
        /// Object the write was made against
        object_id: ObjectId,
        /// Written address
        address: PropertyAddress,
    },

    /// The written value is outside what the object accepts
    #[error("illegal value for {what}: {reason}")]
    IllegalValue {
        /// What was being set
        what: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Caller-provided buffer cannot hold the property data
    #[error("buffer too small: need {required} bytes, got {provided}")]
    BufferTooSmall {
        /// Bytes the property needs
        required: u32,
        /// Bytes the caller offered
        provided: u32,
    },

    /// A client with this id is already connected
    #[error("client {0} is already registered")]
    DuplicateClient(ClientId),

    /// No client with this id is connected
    #[error("client {0} is not registered")]
    UnknownClient(ClientId),

    /// Device creation and destruction are not supported
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Reserved for dynamic device scenarios
    #[error("device busy")]
    DeviceBusy,

    /// Object id does not name the plug-in, the device, or one of its streams
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    /// All gain slots are in use
    #[error("too many clients (capacity {capacity})")]
    TooManyClients {
        /// Slot capacity of the gain table
        capacity: usize,
    },

    /// Configuration failed validation
    #[error("invalid configuration: {field} - {reason}")]
    InvalidConfig {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration could not be loaded
    #[error("configuration error: {message}")]
    Config {
        /// Description of the failure
        message: String,
        /// The underlying source of the error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DriverError {
    /// Host status code for this error
    #[must_use]
    pub fn os_status(&self) -> OsStatus {
        match self {
            Self::UnknownProperty { .. } => status::UNKNOWN_PROPERTY,
            Self::NotSettable { .. } | Self::UnsupportedOperation(_) => {
                status::UNSUPPORTED_OPERATION
            }
            Self::IllegalValue { .. } => status::UNSUPPORTED_FORMAT,
            Self::BufferTooSmall { .. } => status::BAD_PROPERTY_SIZE,
            Self::DuplicateClient(_) | Self::UnknownClient(_) | Self::TooManyClients { .. } => {
                status::ILLEGAL_OPERATION
            }
            Self::DeviceBusy => status::PERMISSIONS,
            Self::UnknownObject(_) => status::BAD_OBJECT,
            Self::InvalidConfig { .. } | Self::Config { .. } => status::UNSPECIFIED,
        }
    }

    /// Check if the host treats this as "feature not present" rather than a failure
    #[must_use]
    pub fn is_unknown_property(&self) -> bool {
        matches!(self, Self::UnknownProperty { .. })
    }
}

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;
