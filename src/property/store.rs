//! Property dispatch for the plug-in, the device and its streams

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use byteorder::{ByteOrder, NativeEndian};
use bytes::Bytes;

use super::address::{
    ClassId, PropertyAddress, Scope, Selector, TERMINAL_TYPE_LINE, TRANSPORT_TYPE_VIRTUAL,
};
use super::value::PropertyValue;
use crate::client::ClientRegistry;
use crate::error::{DriverError, Result};
use crate::io::IoEngine;
use crate::types::{Direction, DriverConfig, ObjectId, ProcessId, StreamFormat};

/// Configuration-change action id for a nominal sample rate change
pub const CHANGE_SAMPLE_RATE: u64 = 1;

/// What a successful `set_data` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// The value already matched; nothing to notify
    Unchanged,
    /// Applied immediately; these addresses changed
    Applied {
        /// Addresses the host should be told about
        changed: Vec<PropertyAddress>,
    },
    /// Needs the host to schedule a configuration change with this action
    ConfigurationChangeRequested {
        /// Action to hand back in `perform_configuration_change`
        action: u64,
    },
}

const PLUGIN_PROPERTIES: &[(Selector, bool)] = &[
    (Selector::BASE_CLASS, false),
    (Selector::CLASS, false),
    (Selector::OWNER, false),
    (Selector::MANUFACTURER, false),
    (Selector::OWNED_OBJECTS, false),
    (Selector::DEVICE_LIST, false),
    (Selector::TRANSLATE_UID_TO_DEVICE, false),
    (Selector::RESOURCE_BUNDLE, false),
];

const DEVICE_PROPERTIES: &[(Selector, bool)] = &[
    (Selector::BASE_CLASS, false),
    (Selector::CLASS, false),
    (Selector::OWNER, false),
    (Selector::NAME, false),
    (Selector::MANUFACTURER, false),
    (Selector::OWNED_OBJECTS, false),
    (Selector::DEVICE_UID, false),
    (Selector::MODEL_UID, false),
    (Selector::TRANSPORT_TYPE, false),
    (Selector::RELATED_DEVICES, false),
    (Selector::CLOCK_DOMAIN, false),
    (Selector::DEVICE_IS_ALIVE, false),
    (Selector::DEVICE_IS_RUNNING, false),
    (Selector::CAN_BE_DEFAULT_DEVICE, false),
    (Selector::CAN_BE_DEFAULT_SYSTEM_DEVICE, false),
    (Selector::LATENCY, false),
    (Selector::STREAMS, false),
    (Selector::CONTROL_LIST, false),
    (Selector::SAFETY_OFFSET, false),
    (Selector::NOMINAL_SAMPLE_RATE, true),
    (Selector::AVAILABLE_NOMINAL_SAMPLE_RATES, false),
    (Selector::IS_HIDDEN, false),
    (Selector::ZERO_TIME_STAMP_PERIOD, false),
    (Selector::BUFFER_FRAME_SIZE, false),
    (Selector::BUFFER_FRAME_SIZE_RANGE, false),
    (Selector::PREFERRED_CHANNELS_FOR_STEREO, false),
    (Selector::CLIENT_GAIN, true),
];

const STREAM_PROPERTIES: &[(Selector, bool)] = &[
    (Selector::BASE_CLASS, false),
    (Selector::CLASS, false),
    (Selector::OWNER, false),
    (Selector::NAME, false),
    (Selector::OWNED_OBJECTS, false),
    (Selector::STREAM_IS_ACTIVE, true),
    (Selector::STREAM_DIRECTION, false),
    (Selector::STREAM_TERMINAL_TYPE, false),
    (Selector::STREAM_STARTING_CHANNEL, false),
    (Selector::LATENCY, false),
    (Selector::STREAM_VIRTUAL_FORMAT, true),
    (Selector::STREAM_AVAILABLE_VIRTUAL_FORMATS, false),
    (Selector::STREAM_PHYSICAL_FORMAT, true),
    (Selector::STREAM_AVAILABLE_PHYSICAL_FORMATS, false),
];

#[derive(Debug)]
struct DeviceState {
    sample_rate: f64,
    pending_rate: Option<f64>,
    /// Indexed by `stream_index`
    stream_active: [bool; 2],
}

fn stream_index(object_id: ObjectId) -> Option<usize> {
    match object_id {
        ObjectId::INPUT_STREAM => Some(0),
        ObjectId::OUTPUT_STREAM => Some(1),
        _ => None,
    }
}

fn stream_direction(object_id: ObjectId) -> Direction {
    if object_id == ObjectId::INPUT_STREAM {
        Direction::Input
    } else {
        Direction::Output
    }
}

fn expect_len(data: &[u8], required: usize) -> Result<()> {
    if data.len() == required {
        Ok(())
    } else {
        #[allow(clippy::cast_possible_truncation)]
        Err(DriverError::BufferTooSmall {
            required: required as u32,
            provided: data.len() as u32,
        })
    }
}

fn qualifier_pid(qualifier: &[u8]) -> Result<ProcessId> {
    if qualifier.len() != 4 {
        return Err(DriverError::IllegalValue {
            what: "qualifier",
            reason: format!("expected a 4-byte process id, got {} bytes", qualifier.len()),
        });
    }
    Ok(NativeEndian::read_i32(qualifier))
}

/// Requested class ids from an `OwnedObjects` qualifier
fn qualifier_classes(qualifier: &[u8]) -> Vec<u32> {
    qualifier
        .chunks_exact(4)
        .map(NativeEndian::read_u32)
        .collect()
}

fn class_requested(classes: &[u32], class: ClassId) -> bool {
    classes.is_empty()
        || classes
            .iter()
            .any(|c| *c == class.0 || *c == ClassId::OBJECT.0)
}

/// Device and stream properties served through the host's
/// has/settable/size/get/set protocol
///
/// Dispatch goes through a table of (object, selector) pairs built at
/// construction; values are computed on demand so `get_size` and `get_data`
/// always agree.
pub struct PropertyStore {
    config: DriverConfig,
    registry: Arc<ClientRegistry>,
    engine: Arc<IoEngine>,
    table: HashMap<(ObjectId, Selector), bool>,
    state: Mutex<DeviceState>,
}

impl PropertyStore {
    /// Create the store for a device described by `config`
    #[must_use]
    pub fn new(config: DriverConfig, registry: Arc<ClientRegistry>, engine: Arc<IoEngine>) -> Self {
        let mut table = HashMap::new();
        let objects: [(ObjectId, &[(Selector, bool)]); 4] = [
            (ObjectId::PLUGIN, PLUGIN_PROPERTIES),
            (ObjectId::DEVICE, DEVICE_PROPERTIES),
            (ObjectId::INPUT_STREAM, STREAM_PROPERTIES),
            (ObjectId::OUTPUT_STREAM, STREAM_PROPERTIES),
        ];
        for (object_id, properties) in objects {
            for &(selector, settable) in properties {
                table.insert((object_id, selector), settable);
            }
        }

        let state = DeviceState {
            sample_rate: config.sample_rate,
            pending_rate: None,
            stream_active: [true, true],
        };
        Self {
            config,
            registry,
            engine,
            table,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current nominal sample rate
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.lock().sample_rate
    }

    /// Rate waiting for the host to perform a configuration change
    #[must_use]
    pub fn pending_sample_rate(&self) -> Option<f64> {
        self.lock().pending_rate
    }

    /// Current stream format
    #[must_use]
    pub fn stream_format(&self) -> StreamFormat {
        StreamFormat::float32(self.sample_rate(), self.config.channels)
    }

    fn check_object(object_id: ObjectId) -> Result<()> {
        match object_id {
            ObjectId::PLUGIN
            | ObjectId::DEVICE
            | ObjectId::INPUT_STREAM
            | ObjectId::OUTPUT_STREAM => Ok(()),
            other => Err(DriverError::UnknownObject(other)),
        }
    }

    fn entry(&self, object_id: ObjectId, address: &PropertyAddress) -> Result<bool> {
        Self::check_object(object_id)?;
        self.table
            .get(&(object_id, address.selector))
            .copied()
            .ok_or(DriverError::UnknownProperty {
                object_id,
                address: *address,
            })
    }

    /// Check whether `object_id` implements `address`
    #[must_use]
    pub fn has_property(&self, object_id: ObjectId, address: &PropertyAddress) -> bool {
        self.table.contains_key(&(object_id, address.selector))
    }

    /// Check whether `address` can be written
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` or `UnknownProperty`.
    pub fn is_settable(&self, object_id: ObjectId, address: &PropertyAddress) -> Result<bool> {
        self.entry(object_id, address)
    }

    /// Size in bytes of the property data
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject`, `UnknownProperty`, or `IllegalValue` for a
    /// malformed qualifier.
    pub fn get_size(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
    ) -> Result<u32> {
        let value = self.value(object_id, address, qualifier)?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(value.encoded_len() as u32)
    }

    /// Property data, encoded for the host
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if the data does not fit in `capacity`, plus
    /// the errors of [`get_size`](Self::get_size).
    pub fn get_data(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
        capacity: u32,
    ) -> Result<Bytes> {
        let value = self.value(object_id, address, qualifier)?;
        let len = value.encoded_len();
        if len > capacity as usize {
            #[allow(clippy::cast_possible_truncation)]
            return Err(DriverError::BufferTooSmall {
                required: len as u32,
                provided: capacity,
            });
        }
        Ok(value.encode())
    }

    /// Write a property
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject`, `UnknownProperty`, `NotSettable`,
    /// `BufferTooSmall` when `data` has the wrong size, or `IllegalValue` for
    /// values the device cannot take.
    pub fn set_data(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
        data: &[u8],
    ) -> Result<SetOutcome> {
        if !self.entry(object_id, address)? {
            tracing::warn!(object = %object_id, %address, "Write to read-only property");
            return Err(DriverError::NotSettable {
                object_id,
                address: *address,
            });
        }
        tracing::debug!(object = %object_id, %address, len = data.len(), "Set property");

        match address.selector {
            Selector::NOMINAL_SAMPLE_RATE => {
                expect_len(data, 8)?;
                self.request_rate(NativeEndian::read_f64(data))
            }
            Selector::CLIENT_GAIN => {
                let pid = qualifier_pid(qualifier)?;
                expect_len(data, 4)?;
                self.registry
                    .set_process_gain(pid, NativeEndian::read_f32(data))?;
                Ok(SetOutcome::Applied {
                    changed: vec![PropertyAddress::global(Selector::CLIENT_GAIN)],
                })
            }
            Selector::STREAM_IS_ACTIVE => {
                expect_len(data, 4)?;
                let active = NativeEndian::read_u32(data) != 0;
                let idx = stream_index(object_id).ok_or(DriverError::UnknownProperty {
                    object_id,
                    address: *address,
                })?;
                let mut state = self.lock();
                if state.stream_active[idx] == active {
                    return Ok(SetOutcome::Unchanged);
                }
                state.stream_active[idx] = active;
                Ok(SetOutcome::Applied {
                    changed: vec![PropertyAddress::global(Selector::STREAM_IS_ACTIVE)],
                })
            }
            Selector::STREAM_VIRTUAL_FORMAT | Selector::STREAM_PHYSICAL_FORMAT => {
                expect_len(data, StreamFormat::ENCODED_LEN)?;
                let format = StreamFormat::decode(data).ok_or_else(|| DriverError::IllegalValue {
                    what: "stream format",
                    reason: "truncated description".to_string(),
                })?;
                if !format.is_float32_layout(self.config.channels) {
                    return Err(DriverError::IllegalValue {
                        what: "stream format",
                        reason: format!(
                            "only packed float32 with {} channels is supported",
                            self.config.channels
                        ),
                    });
                }
                self.request_rate(format.sample_rate)
            }
            _ => Err(DriverError::NotSettable {
                object_id,
                address: *address,
            }),
        }
    }

    fn request_rate(&self, rate: f64) -> Result<SetOutcome> {
        if !self.config.supports_rate(rate) {
            tracing::warn!(rate, "Rejected unsupported sample rate");
            return Err(DriverError::IllegalValue {
                what: "sample rate",
                reason: format!("{rate} Hz is not supported"),
            });
        }
        let mut state = self.lock();
        if (state.sample_rate - rate).abs() < f64::EPSILON {
            state.pending_rate = None;
            return Ok(SetOutcome::Unchanged);
        }
        state.pending_rate = Some(rate);
        tracing::info!(from = state.sample_rate, to = rate, "Sample rate change requested");
        Ok(SetOutcome::ConfigurationChangeRequested {
            action: CHANGE_SAMPLE_RATE,
        })
    }

    /// Apply the change a configuration request was made for
    ///
    /// Returns the new sample rate, or `None` when nothing was pending for
    /// `action`.
    pub fn apply_pending_change(&self, action: u64) -> Option<f64> {
        if action != CHANGE_SAMPLE_RATE {
            return None;
        }
        let mut state = self.lock();
        let rate = state.pending_rate.take()?;
        state.sample_rate = rate;
        Some(rate)
    }

    /// Forget a requested change the host declined
    pub fn discard_pending_change(&self, action: u64) {
        if action == CHANGE_SAMPLE_RATE {
            self.lock().pending_rate = None;
        }
    }

    fn value(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
    ) -> Result<PropertyValue> {
        self.entry(object_id, address)?;
        let value = match object_id {
            ObjectId::PLUGIN => self.plugin_value(address, qualifier),
            ObjectId::DEVICE => self.device_value(address, qualifier)?,
            _ => self.stream_value(object_id, address),
        };
        value.ok_or(DriverError::UnknownProperty {
            object_id,
            address: *address,
        })
    }

    fn plugin_value(&self, address: &PropertyAddress, qualifier: &[u8]) -> Option<PropertyValue> {
        let value = match address.selector {
            Selector::BASE_CLASS => PropertyValue::U32(ClassId::OBJECT.0),
            Selector::CLASS => PropertyValue::U32(ClassId::PLUGIN.0),
            Selector::OWNER => PropertyValue::U32(ObjectId::UNKNOWN.0),
            Selector::MANUFACTURER => PropertyValue::Text(self.config.manufacturer.clone()),
            Selector::OWNED_OBJECTS => {
                let classes = qualifier_classes(qualifier);
                let mut owned = Vec::new();
                if class_requested(&classes, ClassId::DEVICE) {
                    owned.push(ObjectId::DEVICE);
                }
                PropertyValue::ObjectList(owned)
            }
            Selector::DEVICE_LIST => PropertyValue::ObjectList(vec![ObjectId::DEVICE]),
            Selector::TRANSLATE_UID_TO_DEVICE => {
                let matches = std::str::from_utf8(qualifier)
                    .is_ok_and(|uid| uid == self.config.device_uid);
                let id = if matches {
                    ObjectId::DEVICE
                } else {
                    ObjectId::UNKNOWN
                };
                PropertyValue::U32(id.0)
            }
            Selector::RESOURCE_BUNDLE => PropertyValue::Text(String::new()),
            _ => return None,
        };
        Some(value)
    }

    fn device_value(
        &self,
        address: &PropertyAddress,
        qualifier: &[u8],
    ) -> Result<Option<PropertyValue>> {
        let config = &self.config;
        let value = match address.selector {
            Selector::BASE_CLASS => PropertyValue::U32(ClassId::OBJECT.0),
            Selector::CLASS => PropertyValue::U32(ClassId::DEVICE.0),
            Selector::OWNER => PropertyValue::U32(ObjectId::PLUGIN.0),
            Selector::NAME => PropertyValue::Text(config.device_name.clone()),
            Selector::MANUFACTURER => PropertyValue::Text(config.manufacturer.clone()),
            Selector::OWNED_OBJECTS => {
                let classes = qualifier_classes(qualifier);
                if class_requested(&classes, ClassId::STREAM) {
                    PropertyValue::ObjectList(streams_in_scope(address.scope))
                } else {
                    PropertyValue::ObjectList(Vec::new())
                }
            }
            Selector::STREAMS => PropertyValue::ObjectList(streams_in_scope(address.scope)),
            Selector::DEVICE_UID => PropertyValue::Text(config.device_uid.clone()),
            Selector::MODEL_UID => PropertyValue::Text(config.model_uid.clone()),
            Selector::TRANSPORT_TYPE => PropertyValue::U32(TRANSPORT_TYPE_VIRTUAL),
            Selector::RELATED_DEVICES => PropertyValue::ObjectList(vec![ObjectId::DEVICE]),
            Selector::CLOCK_DOMAIN | Selector::IS_HIDDEN => PropertyValue::U32(0),
            Selector::DEVICE_IS_ALIVE
            | Selector::CAN_BE_DEFAULT_DEVICE
            | Selector::CAN_BE_DEFAULT_SYSTEM_DEVICE => PropertyValue::flag(true),
            Selector::DEVICE_IS_RUNNING => PropertyValue::flag(self.engine.is_running()),
            Selector::LATENCY => PropertyValue::U32(config.latency_frames),
            Selector::SAFETY_OFFSET => PropertyValue::U32(config.safety_offset_frames),
            Selector::CONTROL_LIST => PropertyValue::ObjectList(Vec::new()),
            Selector::NOMINAL_SAMPLE_RATE => PropertyValue::F64(self.sample_rate()),
            Selector::AVAILABLE_NOMINAL_SAMPLE_RATES => PropertyValue::Ranges(
                config
                    .supported_sample_rates
                    .iter()
                    .map(|r| (*r, *r))
                    .collect(),
            ),
            Selector::ZERO_TIME_STAMP_PERIOD => PropertyValue::U32(config.zero_timestamp_period),
            Selector::BUFFER_FRAME_SIZE => PropertyValue::U32(config.buffer_frame_size),
            Selector::BUFFER_FRAME_SIZE_RANGE => PropertyValue::Ranges(vec![(
                f64::from(config.buffer_frame_size),
                f64::from(config.max_buffer_frame_size),
            )]),
            Selector::PREFERRED_CHANNELS_FOR_STEREO => PropertyValue::U32List(vec![1, 2]),
            Selector::CLIENT_GAIN => {
                let pid = qualifier_pid(qualifier)?;
                PropertyValue::F32(self.registry.process_gain(pid))
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    fn stream_value(&self, object_id: ObjectId, address: &PropertyAddress) -> Option<PropertyValue> {
        let direction = stream_direction(object_id);
        let value = match address.selector {
            Selector::BASE_CLASS => PropertyValue::U32(ClassId::OBJECT.0),
            Selector::CLASS => PropertyValue::U32(ClassId::STREAM.0),
            Selector::OWNER => PropertyValue::U32(ObjectId::DEVICE.0),
            Selector::NAME => {
                let label = match direction {
                    Direction::Input => "Input",
                    Direction::Output => "Output",
                };
                PropertyValue::Text(format!("{} {label}", self.config.device_name))
            }
            Selector::OWNED_OBJECTS => PropertyValue::ObjectList(Vec::new()),
            Selector::STREAM_IS_ACTIVE => {
                let idx = stream_index(object_id)?;
                PropertyValue::flag(self.lock().stream_active[idx])
            }
            Selector::STREAM_DIRECTION => PropertyValue::U32(direction.as_u32()),
            Selector::STREAM_TERMINAL_TYPE => PropertyValue::U32(TERMINAL_TYPE_LINE),
            Selector::STREAM_STARTING_CHANNEL => PropertyValue::U32(1),
            Selector::LATENCY => PropertyValue::U32(0),
            Selector::STREAM_VIRTUAL_FORMAT | Selector::STREAM_PHYSICAL_FORMAT => {
                PropertyValue::Format(self.stream_format())
            }
            Selector::STREAM_AVAILABLE_VIRTUAL_FORMATS
            | Selector::STREAM_AVAILABLE_PHYSICAL_FORMATS => PropertyValue::RangedFormats(
                self.config
                    .supported_sample_rates
                    .iter()
                    .map(|r| (StreamFormat::float32(*r, self.config.channels), *r, *r))
                    .collect(),
            ),
            _ => return None,
        };
        Some(value)
    }
}

/// Streams of the device visible in `scope`
fn streams_in_scope(scope: Scope) -> Vec<ObjectId> {
    match scope {
        Scope::INPUT => vec![ObjectId::INPUT_STREAM],
        Scope::OUTPUT => vec![ObjectId::OUTPUT_STREAM],
        Scope::GLOBAL | Scope::WILDCARD => vec![ObjectId::INPUT_STREAM, ObjectId::OUTPUT_STREAM],
        _ => Vec::new(),
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("properties", &self.table.len())
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}
