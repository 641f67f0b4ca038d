//! The object the plug-in adapter calls into

use std::sync::Arc;

use bytes::Bytes;

use crate::client::{ClientInfo, ClientRegistry};
use crate::error::{DriverError, Result};
use crate::gain::GainTable;
use crate::host::Host;
use crate::io::{IoCycleInfo, IoEngine, IoOperation, WillDo, ZeroTimeStamp};
use crate::property::{PropertyAddress, PropertyStore, Selector, SetOutcome};
use crate::types::{ClientId, DriverConfig, ObjectId, ProcessId};

/// Owner of the single virtual device
///
/// Every host entry point of the plug-in maps onto one method here. Control
/// methods validate the device id and return typed errors; render methods
/// (`zero_time_stamp`, `begin_io_operation`, `do_io_operation`,
/// `end_io_operation`) never fail and never block.
pub struct DeviceController {
    config: DriverConfig,
    host: Arc<dyn Host>,
    registry: Arc<ClientRegistry>,
    engine: Arc<IoEngine>,
    properties: PropertyStore,
}

impl DeviceController {
    /// Build the device from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` does not validate.
    pub fn new(config: DriverConfig, host: Arc<dyn Host>) -> Result<Self> {
        config.validate()?;

        let gains = Arc::new(GainTable::new(
            config.max_clients,
            config.gain_ramp_step(),
            config.max_gain,
        ));
        let registry = Arc::new(ClientRegistry::new(gains));
        let engine = Arc::new(IoEngine::new(
            &config,
            Arc::clone(&registry),
            Arc::clone(&host),
        ));
        let properties = PropertyStore::new(
            config.clone(),
            Arc::clone(&registry),
            Arc::clone(&engine),
        );

        tracing::info!(
            name = %config.device_name,
            uid = %config.device_uid,
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Device created"
        );
        Ok(Self {
            config,
            host,
            registry,
            engine,
            properties,
        })
    }

    /// Configuration the device was built from
    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Connected clients
    #[must_use]
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// IO engine
    #[must_use]
    pub fn engine(&self) -> &Arc<IoEngine> {
        &self.engine
    }

    /// Property store
    #[must_use]
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    fn check_device(device_id: ObjectId) -> Result<()> {
        if device_id == ObjectId::DEVICE {
            Ok(())
        } else {
            Err(DriverError::UnknownObject(device_id))
        }
    }

    fn notify(&self, object_id: ObjectId, addresses: &[PropertyAddress]) {
        self.host.properties_changed(object_id, addresses);
    }

    fn notify_running(&self) {
        self.notify(
            ObjectId::DEVICE,
            &[PropertyAddress::global(Selector::DEVICE_IS_RUNNING)],
        );
    }

    /// The device is static; creating devices is not supported
    ///
    /// # Errors
    ///
    /// Always returns `UnsupportedOperation`.
    #[allow(clippy::unused_self)]
    pub fn create_device(
        &self,
        _description: &str,
        _client: Option<&ClientInfo>,
    ) -> Result<ObjectId> {
        Err(DriverError::UnsupportedOperation("create device"))
    }

    /// The device is static; destroying it is not supported
    ///
    /// # Errors
    ///
    /// Always returns `UnsupportedOperation`.
    #[allow(clippy::unused_self)]
    pub fn destroy_device(&self, _device_id: ObjectId) -> Result<()> {
        Err(DriverError::UnsupportedOperation("destroy device"))
    }

    /// Register a client of the device
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id, `DuplicateClient`, or
    /// `TooManyClients`.
    pub fn add_client(
        &self,
        device_id: ObjectId,
        client_id: ClientId,
        process_id: ProcessId,
    ) -> Result<()> {
        self.add_client_info(device_id, ClientInfo::new(client_id, process_id))
    }

    /// Register a client with full info
    ///
    /// # Errors
    ///
    /// Same as [`add_client`](Self::add_client).
    pub fn add_client_info(&self, device_id: ObjectId, info: ClientInfo) -> Result<()> {
        Self::check_device(device_id)?;
        self.registry.add_info(info)
    }

    /// Unregister a client, stopping its IO first
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id or `UnknownClient`.
    pub fn remove_client(&self, device_id: ObjectId, client_id: ClientId) -> Result<ClientInfo> {
        Self::check_device(device_id)?;
        let (info, stopped) = self.engine.remove_client(client_id)?;
        if stopped {
            self.notify_running();
        }
        Ok(info)
    }

    /// Connected clients, sorted by id
    #[must_use]
    pub fn clients(&self) -> Vec<ClientInfo> {
        self.registry.snapshot()
    }

    /// Check whether an object implements a property
    #[must_use]
    pub fn has_property(&self, object_id: ObjectId, address: &PropertyAddress) -> bool {
        self.properties.has_property(object_id, address)
    }

    /// Check whether a property can be written
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` or `UnknownProperty`.
    pub fn is_property_settable(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
    ) -> Result<bool> {
        self.properties.is_settable(object_id, address)
    }

    /// Size of a property's data
    ///
    /// # Errors
    ///
    /// See [`PropertyStore::get_size`].
    pub fn get_property_data_size(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
    ) -> Result<u32> {
        self.properties.get_size(object_id, address, qualifier)
    }

    /// A property's data
    ///
    /// # Errors
    ///
    /// See [`PropertyStore::get_data`].
    pub fn get_property_data(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
        capacity: u32,
    ) -> Result<Bytes> {
        self.properties
            .get_data(object_id, address, qualifier, capacity)
    }

    /// Write a property and tell the host what changed
    ///
    /// # Errors
    ///
    /// See [`PropertyStore::set_data`].
    pub fn set_property_data(
        &self,
        object_id: ObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
        data: &[u8],
    ) -> Result<SetOutcome> {
        let outcome = self
            .properties
            .set_data(object_id, address, qualifier, data)?;
        match &outcome {
            SetOutcome::Unchanged => {}
            SetOutcome::Applied { changed } => self.notify(object_id, changed),
            SetOutcome::ConfigurationChangeRequested { action } => {
                self.host
                    .request_configuration_change(ObjectId::DEVICE, *action);
            }
        }
        Ok(outcome)
    }

    /// Apply a change the host scheduled after a configuration request
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id.
    pub fn perform_configuration_change(&self, device_id: ObjectId, action: u64) -> Result<()> {
        Self::check_device(device_id)?;
        let Some(rate) = self.properties.apply_pending_change(action) else {
            tracing::debug!(action, "Nothing pending for configuration change");
            return Ok(());
        };

        self.engine.reset(rate);
        tracing::info!(sample_rate = rate, "Sample rate changed");

        self.notify(
            ObjectId::DEVICE,
            &[PropertyAddress::global(Selector::NOMINAL_SAMPLE_RATE)],
        );
        let formats = [
            PropertyAddress::global(Selector::STREAM_VIRTUAL_FORMAT),
            PropertyAddress::global(Selector::STREAM_PHYSICAL_FORMAT),
        ];
        self.notify(ObjectId::INPUT_STREAM, &formats);
        self.notify(ObjectId::OUTPUT_STREAM, &formats);
        Ok(())
    }

    /// Drop a change the host decided not to perform
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id.
    pub fn abort_configuration_change(&self, device_id: ObjectId, action: u64) -> Result<()> {
        Self::check_device(device_id)?;
        self.properties.discard_pending_change(action);
        tracing::info!(action, "Configuration change aborted");
        Ok(())
    }

    /// Start IO for a client
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id or `UnknownClient`.
    pub fn start_io(&self, device_id: ObjectId, client_id: ClientId) -> Result<()> {
        Self::check_device(device_id)?;
        if self.engine.start(client_id)? {
            self.notify_running();
        }
        Ok(())
    }

    /// Stop IO for a client; stopping a client that is not running succeeds
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id.
    pub fn stop_io(&self, device_id: ObjectId, client_id: ClientId) -> Result<()> {
        Self::check_device(device_id)?;
        if self.engine.stop(client_id) {
            self.notify_running();
        }
        Ok(())
    }

    /// Zero time stamp of the device clock
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id.
    pub fn zero_time_stamp(&self, device_id: ObjectId) -> Result<ZeroTimeStamp> {
        Self::check_device(device_id)?;
        Ok(self.engine.zero_time_stamp())
    }

    /// Whether the device takes part in an IO operation
    ///
    /// Unknown operation ids are declined.
    ///
    /// # Errors
    ///
    /// Returns `UnknownObject` for a wrong device id.
    pub fn will_do_io_operation(&self, device_id: ObjectId, operation_id: u32) -> Result<WillDo> {
        Self::check_device(device_id)?;
        Ok(IoOperation::from_id(operation_id).map_or(
            WillDo {
                will_do: false,
                in_place: true,
            },
            IoOperation::will_do,
        ))
    }

    /// Render path: start of an IO operation
    pub fn begin_io_operation(
        &self,
        device_id: ObjectId,
        client_id: ClientId,
        operation: IoOperation,
        frames: u32,
        info: &IoCycleInfo,
    ) {
        if device_id == ObjectId::DEVICE {
            self.engine.begin_cycle(client_id, operation, frames, info);
        }
    }

    /// Render path: perform an IO operation in place on `buffer`
    #[allow(clippy::too_many_arguments)]
    pub fn do_io_operation(
        &self,
        device_id: ObjectId,
        stream_id: ObjectId,
        client_id: ClientId,
        operation: IoOperation,
        frames: u32,
        info: &IoCycleInfo,
        buffer: &mut [f32],
    ) {
        if device_id == ObjectId::DEVICE {
            self.engine
                .do_cycle(stream_id, client_id, operation, frames, info, buffer);
        }
    }

    /// Render path: end of an IO operation
    pub fn end_io_operation(
        &self,
        device_id: ObjectId,
        client_id: ClientId,
        operation: IoOperation,
        frames: u32,
        info: &IoCycleInfo,
    ) {
        if device_id == ObjectId::DEVICE {
            self.engine.end_cycle(client_id, operation, frames, info);
        }
    }

    /// Set one client's fader
    ///
    /// # Errors
    ///
    /// Returns `UnknownClient` or `IllegalValue`.
    pub fn set_client_gain(&self, client_id: ClientId, gain: f32) -> Result<()> {
        self.registry.set_gain(client_id, gain)
    }

    /// Set the fader of every client of a process
    ///
    /// Returns how many connected clients changed.
    ///
    /// # Errors
    ///
    /// Returns `IllegalValue` for NaN or negative gains.
    pub fn set_process_gain(&self, process_id: ProcessId, gain: f32) -> Result<usize> {
        let updated = self.registry.set_process_gain(process_id, gain)?;
        self.notify(
            ObjectId::DEVICE,
            &[PropertyAddress::global(Selector::CLIENT_GAIN)],
        );
        Ok(updated)
    }

    /// Target gain of a client
    #[must_use]
    pub fn client_gain(&self, client_id: ClientId) -> Option<f32> {
        self.registry.gains().target_gain(client_id)
    }
}

impl std::fmt::Debug for DeviceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("device", &self.config.device_uid)
            .field("registry", &self.registry)
            .field("engine", &self.engine)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
