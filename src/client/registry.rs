use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use crate::error::{DriverError, Result};
use crate::gain::{GainTable, InsertError, UNITY_GAIN};
use crate::types::{ClientId, ProcessId};

/// A connected application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Host-assigned client id
    pub client_id: ClientId,
    /// Owning process
    pub process_id: ProcessId,
    /// Bundle identifier, when the host supplied one
    pub bundle_id: Option<String>,
    /// When the host added the client
    pub connected_at: SystemTime,
}

impl ClientInfo {
    /// Create client info stamped with the current time
    #[must_use]
    pub fn new(client_id: ClientId, process_id: ProcessId) -> Self {
        Self {
            client_id,
            process_id,
            bundle_id: None,
            connected_at: SystemTime::now(),
        }
    }

    /// Attach a bundle identifier
    #[must_use]
    pub fn with_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }
}

#[derive(Default)]
struct RegistryState {
    clients: HashMap<ClientId, ClientInfo>,
    /// Fader positions chosen per process, applied to clients as they connect
    process_gains: HashMap<ProcessId, f32>,
}

/// Registry of clients connected to the device
///
/// Control-domain only. Every mutation of the gain table happens while the
/// registry lock is held, so the gain table never holds an entry for a
/// client the registry does not know.
pub struct ClientRegistry {
    state: Mutex<RegistryState>,
    gains: Arc<GainTable>,
}

impl ClientRegistry {
    /// Create an empty registry backed by `gains`
    #[must_use]
    pub fn new(gains: Arc<GainTable>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            gains,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Gain table shared with the render path
    #[must_use]
    pub fn gains(&self) -> &Arc<GainTable> {
        &self.gains
    }

    /// Register a client
    ///
    /// # Errors
    ///
    /// Returns `DuplicateClient` if the id is already registered and
    /// `TooManyClients` if the gain table is full.
    pub fn add(&self, client_id: ClientId, process_id: ProcessId) -> Result<()> {
        self.add_info(ClientInfo::new(client_id, process_id))
    }

    /// Register a client with full info
    ///
    /// # Errors
    ///
    /// Returns `DuplicateClient` if the id is already registered and
    /// `TooManyClients` if the gain table is full.
    pub fn add_info(&self, info: ClientInfo) -> Result<()> {
        let mut state = self.lock();
        let client_id = info.client_id;
        if state.clients.contains_key(&client_id) {
            tracing::warn!(client = %client_id, "Rejected duplicate client");
            return Err(DriverError::DuplicateClient(client_id));
        }

        let initial = state
            .process_gains
            .get(&info.process_id)
            .copied()
            .unwrap_or(UNITY_GAIN);

        match self.gains.insert(client_id, initial) {
            Ok(()) => {}
            // The registry and gain table disagree; refuse rather than alias
            Err(InsertError::Exists) => return Err(DriverError::DuplicateClient(client_id)),
            Err(InsertError::Full) => {
                tracing::warn!(
                    client = %client_id,
                    capacity = self.gains.capacity(),
                    "Gain table full"
                );
                return Err(DriverError::TooManyClients {
                    capacity: self.gains.capacity(),
                });
            }
        }

        tracing::info!(
            client = %client_id,
            pid = info.process_id,
            bundle = info.bundle_id.as_deref().unwrap_or("-"),
            gain = initial,
            "Client added"
        );
        state.clients.insert(client_id, info);
        Ok(())
    }

    /// Unregister a client and drop its gain entry
    ///
    /// # Errors
    ///
    /// Returns `UnknownClient` if the id is not registered.
    pub fn remove(&self, client_id: ClientId) -> Result<ClientInfo> {
        let mut state = self.lock();
        let info = state
            .clients
            .remove(&client_id)
            .ok_or(DriverError::UnknownClient(client_id))?;

        self.gains.remove(client_id);
        if state.clients.is_empty() {
            self.gains.clear_tombstones();
        }

        tracing::info!(client = %client_id, pid = info.process_id, "Client removed");
        Ok(info)
    }

    /// Look up a client
    #[must_use]
    pub fn lookup(&self, client_id: ClientId) -> Option<ClientInfo> {
        self.lock().clients.get(&client_id).cloned()
    }

    /// Check whether a client is registered
    #[must_use]
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.lock().clients.contains_key(&client_id)
    }

    /// Ids of every client owned by `process_id`, sorted
    #[must_use]
    pub fn clients_for_process(&self, process_id: ProcessId) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .lock()
            .clients
            .values()
            .filter(|c| c.process_id == process_id)
            .map(|c| c.client_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// All registered clients, sorted by id
    #[must_use]
    pub fn snapshot(&self) -> Vec<ClientInfo> {
        let mut clients: Vec<ClientInfo> = self.lock().clients.values().cloned().collect();
        clients.sort_by_key(|c| c.client_id);
        clients
    }

    /// Number of registered clients
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().clients.len()
    }

    /// Check if no clients are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().clients.is_empty()
    }

    /// Set the target gain of one client
    ///
    /// # Errors
    ///
    /// Returns `UnknownClient` if the id is not registered and `IllegalValue`
    /// for NaN or negative gains.
    pub fn set_gain(&self, client_id: ClientId, gain: f32) -> Result<()> {
        check_gain(gain)?;
        let state = self.lock();
        if !state.clients.contains_key(&client_id) {
            return Err(DriverError::UnknownClient(client_id));
        }
        if !self.gains.set_target(client_id, gain) {
            return Err(DriverError::UnknownClient(client_id));
        }
        tracing::debug!(client = %client_id, gain, "Client gain set");
        Ok(())
    }

    /// Mark whether a client is running IO
    ///
    /// Deactivating also settles the client's ramp on its target so a later
    /// start does not resume a half-finished fade.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClient` if the id is not registered.
    pub fn set_active(&self, client_id: ClientId, active: bool) -> Result<()> {
        let state = self.lock();
        if !state.clients.contains_key(&client_id) || !self.gains.set_active(client_id, active) {
            return Err(DriverError::UnknownClient(client_id));
        }
        if !active {
            self.gains.settle(client_id);
        }
        Ok(())
    }

    /// Set the fader of a whole process
    ///
    /// Applies to every current client of the process and is remembered for
    /// clients the process connects later. Returns how many clients changed.
    ///
    /// # Errors
    ///
    /// Returns `IllegalValue` for NaN or negative gains.
    pub fn set_process_gain(&self, process_id: ProcessId, gain: f32) -> Result<usize> {
        check_gain(gain)?;
        let mut state = self.lock();
        let clamped = gain.min(self.gains.max_gain());
        state.process_gains.insert(process_id, clamped);

        let mut updated = 0;
        for info in state.clients.values().filter(|c| c.process_id == process_id) {
            if self.gains.set_target(info.client_id, clamped) {
                updated += 1;
            }
        }
        tracing::debug!(pid = process_id, gain = clamped, updated, "Process gain set");
        Ok(updated)
    }

    /// Fader position for `process_id`, unity when never set
    #[must_use]
    pub fn process_gain(&self, process_id: ProcessId) -> f32 {
        self.lock()
            .process_gains
            .get(&process_id)
            .copied()
            .unwrap_or(UNITY_GAIN)
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("clients", &self.len())
            .field("gains", &self.gains)
            .finish()
    }
}

fn check_gain(gain: f32) -> Result<()> {
    if gain.is_nan() || gain < 0.0 {
        return Err(DriverError::IllegalValue {
            what: "gain",
            reason: format!("{gain} is not a non-negative number"),
        });
    }
    Ok(())
}
