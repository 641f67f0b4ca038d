
use std::sync::Arc;

use crate::client::ClientRegistry;
use crate::gain::GainTable;
use crate::host::Host;
use crate::io::IoEngine;
use crate::property::PropertyStore;
use crate::testing::{MockHost, test_config};
use crate::types::DriverConfig;

struct Fixture {
    store: PropertyStore,
    registry: Arc<ClientRegistry>,
    engine: Arc<IoEngine>,
}

fn fixture_with(config: DriverConfig) -> Fixture {
    let gains = Arc::new(GainTable::new(
        config.max_clients,
        config.gain_ramp_step(),
        config.max_gain,
    ));
    let registry = Arc::new(ClientRegistry::new(gains));
    let host: Arc<dyn Host> = Arc::new(MockHost::new());
    let engine = Arc::new(IoEngine::new(&config, Arc::clone(&registry), host));
    let store = PropertyStore::new(config, Arc::clone(&registry), Arc::clone(&engine));
    Fixture {
        store,
        registry,
        engine,
    }
}

fn fixture() -> Fixture {
    fixture_with(test_config())
}
