//! Shared setup for the integration tests

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary
///
/// `RUST_LOG` narrows or widens the output; driver events default to debug.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env()
            .add_directive("appfaders_driver=debug".parse().unwrap());

        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
