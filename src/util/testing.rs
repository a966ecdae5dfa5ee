use std::sync::Once;

use tracing::info;

use crate::logging;
use crate::parser::LogLevel;

static TEST_SETUP: Once = Once::new();

/// Install debug logging once per test binary.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        logging::set_level(LogLevel::Debug);
        info!("Test Setup complete");
    });
}
