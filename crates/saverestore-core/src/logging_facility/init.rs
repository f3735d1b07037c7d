//! Logging initialization

use serde::Deserialize;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Logging profile, selectable from the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable output, debug level
    #[default]
    Development,
    /// JSON structured output, info level
    Production,
    /// No subscriber; tests install their own capture layer
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call installs a subscriber. `RUST_LOG` overrides the
/// profile's default filter.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("saverestore=debug")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("saverestore=info")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Test => {}
    });
}
