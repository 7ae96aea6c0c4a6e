//! Shared test support: tracing setup, a fake of the echo-only backend and
//! the contract tables run against it.

#![allow(dead_code)]

pub mod fake;
pub mod suite;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialise tracing once per test binary. `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,restcontract=debug"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer().compact())
            .init();
    });
}
