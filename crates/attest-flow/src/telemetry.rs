// Tracing initialization for flow hosts and tests

use std::sync::Once;

use anyhow::Result;
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::FlowConfig;

static TEST_INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` (default `info`). JSON output
/// includes the current span and the span list, so every line carries the run
/// it belongs to.
pub fn init_tracing(log_level: Option<&str>, json_output: Option<bool>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))?;

    let subscriber = Registry::default().with(env_filter);

    if json_output.unwrap_or(false) {
        let json_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_span_list(true);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))?;
    } else {
        let fmt_layer = fmt::layer()
            .pretty()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_level(true);
        tracing::subscriber::set_global_default(subscriber.with(fmt_layer))?;
    }

    Ok(())
}

/// Install the subscriber described by a flow configuration
pub fn init_from_config(config: &FlowConfig) -> Result<()> {
    init_tracing(Some(config.log_level.as_str()), Some(config.json_logs))
}

/// Initialize test logging once per test binary
pub fn init_test_logging() {
    TEST_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let fmt_layer = fmt::layer().with_target(true).with_test_writer();
        let _ = tracing::subscriber::set_global_default(Registry::default().with(filter).with(fmt_layer));
    });
}
