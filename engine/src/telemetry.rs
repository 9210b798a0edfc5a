//! Logging setup
//!
//! Installs a `tracing-subscriber` registry writing to stderr, so command
//! output on stdout stays clean (`getinfo` prints JSON there).
//!
//! `RUST_LOG` overrides the level picked from `--log` or the config file.
//! Debug builds log human-readable lines, release builds log JSON.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events are shown at the selected level
const WORKSPACE_TARGETS: [&str; 3] = ["mnkeeper_engine", "mnkeeper_fetch", "pivx"];

/// Filter directives for `level` across the workspace crates
fn directives(level: &str) -> String {
    let mut out = level.to_string();
    for target in WORKSPACE_TARGETS {
        out.push_str(&format!(",{}={}", target, level));
    }
    out
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_telemetry_with_level(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(debug_assertions)]
    let installed = registry
        .with(
            fmt::layer()
                .pretty()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();

    #[cfg(not(debug_assertions))]
    let installed = registry
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(std::io::stderr),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("Subscriber already installed, keeping it");
    }
}
