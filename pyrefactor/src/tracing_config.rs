//! Log setup for the binary.
//!
//! The library only emits `tracing` events. A subscriber is installed when
//! `PYREFACTOR_LOG` (or `RUST_LOG`) is set, or when `--verbose` is passed,
//! and it always writes to stderr so stdout stays the rewritten source.
//!
//! ```bash
//! PYREFACTOR_LOG=debug pyrefactor src/
//! PYREFACTOR_LOG="pyrefactor::session=debug" pyrefactor -r fold-constants app.py
//! ```

use crate::constants::LOG_ENV_VAR;
use tracing_subscriber::EnvFilter;

/// Filter used by `--verbose` when no environment filter is set.
pub const VERBOSE_FILTER: &str = "pyrefactor=debug";

/// Builds the filter from `PYREFACTOR_LOG`, falling back to `RUST_LOG`, then
/// to [`VERBOSE_FILTER`] when `verbose` is set.
fn build_filter(verbose: bool) -> Option<EnvFilter> {
    if let Ok(value) = std::env::var(LOG_ENV_VAR) {
        return Some(EnvFilter::builder().parse_lossy(value));
    }
    if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
        return Some(EnvFilter::from_default_env());
    }
    verbose.then(|| EnvFilter::new(VERBOSE_FILTER))
}

/// Installs the global subscriber.
///
/// Does nothing when no filter applies, or when a subscriber is already
/// installed.
pub fn init_tracing(verbose: bool) {
    let Some(filter) = build_filter(verbose) else {
        return;
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
    if installed.is_err() {
        tracing::trace!("tracing subscriber already installed");
    }
}
