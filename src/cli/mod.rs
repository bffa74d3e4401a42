//! CLI command definitions and logging setup for the demo binary.
//!
//! Uses clap derive macros for argument definitions and a reloadable
//! `tracing-subscriber` filter so `--verbose` can take effect after the
//! command line has been resolved.

pub mod args;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

/// Handle for adjusting the log filter after startup.
pub type LogHandle = reload::Handle<EnvFilter, Registry>;

/// Install the stderr subscriber.
///
/// `RUST_LOG` always takes precedence; without it only warnings are shown
/// until [`set_verbose`] is called.
pub fn init_logging() -> LogHandle {
    let (filter, handle) = reload::Layer::new(default_filter(false));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
    handle
}

/// Raise the default level to DEBUG when `verbose` is set.
pub fn set_verbose(handle: &LogHandle, verbose: bool) {
    if verbose {
        let _ = handle.modify(|filter| *filter = default_filter(true));
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    EnvFilter::from_default_env().add_directive(level.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_builds_for_both_levels() {
        // Should not panic regardless of RUST_LOG.
        let _ = default_filter(false);
        let _ = default_filter(true);
    }

    #[test]
    fn set_verbose_without_subscriber_is_harmless() {
        let (_layer, handle) = reload::Layer::<EnvFilter, Registry>::new(default_filter(false));
        set_verbose(&handle, true);
        set_verbose(&handle, false);
    }
}
