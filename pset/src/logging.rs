//! Diagnostics for configuration loading and finalization.
//!
//! At `debug`, every registration in a process (source, module, parameter
//! set, path), each file loaded and each finalization is traced with its
//! label and counts. At `warn`, output modules whose `SelectEvents` gate
//! names a path the process lacks are reported. Events go to stderr; the
//! rendered configurations and check reports on stdout never depend on
//! `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directive used when `RUST_LOG` is unset or unparsable.
const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the stderr subscriber, filtered by `RUST_LOG`.
///
/// ```bash
/// RUST_LOG=pset::core::process=debug pset schedule job.cfg
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_warn() {
        assert_eq!(env_filter(None).to_string(), DEFAULT_DIRECTIVE);
        assert_eq!(env_filter(Some("pset=loud")).to_string(), DEFAULT_DIRECTIVE);
    }

    #[test]
    fn keeps_module_directives() {
        let filter = env_filter(Some("pset::core::process=debug"));
        assert_eq!(filter.to_string(), "pset::core::process=debug");
    }
}
