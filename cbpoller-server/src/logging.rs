//! Tracing bootstrap for the `cbpoller` binary.

use std::env;

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "info";
const VERBOSE_FILTER: &str = "info,cbpoller_core=debug,cbpoller_server=debug";

/// Install the global subscriber.
///
/// Filter precedence:
/// 1) `RUST_LOG`
/// 2) `CBPOLLER_LOG`
/// 3) internal default, raised to debug by `verbose`
pub fn init(verbose: bool, format: LogFormat) {
    let directives = pick_filter(
        env::var("RUST_LOG").ok().as_deref(),
        env::var("CBPOLLER_LOG").ok().as_deref(),
        verbose,
    );
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt().with_target(true).with_env_filter(filter);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = installed {
        eprintln!("cbpoller: failed to install tracing subscriber: {e}");
    }
}

/// First usable directive string among the candidates.
fn pick_filter(rust_log: Option<&str>, app_log: Option<&str>, verbose: bool) -> String {
    for candidate in [rust_log, app_log].into_iter().flatten() {
        let candidate = candidate.trim();
        if !candidate.is_empty() && EnvFilter::try_new(candidate).is_ok() {
            return candidate.to_string();
        }
    }
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    fallback.to_string()
}
