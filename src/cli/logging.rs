//! Tracing subscriber setup
//!
//! Logs go to stderr so they never mix with command output on stdout.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither --verbose nor a configured directive applies
const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directive: --verbose, then config/env, then the default
pub fn filter_directive(verbose: bool, configured: Option<&str>) -> String {
    if verbose {
        return "onboardify=debug".to_string();
    }
    configured
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the global subscriber; a second call is a no-op
pub fn init_tracing(verbose: bool, configured: Option<&str>) {
    let directive = filter_directive(verbose, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_wins_over_config() {
        assert_eq!(filter_directive(true, Some("error")), "onboardify=debug");
    }

    #[test]
    fn test_blank_directive_falls_back() {
        assert_eq!(filter_directive(false, Some("  ")), DEFAULT_FILTER);
        assert_eq!(filter_directive(false, None), DEFAULT_FILTER);
        assert_eq!(filter_directive(false, Some("trace")), "trace");
    }
}
