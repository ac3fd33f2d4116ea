use std::io::{self, IsTerminal};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level used when RUST_LOG is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "situatie=debug"
    } else {
        "warn"
    }
}

fn make_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Initializes logging to stderr. Call once at startup.
///
/// - Colored when stderr is a terminal, plain when redirected.
/// - Level: WARN by default, DEBUG for this crate with `verbose`, or
///   whatever RUST_LOG says.
pub fn init_logging(verbose: bool) {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false);

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(make_filter(verbose))
        .with(stderr_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_level() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "situatie=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging(false);
        init_logging(true);
    }
}
