use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const FALLBACK_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(from_env.as_deref(), default_filter);
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    Registry::default().with(filter).with(fmt_layer).init();
}

/// First directive set that parses, in order: the environment, the configured
/// default, then `info`.
fn resolve_filter(from_env: Option<&str>, default_filter: &str) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(default_filter).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_FILTER))
}
