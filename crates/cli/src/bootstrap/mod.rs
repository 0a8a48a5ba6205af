use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber from the configured level.
/// `RUST_LOG` still wins when set, so per-module overrides stay
/// possible in the field.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
