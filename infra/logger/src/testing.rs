use tracing_subscriber::EnvFilter;

/// Installs a subscriber that writes through the test harness capture.
///
/// Honors `RUST_LOG` and defaults to `debug`. Safe to call from every test: once a global
/// subscriber exists further calls do nothing.
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_file(true)
        .with_line_number(true)
        .try_init();
}
