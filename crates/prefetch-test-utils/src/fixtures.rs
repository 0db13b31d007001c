use rstest::fixture;

/// Install a `warn`-level test subscriber (idempotent across tests).
#[fixture]
pub fn tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("warn".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

/// Install a test subscriber that shows the worker's lifecycle traces.
#[fixture]
pub fn debug_tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("prefetch=trace".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
