//! rstest fixtures shared across workspace tests.

use rstest::fixture;

/// Quiet tracing: warnings only, routed through the test writer.
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

/// Verbose tracing for the playback crates.
#[fixture]
pub fn debug_tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("zoetrope_player=debug".parse().expect("valid directive"))
                .add_directive("zoetrope_api=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
