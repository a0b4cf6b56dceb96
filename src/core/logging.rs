//! Logging initialization and utilities

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```no_run
/// skinmesh::core::logging::init();
/// log::info!("Loading skinned model");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();
}

/// Initialize logging for tests, ignoring repeated initialization
pub fn try_init_for_tests() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("debug")
    )
    .is_test(true)
    .try_init();
}
