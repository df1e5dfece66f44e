pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod status;

/// Initializes the `env_logger` backend for the `log` facade.
pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new().filter_level(level).init();
}
