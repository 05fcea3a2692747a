pub mod config;
pub mod flow;
pub mod poller;
pub mod server;
pub mod store;

/// Initialise `env_logger`, defaulting to `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
