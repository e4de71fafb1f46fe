//! Process startup: config, tracing and adapter wiring.

pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, load_or_default, resolve_config_path};
pub use self::tracing::init_tracing_subscriber;
pub use wiring::{build_connection_deps, build_gateway};
