pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod relay;
pub mod room_keys;
pub mod stats;

pub use config::Config;
pub use error::{Error, Result};
pub use relay::RelaySessionRegistry;
pub use stats::StatsProjector;
