use thiserror::Error;

use crate::auth::AuthError;
use crate::relay::RelayError;
use crate::room_keys::RoomKeyError;
use crate::stats::StatsError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    RoomKey(#[from] RoomKeyError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
