use async_trait::async_trait;
use thiserror::Error;

use super::session::SessionKey;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to spawn relay program {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("relay program exited during startup: {0}")]
    ExitedEarly(std::process::ExitStatus),

    #[error("relay start failed: {0}")]
    Start(String),

    #[error("session key[{0}] not exist, please check it again.")]
    SessionNotFound(SessionKey),
}

/// One directional relay between a source and a target RTMP URL.
///
/// `start` reports failure synchronously; `stop` must be idempotent and
/// tolerate a worker that already terminated on its own.
#[async_trait]
pub trait RelayWorker: Send + Sync {
    async fn start(&mut self) -> Result<(), RelayError>;

    async fn stop(&mut self);
}

/// Creates relay workers for `(source_url, target_url)` pairs
pub trait RelayFactory: Send + Sync {
    fn create(&self, source_url: &str, target_url: &str) -> Box<dyn RelayWorker>;
}
