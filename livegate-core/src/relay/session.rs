use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::worker::RelayWorker;

/// Relay direction relative to the local engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Read from the local engine, publish to a remote endpoint
    Push,
    /// Read from a remote endpoint, publish into the local engine
    Pull,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pull => "pull",
        }
    }

    /// Confirmation returned to the operator after a successful start
    #[must_use]
    pub fn start_message(self, remote_url: &str) -> String {
        format!("<h1>{} url start {remote_url} ok</h1></br>", self.as_str())
    }

    /// Confirmation returned to the operator after a successful stop
    #[must_use]
    pub fn stop_message(self, remote_url: &str) -> String {
        format!("<h1>{} url stop {remote_url} ok</h1></br>", self.as_str())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry key `"<direction>:<app>/<name>"`.
///
/// Built from the raw strings: `Live` and `live`, or `room` and `room/`,
/// are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionKey(String);

impl SessionKey {
    #[must_use]
    pub fn new(direction: Direction, app: &str, name: &str) -> Self {
        Self(format!("{direction}:{app}/{name}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive part of a relay session, detached from its worker
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub key: SessionKey,
    pub direction: Direction,
    pub app: String,
    pub name: String,
    pub source_url: String,
    pub target_url: String,
    pub started_at: DateTime<Utc>,
}

impl SessionInfo {
    /// The endpoint that is not the local engine
    #[must_use]
    pub fn remote_url(&self) -> &str {
        match self.direction {
            Direction::Push => &self.target_url,
            Direction::Pull => &self.source_url,
        }
    }
}

/// A live relay: its description plus exclusive ownership of the worker
pub(crate) struct RelaySession {
    pub(crate) info: SessionInfo,
    pub(crate) worker: Box<dyn RelayWorker>,
}
