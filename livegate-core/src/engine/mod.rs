// Engine-facing interfaces consumed by the control plane, plus an in-memory
// engine that implements them.
//
// The RTMP engine owns publishers (readers) and subscribers (writers); the
// control plane only walks them and asks each one whether it keeps
// bandwidth counters.

pub mod bandwidth;
pub mod hub;
pub mod virtual_io;

use serde::Serialize;
use std::sync::Arc;

pub use bandwidth::{BandwidthInfo, BandwidthMeter, MediaKind, STATS_WINDOW};
pub use hub::{HubStream, LiveHub};
pub use virtual_io::{VirtualReader, VirtualWriter};

/// Application name every room lives under
pub const LIVE_APP: &str = "live";

/// Stream key of a room: `live/<room>`
#[must_use]
pub fn room_stream_key(room: &str) -> String {
    format!("{LIVE_APP}/{room}")
}

/// Identity of one reader or writer attached to a stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointInfo {
    pub uid: String,
    pub key: String,
    pub url: String,
    pub inter: bool,
}

/// Ingest side of a stream
pub trait StreamReader: Send + Sync {
    fn info(&self) -> EndpointInfo;

    /// Bandwidth counters, for readers that keep them
    fn bandwidth(&self) -> Option<BandwidthInfo> {
        None
    }
}

/// Egress side of a stream (one per subscriber)
pub trait StreamWriter: Send + Sync {
    fn info(&self) -> EndpointInfo;

    fn bandwidth(&self) -> Option<BandwidthInfo> {
        None
    }
}

pub trait LiveStream: Send + Sync {
    fn reader(&self) -> Option<Arc<dyn StreamReader>>;

    fn writers(&self) -> Vec<Arc<dyn StreamWriter>>;

    /// Stop moving media to the attached writers
    fn trans_stop(&self);

    /// Detach everything and drop the stream from its provider
    fn close_and_complete(&self);
}

/// Registry of live streams keyed by `app/name`
pub trait StreamProvider: Send + Sync {
    fn get_stream(&self, key: &str) -> Option<Arc<dyn LiveStream>>;

    /// Point-in-time copy of every stream
    fn streams(&self) -> Vec<(String, Arc<dyn LiveStream>)>;
}
