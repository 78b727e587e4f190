//! Point-in-time bandwidth snapshots of live publishers and players.
//!
//! Only readers and writers that keep bandwidth counters are reported;
//! every other variant is skipped without error.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::engine::{room_stream_key, BandwidthInfo, StreamProvider};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("Get rtmp stream information error")]
    ProviderUnavailable,

    #[error("No room was found")]
    RoomNotFound(String),

    #[error("This room has no readers")]
    NoReader(String),

    #[error("Reader returned by RTMP stream was not virtual reader.")]
    NotInstrumented(String),
}

/// One publisher or player entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamStat {
    pub key: String,
    pub url: String,
    pub stream_id: u32,
    pub video_total_bytes: u64,
    pub video_speed: u64,
    pub audio_total_bytes: u64,
    pub audio_speed: u64,
}

impl StreamStat {
    fn new(key: &str, url: String, bw: BandwidthInfo) -> Self {
        Self {
            key: key.to_string(),
            url,
            stream_id: bw.stream_id,
            video_total_bytes: bw.video_total_bytes,
            video_speed: bw.video_speed,
            audio_total_bytes: bw.audio_total_bytes,
            audio_speed: bw.audio_speed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveStats {
    pub publishers: Vec<StreamStat>,
    pub players: Vec<StreamStat>,
}

#[derive(Clone)]
pub struct StatsProjector {
    provider: Option<Arc<dyn StreamProvider>>,
}

impl StatsProjector {
    pub fn new(provider: Arc<dyn StreamProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Projector with no engine attached; every query fails
    #[must_use]
    pub const fn detached() -> Self {
        Self { provider: None }
    }

    fn provider(&self) -> Result<&Arc<dyn StreamProvider>, StatsError> {
        self.provider.as_ref().ok_or(StatsError::ProviderUnavailable)
    }

    pub fn snapshot_all(&self) -> Result<LiveStats, StatsError> {
        let provider = self.provider()?;
        let mut stats = LiveStats::default();

        for (key, stream) in provider.streams() {
            if let Some(reader) = stream.reader() {
                if let Some(bw) = reader.bandwidth() {
                    stats.publishers.push(StreamStat::new(&key, reader.info().url, bw));
                }
            }

            for writer in stream.writers() {
                if let Some(bw) = writer.bandwidth() {
                    stats.players.push(StreamStat::new(&key, writer.info().url, bw));
                }
            }
        }

        debug!(
            publishers = stats.publishers.len(),
            players = stats.players.len(),
            "Collected live stats"
        );
        Ok(stats)
    }

    /// Publisher entry of `live/<room>`
    pub fn snapshot_one(&self, room: &str) -> Result<StreamStat, StatsError> {
        let provider = self.provider()?;
        let key = room_stream_key(room);

        let stream = provider
            .get_stream(&key)
            .ok_or_else(|| StatsError::RoomNotFound(room.to_string()))?;
        let reader = stream
            .reader()
            .ok_or_else(|| StatsError::NoReader(room.to_string()))?;
        let bw = reader
            .bandwidth()
            .ok_or_else(|| StatsError::NotInstrumented(room.to_string()))?;

        Ok(StreamStat::new(&key, reader.info().url, bw))
    }
}
