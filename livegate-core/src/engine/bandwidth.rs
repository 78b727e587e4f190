use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Minimum window between two speed recomputations
pub const STATS_WINDOW: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// Counter record of one instrumented reader or writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandwidthInfo {
    pub stream_id: u32,
    pub video_total_bytes: u64,
    pub audio_total_bytes: u64,
    /// kbit/s over the last completed window
    pub video_speed: u64,
    pub audio_speed: u64,
}

#[derive(Debug)]
struct MeterState {
    info: BandwidthInfo,
    last_video_total: u64,
    last_audio_total: u64,
    window_start: Option<Instant>,
}

/// Byte totals and windowed throughput for one media endpoint
#[derive(Debug)]
pub struct BandwidthMeter {
    state: Mutex<MeterState>,
}

impl BandwidthMeter {
    #[must_use]
    pub fn new(stream_id: u32) -> Self {
        Self {
            state: Mutex::new(MeterState {
                info: BandwidthInfo {
                    stream_id,
                    ..BandwidthInfo::default()
                },
                last_video_total: 0,
                last_audio_total: 0,
                window_start: None,
            }),
        }
    }

    /// Account one media packet of `len` bytes
    pub fn record(&self, kind: MediaKind, len: usize) {
        self.record_at(kind, len, Instant::now());
    }

    pub(crate) fn record_at(&self, kind: MediaKind, len: usize, now: Instant) {
        let mut state = self.state.lock();
        let len = len as u64;

        match kind {
            MediaKind::Video => {
                state.info.video_total_bytes = state.info.video_total_bytes.saturating_add(len);
            }
            MediaKind::Audio => {
                state.info.audio_total_bytes = state.info.audio_total_bytes.saturating_add(len);
            }
        }

        let Some(window_start) = state.window_start else {
            state.window_start = Some(now);
            return;
        };

        let elapsed = now.saturating_duration_since(window_start);
        if elapsed < STATS_WINDOW {
            return;
        }

        let secs = elapsed.as_secs().max(1);
        let video_delta = state
            .info
            .video_total_bytes
            .saturating_sub(state.last_video_total);
        let audio_delta = state
            .info
            .audio_total_bytes
            .saturating_sub(state.last_audio_total);

        state.info.video_speed = video_delta.saturating_mul(8) / secs / 1000;
        state.info.audio_speed = audio_delta.saturating_mul(8) / secs / 1000;
        state.last_video_total = state.info.video_total_bytes;
        state.last_audio_total = state.info.audio_total_bytes;
        state.window_start = Some(now);
    }

    #[must_use]
    pub fn snapshot(&self) -> BandwidthInfo {
        self.state.lock().info
    }
}
