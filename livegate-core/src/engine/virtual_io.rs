use super::bandwidth::{BandwidthInfo, BandwidthMeter, MediaKind};
use super::{EndpointInfo, StreamReader, StreamWriter};

/// Reader variant that keeps bandwidth counters
#[derive(Debug)]
pub struct VirtualReader {
    info: EndpointInfo,
    meter: BandwidthMeter,
}

impl VirtualReader {
    #[must_use]
    pub fn new(info: EndpointInfo, stream_id: u32) -> Self {
        Self {
            info,
            meter: BandwidthMeter::new(stream_id),
        }
    }

    pub fn record(&self, kind: MediaKind, len: usize) {
        self.meter.record(kind, len);
    }

    #[must_use]
    pub const fn meter(&self) -> &BandwidthMeter {
        &self.meter
    }
}

impl StreamReader for VirtualReader {
    fn info(&self) -> EndpointInfo {
        self.info.clone()
    }

    fn bandwidth(&self) -> Option<BandwidthInfo> {
        Some(self.meter.snapshot())
    }
}

/// Writer variant that keeps bandwidth counters
#[derive(Debug)]
pub struct VirtualWriter {
    info: EndpointInfo,
    meter: BandwidthMeter,
}

impl VirtualWriter {
    #[must_use]
    pub fn new(info: EndpointInfo, stream_id: u32) -> Self {
        Self {
            info,
            meter: BandwidthMeter::new(stream_id),
        }
    }

    pub fn record(&self, kind: MediaKind, len: usize) {
        self.meter.record(kind, len);
    }

    #[must_use]
    pub const fn meter(&self) -> &BandwidthMeter {
        &self.meter
    }
}

impl StreamWriter for VirtualWriter {
    fn info(&self) -> EndpointInfo {
        self.info.clone()
    }

    fn bandwidth(&self) -> Option<BandwidthInfo> {
        Some(self.meter.snapshot())
    }
}
