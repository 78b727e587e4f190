use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use super::{LiveStream, StreamProvider, StreamReader, StreamWriter};

type StreamMap = DashMap<String, Arc<HubStream>>;

/// One stream of the hub: at most one reader and any number of writers
pub struct HubStream {
    key: String,
    reader: RwLock<Option<Arc<dyn StreamReader>>>,
    writers: RwLock<HashMap<String, Arc<dyn StreamWriter>>>,
    hub: Weak<StreamMap>,
}

impl HubStream {
    fn new(key: String, hub: Weak<StreamMap>) -> Self {
        Self {
            key,
            reader: RwLock::new(None),
            writers: RwLock::new(HashMap::new()),
            hub,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_reader(&self, reader: Arc<dyn StreamReader>) {
        *self.reader.write() = Some(reader);
    }

    pub fn clear_reader(&self) {
        self.reader.write().take();
    }

    /// Attach a writer, keyed by its uid; a writer with the same uid is replaced
    pub fn add_writer(&self, writer: Arc<dyn StreamWriter>) {
        let uid = writer.info().uid;
        self.writers.write().insert(uid, writer);
    }

    pub fn remove_writer(&self, uid: &str) -> bool {
        self.writers.write().remove(uid).is_some()
    }

    #[must_use]
    pub fn writer_count(&self) -> usize {
        self.writers.read().len()
    }
}

impl LiveStream for HubStream {
    fn reader(&self) -> Option<Arc<dyn StreamReader>> {
        self.reader.read().clone()
    }

    fn writers(&self) -> Vec<Arc<dyn StreamWriter>> {
        self.writers.read().values().cloned().collect()
    }

    fn trans_stop(&self) {
        let dropped = {
            let mut writers = self.writers.write();
            let n = writers.len();
            writers.clear();
            n
        };
        debug!(stream = %self.key, writers = dropped, "Stream transport stopped");
    }

    fn close_and_complete(&self) {
        self.reader.write().take();
        self.writers.write().clear();

        if let Some(streams) = self.hub.upgrade() {
            streams.remove_if(&self.key, |_, s| std::ptr::eq(Arc::as_ptr(s), self));
        }
        info!(stream = %self.key, "Stream closed");
    }
}

/// In-memory stream registry keyed by `app/name`
///
/// The hub does not accept RTMP connections itself. The embedding RTMP
/// engine publishes its readers and subscribes its writers here; until it
/// does, stats report no streams and deletes find no room.
#[derive(Clone, Default)]
pub struct LiveHub {
    streams: Arc<StreamMap>,
}

impl LiveHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn stream_entry(&self, key: &str) -> Arc<HubStream> {
        let weak = Arc::downgrade(&self.streams);
        let entry = self
            .streams
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(HubStream::new(key.to_string(), weak)));
        Arc::clone(entry.value())
    }

    /// Set the reader of `key`, creating the stream if needed
    pub fn publish(&self, key: &str, reader: Arc<dyn StreamReader>) -> Arc<HubStream> {
        let stream = self.stream_entry(key);
        stream.set_reader(reader);
        debug!(stream = %key, "Publisher attached");
        stream
    }

    /// Attach a writer to `key`, creating the stream if needed
    pub fn subscribe(&self, key: &str, writer: Arc<dyn StreamWriter>) -> Arc<HubStream> {
        let stream = self.stream_entry(key);
        stream.add_writer(writer);
        stream
    }

    pub fn unsubscribe(&self, key: &str, uid: &str) -> bool {
        let stream = self.streams.get(key).map(|s| Arc::clone(s.value()));
        stream.is_some_and(|s| s.remove_writer(uid))
    }

    /// Clear the reader of `key`, keeping its writers attached
    pub fn unpublish(&self, key: &str) {
        let stream = self.streams.get(key).map(|s| Arc::clone(s.value()));
        if let Some(stream) = stream {
            stream.clear_reader();
        }
    }

    pub fn remove(&self, key: &str) -> Option<Arc<HubStream>> {
        self.streams.remove(key).map(|(_, s)| s)
    }

    #[must_use]
    pub fn stream(&self, key: &str) -> Option<Arc<HubStream>> {
        self.streams.get(key).map(|s| Arc::clone(s.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl StreamProvider for LiveHub {
    fn get_stream(&self, key: &str) -> Option<Arc<dyn LiveStream>> {
        self.stream(key).map(|s| s as Arc<dyn LiveStream>)
    }

    fn streams(&self) -> Vec<(String, Arc<dyn LiveStream>)> {
        self.streams
            .iter()
            .map(|e| {
                let stream: Arc<dyn LiveStream> = Arc::clone(e.value()) as Arc<dyn LiveStream>;
                (e.key().clone(), stream)
            })
            .collect()
    }
}
