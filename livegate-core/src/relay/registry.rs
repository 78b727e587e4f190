use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::session::{Direction, RelaySession, SessionInfo, SessionKey};
use super::worker::{RelayError, RelayFactory};
use crate::config::local_rtmp_url;

/// Result of a start request that did not fail
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A new worker was started and registered
    Started(SessionInfo),
    /// The key was already active; nothing was created or replaced
    AlreadyActive(SessionKey),
}

impl StartOutcome {
    #[must_use]
    pub fn key(&self) -> &SessionKey {
        match self {
            Self::Started(info) => &info.key,
            Self::AlreadyActive(key) => key,
        }
    }
}

type Slot = Arc<Mutex<Option<RelaySession>>>;

/// Session registry owned by the control plane
///
/// Every key has its own slot lock, held across that key's worker
/// start/stop. A key never has two live workers and a racing stop either
/// sees the session or runs before it exists, while other keys proceed
/// without waiting. `active` mirrors the committed sessions for lock-free
/// reads.
pub struct RelaySessionRegistry {
    // key -> slot, empty while a start is in flight
    slots: DashMap<SessionKey, Slot>,
    active: DashMap<SessionKey, SessionInfo>,
    factory: Arc<dyn RelayFactory>,
    rtmp_addr: String,
}

impl std::fmt::Debug for RelaySessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySessionRegistry")
            .field("rtmp_addr", &self.rtmp_addr)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl RelaySessionRegistry {
    pub fn new(factory: Arc<dyn RelayFactory>, rtmp_addr: impl Into<String>) -> Self {
        Self {
            slots: DashMap::new(),
            active: DashMap::new(),
            factory,
            rtmp_addr: rtmp_addr.into(),
        }
    }

    #[must_use]
    pub fn local_url(&self, app: &str, name: &str) -> String {
        local_rtmp_url(&self.rtmp_addr, app, name)
    }

    pub async fn start_push(
        &self,
        app: &str,
        name: &str,
        remote_url: &str,
    ) -> Result<StartOutcome, RelayError> {
        self.start(Direction::Push, app, name, remote_url).await
    }

    pub async fn start_pull(
        &self,
        app: &str,
        name: &str,
        remote_url: &str,
    ) -> Result<StartOutcome, RelayError> {
        self.start(Direction::Pull, app, name, remote_url).await
    }

    /// Start a relay for `direction:app/name`.
    ///
    /// An already active key is left untouched and reported as
    /// [`StartOutcome::AlreadyActive`]. A worker that fails to start is
    /// dropped and nothing is registered.
    pub async fn start(
        &self,
        direction: Direction,
        app: &str,
        name: &str,
        remote_url: &str,
    ) -> Result<StartOutcome, RelayError> {
        let key = SessionKey::new(direction, app, name);
        let local_url = self.local_url(app, name);
        let (source_url, target_url) = match direction {
            Direction::Push => (local_url, remote_url.to_string()),
            Direction::Pull => (remote_url.to_string(), local_url),
        };

        loop {
            let slot = self.slot(&key);
            let mut guard = slot.lock().await;

            // slot was pruned between lookup and lock
            if !self.is_current(&key, &slot) {
                continue;
            }

            if guard.is_some() {
                warn!(session = %key, "Relay session already active, ignoring start");
                return Ok(StartOutcome::AlreadyActive(key));
            }

            debug!(session = %key, source = %source_url, target = %target_url, "Starting relay");

            let mut worker = self.factory.create(&source_url, &target_url);
            if let Err(e) = worker.start().await {
                warn!(session = %key, error = %e, "Relay failed to start");
                drop(guard);
                self.prune(&key, &slot);
                return Err(e);
            }

            let info = SessionInfo {
                key: key.clone(),
                direction,
                app: app.to_string(),
                name: name.to_string(),
                source_url,
                target_url,
                started_at: Utc::now(),
            };
            self.active.insert(key.clone(), info.clone());
            *guard = Some(RelaySession {
                info: info.clone(),
                worker,
            });

            info!(session = %key, active = self.active.len(), "Relay session started");
            return Ok(StartOutcome::Started(info));
        }
    }

    /// Stop and remove `direction:app/name`.
    pub async fn stop(
        &self,
        direction: Direction,
        app: &str,
        name: &str,
    ) -> Result<SessionInfo, RelayError> {
        let key = SessionKey::new(direction, app, name);

        let Some(slot) = self.slots.get(&key).map(|s| Arc::clone(s.value())) else {
            debug!(session = %key, "Stop requested for unknown relay session");
            return Err(RelayError::SessionNotFound(key));
        };

        let mut guard = slot.lock().await;
        let Some(mut session) = guard.take() else {
            debug!(session = %key, "Stop requested for unknown relay session");
            return Err(RelayError::SessionNotFound(key));
        };

        self.active.remove(&key);
        session.worker.stop().await;
        drop(guard);
        self.prune(&key, &slot);

        info!(session = %key, active = self.active.len(), "Relay session stopped");
        Ok(session.info)
    }

    /// Stop every session; returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let slots: Vec<(SessionKey, Slot)> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut count = 0;
        for (key, slot) in slots {
            let mut guard = slot.lock().await;
            if let Some(mut session) = guard.take() {
                self.active.remove(&key);
                session.worker.stop().await;
                count += 1;
                debug!(session = %key, "Relay session stopped on shutdown");
            }
            drop(guard);
            self.prune(&key, &slot);
        }

        if count > 0 {
            info!(count, "Stopped all relay sessions");
        }
        count
    }

    #[must_use]
    pub fn contains(&self, direction: Direction, app: &str, name: &str) -> bool {
        self.active.contains_key(&SessionKey::new(direction, app, name))
    }

    /// Active sessions ordered by key
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .active
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn slot(&self, key: &SessionKey) -> Slot {
        Arc::clone(
            self.slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .value(),
        )
    }

    fn is_current(&self, key: &SessionKey, slot: &Slot) -> bool {
        self.slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current.value(), slot))
    }

    // Only an unlocked empty slot is removed; a locked one has an owner
    // that will either fill it or prune it.
    fn prune(&self, key: &SessionKey, slot: &Slot) {
        self.slots.remove_if(key, |_, current| {
            Arc::ptr_eq(current, slot) && current.try_lock().is_ok_and(|held| held.is_none())
        });
    }
}
