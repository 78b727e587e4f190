//! Room access keys.
//!
//! Each room has at most one key and each key names exactly one room.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

const KEY_LENGTH: usize = 48;

const ALPHANUMERIC: [char; 62] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L',
    'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9',
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomKeyError {
    #[error("key {0} not found")]
    NotFound(String),

    #[error("room key backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait RoomKeyStore: Send + Sync {
    /// Generate a fresh key for `room`, invalidating the previous one
    async fn set_key(&self, room: &str) -> Result<String, RoomKeyError>;

    /// Current key of `room`, generating one if it has none
    async fn get_key(&self, room: &str) -> Result<String, RoomKeyError>;

    /// Room owning `key`
    async fn get_channel(&self, key: &str) -> Result<String, RoomKeyError>;

    async fn delete_channel(&self, room: &str) -> bool;

    async fn delete_key(&self, key: &str) -> bool;
}

#[derive(Debug, Default)]
struct KeyMaps {
    key_by_room: HashMap<String, String>,
    room_by_key: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryRoomKeys {
    maps: RwLock<KeyMaps>,
}

impl MemoryRoomKeys {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn generate(maps: &KeyMaps) -> String {
        loop {
            let key = nanoid::nanoid!(KEY_LENGTH, &ALPHANUMERIC);
            if !maps.room_by_key.contains_key(&key) {
                return key;
            }
        }
    }

    fn assign(maps: &mut KeyMaps, room: &str) -> String {
        let key = Self::generate(maps);
        if let Some(old) = maps.key_by_room.insert(room.to_string(), key.clone()) {
            maps.room_by_key.remove(&old);
        }
        maps.room_by_key.insert(key.clone(), room.to_string());
        key
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.read().key_by_room.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RoomKeyStore for MemoryRoomKeys {
    async fn set_key(&self, room: &str) -> Result<String, RoomKeyError> {
        let key = Self::assign(&mut self.maps.write(), room);
        debug!(room, "Room key reset");
        Ok(key)
    }

    async fn get_key(&self, room: &str) -> Result<String, RoomKeyError> {
        if let Some(key) = self.maps.read().key_by_room.get(room) {
            return Ok(key.clone());
        }

        let mut maps = self.maps.write();
        // another request may have assigned one between the two locks
        if let Some(key) = maps.key_by_room.get(room) {
            return Ok(key.clone());
        }
        Ok(Self::assign(&mut maps, room))
    }

    async fn get_channel(&self, key: &str) -> Result<String, RoomKeyError> {
        self.maps
            .read()
            .room_by_key
            .get(key)
            .cloned()
            .ok_or_else(|| RoomKeyError::NotFound(key.to_string()))
    }

    async fn delete_channel(&self, room: &str) -> bool {
        let mut maps = self.maps.write();
        let Some(key) = maps.key_by_room.remove(room) else {
            return false;
        };
        maps.room_by_key.remove(&key);
        debug!(room, "Room key deleted");
        true
    }

    async fn delete_key(&self, key: &str) -> bool {
        let mut maps = self.maps.write();
        let Some(room) = maps.room_by_key.remove(key) else {
            return false;
        };
        maps.key_by_room.remove(&room);
        true
    }
}
