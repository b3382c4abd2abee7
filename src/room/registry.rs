use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::models::Room;

/// Named sub-rooms of a connection
///
/// Every method returns owned snapshots and releases the lock before
/// returning, so callers can iterate while listeners insert or remove rooms.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Room>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Room>> {
        self.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Register a new join-requested room. Returns None if the name is taken.
    pub fn register(&self, name: &str) -> Option<Arc<Room>> {
        let mut rooms = self.lock();
        if rooms.contains_key(name) {
            return None;
        }
        let room = Arc::new(Room::new(name));
        rooms.insert(name.to_string(), room.clone());
        debug!(room = %name, registered = rooms.len(), "Room registered");
        Some(room)
    }

    /// Remove `room` if it is still the registered entry for its name
    pub fn remove(&self, room: &Arc<Room>) -> bool {
        let mut rooms = self.lock();
        match rooms.get(room.name()) {
            Some(current) if Arc::ptr_eq(current, room) => {
                rooms.remove(room.name());
                debug!(room = %room.name(), registered = rooms.len(), "Room removed");
                true
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> Vec<Arc<Room>> {
        self.lock().values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
