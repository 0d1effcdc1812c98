use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use skein_peer::{CachedPeer, ConnectionState, Direction, PeerId};

#[derive(Debug, Default)]
pub struct NetworkState {
    pub peer_table: Arc<Mutex<HashMap<PeerId, CachedPeer>>>,
}

impl NetworkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_peer(&self, peer_id: PeerId, state: ConnectionState, direction: Direction) {
        self.peer_table
            .lock()
            .entry(peer_id)
            .and_modify(|cached_peer| {
                cached_peer.state = state;
                if direction != Direction::Unknown {
                    cached_peer.direction = direction;
                }
                cached_peer.update_last_seen();
            })
            .or_insert_with(|| CachedPeer::new(peer_id, state, direction));
    }

    pub fn connected_peer_count(&self) -> usize {
        self.peer_table
            .lock()
            .values()
            .filter(|peer| peer.is_connected())
            .count()
    }

    pub fn connected_peer_ids(&self) -> Vec<PeerId> {
        self.peer_table
            .lock()
            .values()
            .filter(|peer| peer.is_connected())
            .map(|peer| peer.peer_id)
            .collect()
    }

    /// Returns the cached peer from the peer table.
    pub fn cached_peer(&self, id: &PeerId) -> Option<CachedPeer> {
        self.peer_table.lock().get(id).cloned()
    }

    pub fn is_connected(&self, id: &PeerId) -> bool {
        self.peer_table
            .lock()
            .get(id)
            .is_some_and(CachedPeer::is_connected)
    }

    pub fn mark_seen(&self, id: &PeerId) {
        if let Some(cached_peer) = self.peer_table.lock().get_mut(id) {
            cached_peer.update_last_seen();
        }
    }
}
