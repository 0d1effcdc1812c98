use std::collections::HashMap;

use parking_lot::RwLock;
use skein_peer::PeerId;
use tracing::trace;

use crate::messages::meta_data::MetaData;

#[derive(Debug, Clone, Default)]
pub struct PeerMetadata {
    pub seq_number: u64,
    pub meta_data: Option<MetaData>,
}

/// Latest metadata known for each connected peer.
#[derive(Debug, Default)]
pub struct PeerMetadataStore {
    peers: RwLock<HashMap<PeerId, PeerMetadata>>,
}

impl PeerMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_peer_connected(&self, peer_id: PeerId) {
        self.peers.write().entry(peer_id).or_default();
    }

    /// Records a sequence number the peer declared (e.g. in a ping). Returns true when it is
    /// newer than anything seen so far, meaning the cached metadata is stale. Peers that are no
    /// longer tracked are ignored.
    pub fn update_seq_number(&self, peer_id: &PeerId, seq_number: u64) -> bool {
        let mut peers = self.peers.write();
        let Some(entry) = peers.get_mut(peer_id) else {
            trace!(?peer_id, "Ignoring sequence number from untracked peer");
            return false;
        };
        let is_stale = seq_number > entry.seq_number || entry.meta_data.is_none();
        if seq_number > entry.seq_number {
            trace!(
                ?peer_id,
                old = entry.seq_number,
                new = seq_number,
                "Peer metadata sequence advanced"
            );
            entry.seq_number = seq_number;
        }
        is_stale
    }

    pub fn update_metadata(&self, peer_id: &PeerId, meta_data: MetaData) {
        let mut peers = self.peers.write();
        let Some(entry) = peers.get_mut(peer_id) else {
            trace!(?peer_id, "Ignoring metadata from untracked peer");
            return;
        };
        entry.seq_number = entry.seq_number.max(meta_data.seq_number());
        entry.meta_data = Some(meta_data);
    }

    pub fn metadata(&self, peer_id: &PeerId) -> Option<PeerMetadata> {
        self.peers.read().get(peer_id).cloned()
    }

    pub fn remove(&self, peer_id: &PeerId) {
        self.peers.write().remove(peer_id);
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}
