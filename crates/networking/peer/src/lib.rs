use std::time::Instant;

pub use libp2p_identity::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connected,
    Connecting,
    Disconnected,
    Disconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
    Unknown,
}

/// What the node remembers about a peer between connection events.
#[derive(Debug, Clone)]
pub struct CachedPeer {
    pub peer_id: PeerId,

    /// Current known connection state
    pub state: ConnectionState,

    /// Direction of the most recent connection (inbound/outbound)
    pub direction: Direction,

    /// Last time we received a message from this peer
    pub last_seen: Instant,
}

impl CachedPeer {
    pub fn new(peer_id: PeerId, state: ConnectionState, direction: Direction) -> Self {
        Self {
            peer_id,
            state,
            direction,
            last_seen: Instant::now(),
        }
    }

    pub fn update_last_seen(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}
