use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use skein_peer::PeerId;

/// The pub/sub substrate: peer enumeration, topic membership and publishing.
pub trait GossipNetwork: Send + Sync {
    fn peers(&self) -> Vec<PeerId>;

    /// Subscribers of every topic any connected peer has joined, keyed by topic string.
    fn subscribers_by_topic(&self) -> HashMap<String, HashSet<PeerId>>;

    fn publish(&self, topic: &str, data: Vec<u8>) -> anyhow::Result<()>;
}

/// Loopback [`GossipNetwork`] that records what was published. Drives simulations and
/// integration tests without a transport.
#[derive(Debug, Default)]
pub struct InMemoryGossipNetwork {
    subscriptions: RwLock<HashMap<PeerId, HashSet<String>>>,
    published: RwLock<Vec<(String, Vec<u8>)>>,
}

impl InMemoryGossipNetwork {
    pub fn add_peer(&self, peer_id: PeerId) {
        self.subscriptions.write().entry(peer_id).or_default();
    }

    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.subscriptions.write().remove(peer_id);
    }

    pub fn subscribe(&self, peer_id: PeerId, topic: impl Into<String>) {
        self.subscriptions
            .write()
            .entry(peer_id)
            .or_default()
            .insert(topic.into());
    }

    pub fn unsubscribe(&self, peer_id: &PeerId, topic: &str) {
        if let Some(topics) = self.subscriptions.write().get_mut(peer_id) {
            topics.remove(topic);
        }
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.read().clone()
    }
}

impl GossipNetwork for InMemoryGossipNetwork {
    fn peers(&self) -> Vec<PeerId> {
        self.subscriptions.read().keys().copied().collect()
    }

    fn subscribers_by_topic(&self) -> HashMap<String, HashSet<PeerId>> {
        let mut subscribers: HashMap<String, HashSet<PeerId>> = HashMap::new();
        for (peer_id, topics) in self.subscriptions.read().iter() {
            for topic in topics {
                subscribers.entry(topic.clone()).or_default().insert(*peer_id);
            }
        }
        subscribers
    }

    fn publish(&self, topic: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.published.write().push((topic.to_string(), data));
        Ok(())
    }
}
