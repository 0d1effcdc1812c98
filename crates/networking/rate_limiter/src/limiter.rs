use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use skein_peer::PeerId;
use tracing::{debug, trace};

use crate::{
    config::{RateLimitConfig, ResourceKind},
    time::TimeProvider,
    tracker::{RateTracker, RequestApproval},
};

/// The full set of budgets for a single connected peer.
#[derive(Debug)]
pub struct PeerRateLimits {
    blocks: RateTracker,
    blob_sidecars: RateTracker,
    data_columns: RateTracker,
    requests: RateTracker,
}

impl PeerRateLimits {
    pub fn new(config: &RateLimitConfig, time_provider: Arc<dyn TimeProvider>) -> Self {
        let tracker = |kind: ResourceKind| {
            RateTracker::new(
                kind,
                config.max_units(kind),
                config.window,
                time_provider.clone(),
            )
        };
        Self {
            blocks: tracker(ResourceKind::Blocks),
            blob_sidecars: tracker(ResourceKind::BlobSidecars),
            data_columns: tracker(ResourceKind::DataColumns),
            requests: tracker(ResourceKind::Requests),
        }
    }

    pub fn tracker(&self, kind: ResourceKind) -> &RateTracker {
        match kind {
            ResourceKind::Blocks => &self.blocks,
            ResourceKind::BlobSidecars => &self.blob_sidecars,
            ResourceKind::DataColumns => &self.data_columns,
            ResourceKind::Requests => &self.requests,
        }
    }
}

/// Owns the budgets of every connected peer. Budgets are created on connect and dropped on
/// disconnect; a peer the limiter has never seen is refused.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    time_provider: Arc<dyn TimeProvider>,
    peers: RwLock<HashMap<PeerId, Arc<PeerRateLimits>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            config,
            time_provider,
            peers: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn on_peer_connected(&self, peer_id: PeerId) {
        self.peers.write().entry(peer_id).or_insert_with(|| {
            trace!(?peer_id, "Tracking rate limits for peer");
            Arc::new(PeerRateLimits::new(
                &self.config,
                self.time_provider.clone(),
            ))
        });
    }

    pub fn on_peer_disconnected(&self, peer_id: &PeerId) {
        if self.peers.write().remove(peer_id).is_some() {
            trace!(?peer_id, "Dropped rate limits for peer");
        }
    }

    pub fn peer_limits(&self, peer_id: &PeerId) -> Option<Arc<PeerRateLimits>> {
        self.peers.read().get(peer_id).cloned()
    }

    pub fn tracked_peer_count(&self) -> usize {
        self.peers.read().len()
    }

    pub fn approve_objects_request(
        &self,
        peer_id: &PeerId,
        kind: ResourceKind,
        units: u64,
    ) -> Option<RequestApproval> {
        let Some(limits) = self.peer_limits(peer_id) else {
            debug!(?peer_id, resource = %kind, "Refusing request from untracked peer");
            return None;
        };
        limits.tracker(kind).approve_objects_request(units)
    }

    pub fn approve(&self, peer_id: &PeerId, kind: ResourceKind, units: u64) -> bool {
        self.approve_objects_request(peer_id, kind, units).is_some()
    }

    pub fn adjust_objects_request(
        &self,
        peer_id: &PeerId,
        kind: ResourceKind,
        approval: RequestApproval,
        returned_units: u64,
    ) {
        if let Some(limits) = self.peer_limits(peer_id) {
            limits
                .tracker(kind)
                .adjust_objects_request(approval, returned_units);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::*;
    use crate::time::StubTimeProvider;

    fn limiter() -> (RateLimiter, Arc<StubTimeProvider>) {
        let time = Arc::new(StubTimeProvider::with_time(Duration::from_secs(10)));
        let config = RateLimitConfig::new(4, 8, 2, 16);
        (RateLimiter::new(config, time.clone()), time)
    }

    #[traced_test]
    #[test]
    fn test_unknown_peer_is_refused() {
        let (limiter, _time) = limiter();
        assert!(!limiter.approve(&PeerId::random(), ResourceKind::Requests, 1));
        assert!(logs_contain("untracked peer"));
    }

    #[test]
    fn test_peers_have_independent_budgets() {
        let (limiter, _time) = limiter();
        let alice = PeerId::random();
        let bob = PeerId::random();
        limiter.on_peer_connected(alice);
        limiter.on_peer_connected(bob);

        assert!(limiter.approve(&alice, ResourceKind::Requests, 2));
        assert!(!limiter.approve(&alice, ResourceKind::Requests, 1));
        assert!(limiter.approve(&bob, ResourceKind::Requests, 2));
    }

    #[test]
    fn test_resources_have_independent_budgets() {
        let (limiter, _time) = limiter();
        let peer = PeerId::random();
        limiter.on_peer_connected(peer);

        assert!(limiter.approve(&peer, ResourceKind::Blocks, 4));
        assert!(!limiter.approve(&peer, ResourceKind::Blocks, 1));
        assert!(limiter.approve(&peer, ResourceKind::BlobSidecars, 8));
        assert!(limiter.approve(&peer, ResourceKind::DataColumns, 64));
        assert!(!limiter.approve(&peer, ResourceKind::DataColumns, 1));
    }

    #[test]
    fn test_reconnect_does_not_reset_live_budget() {
        let (limiter, _time) = limiter();
        let peer = PeerId::random();
        limiter.on_peer_connected(peer);
        assert!(limiter.approve(&peer, ResourceKind::Requests, 2));

        limiter.on_peer_connected(peer);
        assert!(!limiter.approve(&peer, ResourceKind::Requests, 1));
        assert_eq!(limiter.tracked_peer_count(), 1);
    }

    #[test]
    fn test_disconnect_forgets_peer() {
        let (limiter, time) = limiter();
        let peer = PeerId::random();
        limiter.on_peer_connected(peer);
        let approval = limiter
            .approve_objects_request(&peer, ResourceKind::Blocks, 4)
            .expect("within budget");

        limiter.on_peer_disconnected(&peer);
        assert_eq!(limiter.tracked_peer_count(), 0);
        assert!(!limiter.approve(&peer, ResourceKind::Blocks, 1));
        limiter.adjust_objects_request(&peer, ResourceKind::Blocks, approval, 0);

        limiter.on_peer_connected(peer);
        time.advance_time_by(Duration::from_secs(1));
        assert!(limiter.approve(&peer, ResourceKind::Blocks, 4));
    }

    #[test]
    fn test_adjust_routes_to_peer_tracker() {
        let (limiter, _time) = limiter();
        let peer = PeerId::random();
        limiter.on_peer_connected(peer);

        let approval = limiter
            .approve_objects_request(&peer, ResourceKind::Blocks, 4)
            .expect("within budget");
        limiter.adjust_objects_request(&peer, ResourceKind::Blocks, approval, 1);

        assert!(limiter.approve(&peer, ResourceKind::Blocks, 3));
        assert!(!limiter.approve(&peer, ResourceKind::Blocks, 1));
    }
}
