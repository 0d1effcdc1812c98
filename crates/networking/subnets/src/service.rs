use std::collections::BTreeSet;

use parking_lot::RwLock;
use tracing::debug;

/// Subnets of one kind this node is currently subscribed to.
#[derive(Debug, Default)]
pub struct SubnetSubscriptionService {
    subnets: RwLock<BTreeSet<u64>>,
}

impl SubnetSubscriptionService {
    pub fn subscribe(&self, subnet_id: u64) {
        if self.subnets.write().insert(subnet_id) {
            debug!(subnet_id, "Subscribed to subnet");
        }
    }

    pub fn unsubscribe(&self, subnet_id: u64) {
        if self.subnets.write().remove(&subnet_id) {
            debug!(subnet_id, "Unsubscribed from subnet");
        }
    }

    /// Replaces the whole subscription set.
    pub fn set_subscriptions(&self, subnet_ids: impl IntoIterator<Item = u64>) {
        *self.subnets.write() = subnet_ids.into_iter().collect();
    }

    pub fn is_subscribed(&self, subnet_id: u64) -> bool {
        self.subnets.read().contains(&subnet_id)
    }

    pub fn subnets(&self) -> Vec<u64> {
        self.subnets.read().iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let service = SubnetSubscriptionService::default();
        service.subscribe(3);
        service.subscribe(1);
        service.subscribe(3);
        assert_eq!(service.subnets(), vec![1, 3]);

        service.unsubscribe(3);
        assert!(!service.is_subscribed(3));

        service.set_subscriptions([7, 2]);
        assert_eq!(service.subnets(), vec![2, 7]);
    }
}
