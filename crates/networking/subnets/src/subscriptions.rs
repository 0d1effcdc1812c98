use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use skein_gossipsub::{GossipNetwork, GossipTopic};
use skein_metrics::{SUBNET_PEER_COUNT, SUBSCRIBERS_REQUIRED, set_int_gauge_vec};
use skein_network_spec::{networks::NetworkSpec, subnet::SubnetKind};
use skein_peer::PeerId;
use tracing::{trace, warn};

use crate::{
    bits::SubnetBits, error::ConfigurationError, scorer::SubnetScorer,
    service::SubnetSubscriptionService,
};

pub const DEFAULT_TARGET_SUBNET_SUBSCRIBER_COUNT: usize = 2;

/// Who subscribes to which subnet of a single [`SubnetKind`], as seen at snapshot time.
#[derive(Debug, Clone)]
pub struct SubnetSubscriptions {
    kind: SubnetKind,
    subnet_count: usize,
    relevant_subnets: HashSet<u64>,
    subscriber_count_by_subnet: HashMap<u64, usize>,
    subscriptions_by_peer: HashMap<PeerId, SubnetBits>,
}

impl SubnetSubscriptions {
    pub fn builder(kind: SubnetKind, subnet_count: usize) -> SubnetSubscriptionsBuilder {
        SubnetSubscriptionsBuilder {
            inner: SubnetSubscriptions {
                kind,
                subnet_count,
                relevant_subnets: HashSet::new(),
                subscriber_count_by_subnet: HashMap::new(),
                subscriptions_by_peer: HashMap::new(),
            },
        }
    }

    pub fn kind(&self) -> SubnetKind {
        self.kind
    }

    pub fn subnet_count(&self) -> usize {
        self.subnet_count
    }

    pub fn is_subnet_relevant(&self, subnet_id: u64) -> bool {
        self.relevant_subnets.contains(&subnet_id)
    }

    /// Minimum subscriber count over the relevant subnets, or `None` when no subnet is
    /// relevant, in which case no further subscribers are needed for this kind.
    pub fn min_subscriber_count(&self) -> Option<usize> {
        self.relevant_subnets
            .iter()
            .map(|subnet_id| self.subscriber_count(*subnet_id))
            .min()
    }

    pub fn subscriber_count(&self, subnet_id: u64) -> usize {
        self.subscriber_count_by_subnet
            .get(&subnet_id)
            .copied()
            .unwrap_or(0)
    }

    /// Empty bits for peers that subscribe to nothing relevant.
    pub fn subscriptions(&self, peer_id: &PeerId) -> SubnetBits {
        self.subscriptions_by_peer
            .get(peer_id)
            .cloned()
            .unwrap_or_else(|| SubnetBits::new(self.subnet_count))
    }
}

/// Mutable accumulator that is frozen into a [`SubnetSubscriptions`].
#[derive(Debug)]
pub struct SubnetSubscriptionsBuilder {
    inner: SubnetSubscriptions,
}

impl SubnetSubscriptionsBuilder {
    pub fn add_relevant_subnet(&mut self, subnet_id: u64) -> &mut Self {
        if subnet_id >= self.inner.subnet_count as u64 {
            warn!(
                kind = %self.inner.kind,
                subnet_id,
                subnet_count = self.inner.subnet_count,
                "Ignoring subnet outside the configured space"
            );
            return self;
        }
        self.inner.relevant_subnets.insert(subnet_id);
        self
    }

    /// Only subscribers of relevant subnets are recorded, and each peer is counted once per
    /// subnet.
    pub fn add_subscriber(&mut self, subnet_id: u64, peer_id: PeerId) -> &mut Self {
        if !self.inner.is_subnet_relevant(subnet_id) {
            return self;
        }
        let subnet_count = self.inner.subnet_count;
        let bits = self
            .inner
            .subscriptions_by_peer
            .entry(peer_id)
            .or_insert_with(|| SubnetBits::new(subnet_count));
        if bits.get(subnet_id) || !bits.set(subnet_id) {
            return self;
        }
        *self
            .inner
            .subscriber_count_by_subnet
            .entry(subnet_id)
            .or_default() += 1;
        self
    }

    pub fn build(self) -> SubnetSubscriptions {
        self.inner
    }
}

/// Immutable per-cycle snapshot of subnet coverage across connected peers. Rebuilt, never
/// mutated, whenever peers or local subscriptions change.
#[derive(Debug, Clone)]
pub struct PeerSubnetSubscriptions {
    attestation: SubnetSubscriptions,
    sync_committee: SubnetSubscriptions,
    data_column: SubnetSubscriptions,
    target_subnet_subscriber_count: usize,
}

impl PeerSubnetSubscriptions {
    pub fn builder(spec: &NetworkSpec) -> PeerSubnetSubscriptionsBuilder {
        let subscriptions =
            |kind: SubnetKind| SubnetSubscriptions::builder(kind, spec.subnet_count(kind) as usize);
        PeerSubnetSubscriptionsBuilder {
            attestation: subscriptions(SubnetKind::Attestation),
            sync_committee: subscriptions(SubnetKind::SyncCommittee),
            data_column: subscriptions(SubnetKind::DataColumn),
            target_subnet_subscriber_count: DEFAULT_TARGET_SUBNET_SUBSCRIBER_COUNT,
        }
    }

    /// Snapshot with nothing relevant.
    pub fn empty(spec: &NetworkSpec) -> Self {
        Self::builder(spec).build()
    }

    /// Reads topic membership from `network`. Every attestation subnet is tracked; sync
    /// committee and data column subnets only when this node subscribes to them.
    pub fn create(
        spec: &NetworkSpec,
        network: &dyn GossipNetwork,
        sync_committee_subnets: &SubnetSubscriptionService,
        data_column_subnets: &SubnetSubscriptionService,
        target_subnet_subscriber_count: i64,
    ) -> Result<Self, ConfigurationError> {
        let subscribers_by_topic = network.subscribers_by_topic();
        let track = |builder: &mut SubnetSubscriptionsBuilder, subnet_ids: Vec<u64>| {
            let kind = builder.inner.kind;
            for subnet_id in subnet_ids {
                builder.add_relevant_subnet(subnet_id);
                let topic = GossipTopic::for_subnet(spec.fork_digest, kind, subnet_id).to_string();
                for peer_id in subscribers_by_topic.get(&topic).into_iter().flatten() {
                    builder.add_subscriber(subnet_id, *peer_id);
                }
            }
        };

        let subscriptions = Self::builder(spec)
            .target_subnet_subscriber_count(target_subnet_subscriber_count)?
            .subnet_subscriptions(SubnetKind::Attestation, |builder| {
                track(builder, (0..spec.attestation_subnet_count).collect())
            })
            .subnet_subscriptions(SubnetKind::SyncCommittee, |builder| {
                track(builder, sync_committee_subnets.subnets())
            })
            .subnet_subscriptions(SubnetKind::DataColumn, |builder| {
                track(builder, data_column_subnets.subnets())
            })
            .build();

        subscriptions.update_metrics();
        trace!(
            subscribers_required = subscriptions.subscribers_required(),
            "Rebuilt peer subnet subscriptions"
        );
        Ok(subscriptions)
    }

    fn update_metrics(&self) {
        for subscriptions in [&self.attestation, &self.sync_committee] {
            let prefix = subscriptions.kind.label_prefix();
            for subnet_id in 0..subscriptions.subnet_count as u64 {
                let label = format!("{prefix}_{subnet_id}");
                set_int_gauge_vec(
                    &SUBNET_PEER_COUNT,
                    subscriptions.subscriber_count(subnet_id) as i64,
                    &[label.as_str()],
                );
            }
        }
        set_int_gauge_vec(&SUBSCRIBERS_REQUIRED, self.subscribers_required() as i64, &[]);
    }

    pub fn subnet_subscriptions(&self, kind: SubnetKind) -> &SubnetSubscriptions {
        match kind {
            SubnetKind::Attestation => &self.attestation,
            SubnetKind::SyncCommittee => &self.sync_committee,
            SubnetKind::DataColumn => &self.data_column,
        }
    }

    pub fn subscriber_count(&self, kind: SubnetKind, subnet_id: u64) -> usize {
        self.subnet_subscriptions(kind).subscriber_count(subnet_id)
    }

    pub fn subscriptions(&self, kind: SubnetKind, peer_id: &PeerId) -> SubnetBits {
        self.subnet_subscriptions(kind).subscriptions(peer_id)
    }

    pub fn is_subnet_relevant(&self, kind: SubnetKind, subnet_id: u64) -> bool {
        self.subnet_subscriptions(kind).is_subnet_relevant(subnet_id)
    }

    pub fn min_subscriber_count(&self, kind: SubnetKind) -> Option<usize> {
        self.subnet_subscriptions(kind).min_subscriber_count()
    }

    pub fn target_subnet_subscriber_count(&self) -> usize {
        self.target_subnet_subscriber_count
    }

    /// How many more subscribers the least covered relevant subnet needs to reach the target.
    pub fn subscribers_required(&self) -> usize {
        SubnetKind::ALL
            .iter()
            .filter_map(|kind| self.min_subscriber_count(*kind))
            .min()
            .map(|min| self.target_subnet_subscriber_count.saturating_sub(min))
            .unwrap_or(0)
    }

    pub fn create_scorer(self: &Arc<Self>) -> SubnetScorer {
        SubnetScorer::new(self.clone())
    }
}

#[derive(Debug)]
pub struct PeerSubnetSubscriptionsBuilder {
    attestation: SubnetSubscriptionsBuilder,
    sync_committee: SubnetSubscriptionsBuilder,
    data_column: SubnetSubscriptionsBuilder,
    target_subnet_subscriber_count: usize,
}

impl PeerSubnetSubscriptionsBuilder {
    pub fn target_subnet_subscriber_count(
        mut self,
        target_subnet_subscriber_count: i64,
    ) -> Result<Self, ConfigurationError> {
        self.target_subnet_subscriber_count = usize::try_from(target_subnet_subscriber_count)
            .map_err(|_| {
                ConfigurationError::InvalidTargetSubnetSubscriberCount(
                    target_subnet_subscriber_count,
                )
            })?;
        Ok(self)
    }

    pub fn subnet_subscriptions(
        mut self,
        kind: SubnetKind,
        configure: impl FnOnce(&mut SubnetSubscriptionsBuilder),
    ) -> Self {
        let builder = match kind {
            SubnetKind::Attestation => &mut self.attestation,
            SubnetKind::SyncCommittee => &mut self.sync_committee,
            SubnetKind::DataColumn => &mut self.data_column,
        };
        configure(builder);
        self
    }

    pub fn build(self) -> PeerSubnetSubscriptions {
        PeerSubnetSubscriptions {
            attestation: self.attestation.build(),
            sync_committee: self.sync_committee.build(),
            data_column: self.data_column.build(),
            target_subnet_subscriber_count: self.target_subnet_subscriber_count,
        }
    }
}
