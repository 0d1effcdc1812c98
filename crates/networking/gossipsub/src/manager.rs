use std::sync::Arc;

use alloy_primitives::aliases::B32;
use skein_aggregation_pool::{
    ContributionAddedSubscriber, SyncContributionPool, ValidationResult,
    sync_committee::SignedContributionAndProof,
};
use skein_metrics::{GOSSIP_VALIDATION_RESULTS, inc_int_counter_vec};
use skein_network_spec::subnet::SubnetKind;
use skein_peer::PeerId;
use tracing::{debug, warn};

use crate::{
    encoding,
    error::GossipsubError,
    message::GossipsubMessage,
    network::GossipNetwork,
    topics::{GossipTopic, GossipTopicKind},
};

/// Publishes contributions this node produced once the pool has accepted them. Remote
/// contributions are relayed by the pub/sub router itself.
pub struct ContributionPublisher {
    network: Arc<dyn GossipNetwork>,
    topic: GossipTopic,
}

impl ContributionAddedSubscriber<SignedContributionAndProof> for ContributionPublisher {
    fn on_contribution_added(
        &self,
        contribution: &SignedContributionAndProof,
        result: &ValidationResult,
        is_remote: bool,
    ) {
        if is_remote || !result.is_accept() {
            return;
        }

        let data = match encoding::encode(contribution) {
            Ok(data) => data,
            Err(err) => {
                warn!("Failed to encode contribution for publishing: {err}");
                return;
            }
        };
        let topic = self.topic.to_string();
        if let Err(err) = self.network.publish(&topic, data) {
            warn!(%topic, "Failed to publish contribution: {err:?}");
        }
    }
}

/// Glue between the pub/sub network and the pools: derives topic names, decodes inbound
/// messages and routes them to the pool that validates them.
pub struct GossipManager {
    network: Arc<dyn GossipNetwork>,
    fork_digest: B32,
    contribution_pool: Arc<SyncContributionPool>,
}

impl GossipManager {
    /// Registers a publisher on `contribution_pool` so that accepted local contributions are
    /// gossiped.
    pub fn new(
        network: Arc<dyn GossipNetwork>,
        fork_digest: B32,
        contribution_pool: Arc<SyncContributionPool>,
    ) -> Self {
        contribution_pool.subscribe(Arc::new(ContributionPublisher {
            network: network.clone(),
            topic: GossipTopic::new(
                fork_digest,
                GossipTopicKind::SyncCommitteeContributionAndProof,
            ),
        }));
        Self {
            network,
            fork_digest,
            contribution_pool,
        }
    }

    pub fn network(&self) -> &Arc<dyn GossipNetwork> {
        &self.network
    }

    pub fn fork_digest(&self) -> B32 {
        self.fork_digest
    }

    pub fn topic_for_subnet(&self, kind: SubnetKind, subnet_id: u64) -> String {
        GossipTopic::for_subnet(self.fork_digest, kind, subnet_id).to_string()
    }

    pub fn contribution_topic(&self) -> String {
        GossipTopic::new(self.fork_digest, GossipTopicKind::SyncCommitteeContributionAndProof)
            .to_string()
    }

    /// Decodes and validates one inbound message. Anything that fails to decode, or that
    /// arrives on another fork's topic, is rejected.
    pub async fn handle_message(
        &self,
        topic: &str,
        data: &[u8],
        source: PeerId,
    ) -> ValidationResult {
        let result = match self.decode(topic, data) {
            Ok(GossipsubMessage::SyncCommitteeContributionAndProof(contribution)) => {
                self.contribution_pool
                    .add_remote(*contribution, Some(source))
                    .await
            }
            Err(err) => {
                debug!(?source, topic, "Failed to decode gossip message: {err}");
                ValidationResult::reject(err.to_string())
            }
        };

        let topic_label = GossipTopic::from_topic_str(topic)
            .map(|topic| topic_metric_label(&topic.kind))
            .unwrap_or("unknown");
        inc_int_counter_vec(&GOSSIP_VALIDATION_RESULTS, &[topic_label, result.as_str()]);
        result
    }

    fn decode(&self, topic: &str, data: &[u8]) -> Result<GossipsubMessage, GossipsubError> {
        let parsed = GossipTopic::from_topic_str(topic)?;
        if parsed.fork_digest != self.fork_digest {
            return Err(GossipsubError::ForkDigestMismatch {
                expected: self.fork_digest,
                actual: parsed.fork_digest,
            });
        }
        GossipsubMessage::decode(topic, data)
    }
}

fn topic_metric_label(kind: &GossipTopicKind) -> &'static str {
    match kind {
        GossipTopicKind::BeaconAttestation(_) => "beacon_attestation",
        GossipTopicKind::SyncCommittee(_) => "sync_committee",
        GossipTopicKind::DataColumnSidecar(_) => "data_column_sidecar",
        GossipTopicKind::SyncCommitteeContributionAndProof => {
            "sync_committee_contribution_and_proof"
        }
    }
}
