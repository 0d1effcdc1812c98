use std::{sync::Arc, time::Duration};

use parking_lot::RwLock;
use skein_aggregation_pool::{
    ContributionValidator, PoolConfig, SignatureAggregator, SyncContributionPool,
    ValidationResult, bls::BLSSignature, sync_committee::SignedContributionAndProof,
};
use skein_gossipsub::{GossipManager, GossipNetwork};
use skein_network_spec::networks::NetworkSpec;
use skein_peer::{ConnectionState, Direction, PeerId};
use skein_rate_limiter::{RateLimiter, SystemTimeProvider, TimeProvider};
use skein_req_resp::{
    MetadataMessagesFactory, PeerMetadataStore, ResponseCallback, RpcProtocolHandler,
    messages::{meta_data::MetaData, ping::Ping},
};
use skein_subnets::{PeerSubnetSubscriptions, SubnetScorer, SubnetSubscriptionService};
use tokio::{sync::mpsc, task::JoinHandle, time::interval};
use tracing::{debug, error, info, warn};

use crate::{config::ManagerConfig, network_state::NetworkState};

/// Everything the transport layer hands to the manager.
pub enum NetworkEvent {
    PeerConnected {
        peer_id: PeerId,
        direction: Direction,
    },
    PeerDisconnected {
        peer_id: PeerId,
    },
    GossipMessage {
        topic: String,
        data: Vec<u8>,
        source: PeerId,
    },
    PingRequest {
        peer_id: PeerId,
        request: Ping,
        callback: Box<dyn ResponseCallback<Ping>>,
    },
    MetaDataRequest {
        peer_id: PeerId,
        protocol_id: String,
        callback: Box<dyn ResponseCallback<MetaData>>,
    },
}

/// The `NetworkManagerService` ties the subnet, gossip and req/resp components together.
/// Its core responsibilities include:
/// - Keeping the peer table, rate limits and peer metadata in step with connections
/// - Spawning validation for each inbound gossip message
/// - Pruning the contribution pool and rebuilding the subnet snapshot every slot
pub struct NetworkManagerService {
    pub config: ManagerConfig,
    manager_receiver: mpsc::UnboundedReceiver<NetworkEvent>,
    pub network_state: Arc<NetworkState>,
    pub gossip_manager: Arc<GossipManager>,
    pub contribution_pool: Arc<SyncContributionPool>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rpc_handler: Arc<RpcProtocolHandler>,
    pub attestation_subnets: Arc<SubnetSubscriptionService>,
    pub sync_committee_subnets: Arc<SubnetSubscriptionService>,
    pub data_column_subnets: Arc<SubnetSubscriptionService>,
    subnet_subscriptions: RwLock<Arc<PeerSubnetSubscriptions>>,
}

impl NetworkManagerService {
    /// Creates a new `NetworkManagerService` instance.
    ///
    /// Fails if the configured target subnet subscriber count is invalid.
    pub fn new(
        config: ManagerConfig,
        network: Arc<dyn GossipNetwork>,
        contribution_validator: Arc<dyn ContributionValidator<SignedContributionAndProof>>,
        signature_aggregator: Arc<dyn SignatureAggregator<BLSSignature>>,
        manager_receiver: mpsc::UnboundedReceiver<NetworkEvent>,
    ) -> anyhow::Result<Self> {
        let contribution_pool = Arc::new(SyncContributionPool::new(
            "sync_committee_contribution",
            contribution_validator,
            signature_aggregator,
            PoolConfig::default(),
        ));
        let gossip_manager = Arc::new(GossipManager::new(
            network,
            config.network.fork_digest,
            contribution_pool.clone(),
        ));

        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_config(), time_provider));
        let rpc_handler = Arc::new(RpcProtocolHandler::new(
            rate_limiter.clone(),
            Arc::new(MetadataMessagesFactory::new(config.custody_group_count)),
            Arc::new(PeerMetadataStore::new()),
        ));

        let attestation_subnets = Arc::new(SubnetSubscriptionService::default());
        let sync_committee_subnets = Arc::new(SubnetSubscriptionService::default());
        let data_column_subnets = Arc::new(SubnetSubscriptionService::default());
        let subnet_subscriptions = PeerSubnetSubscriptions::create(
            &config.network,
            gossip_manager.network().as_ref(),
            &sync_committee_subnets,
            &data_column_subnets,
            config.target_subnet_subscriber_count,
        )?;

        Ok(Self {
            config,
            manager_receiver,
            network_state: Arc::new(NetworkState::new()),
            gossip_manager,
            contribution_pool,
            rate_limiter,
            rpc_handler,
            attestation_subnets,
            sync_committee_subnets,
            data_column_subnets,
            subnet_subscriptions: RwLock::new(Arc::new(subnet_subscriptions)),
        })
    }

    pub fn network_spec(&self) -> &Arc<NetworkSpec> {
        &self.config.network
    }

    /// Latest immutable subnet snapshot.
    pub fn subnet_subscriptions(&self) -> Arc<PeerSubnetSubscriptions> {
        self.subnet_subscriptions.read().clone()
    }

    pub fn peer_scorer(&self) -> SubnetScorer {
        self.subnet_subscriptions().create_scorer()
    }

    /// Prunes expired contributions, swaps in a fresh subnet snapshot and refreshes the subnets
    /// advertised in metadata.
    pub fn on_slot_tick(&self, current_slot: u64) -> anyhow::Result<()> {
        self.contribution_pool.on_slot(current_slot);

        let subscriptions = PeerSubnetSubscriptions::create(
            &self.config.network,
            self.gossip_manager.network().as_ref(),
            &self.sync_committee_subnets,
            &self.data_column_subnets,
            self.config.target_subnet_subscriber_count,
        )?;
        *self.subnet_subscriptions.write() = Arc::new(subscriptions);

        let metadata_factory = self.rpc_handler.metadata_factory();
        metadata_factory.update_attestation_subnets(&self.attestation_subnets.subnets());
        metadata_factory.update_sync_committee_subnets(&self.sync_committee_subnets.subnets());
        Ok(())
    }

    pub fn on_peer_connected(&self, peer_id: PeerId, direction: Direction) {
        self.network_state
            .upsert_peer(peer_id, ConnectionState::Connected, direction);
        self.rate_limiter.on_peer_connected(peer_id);
        self.rpc_handler.peer_metadata().on_peer_connected(peer_id);

        let connected = self.network_state.connected_peer_count();
        if connected > self.config.target_peer_count {
            debug!(
                connected,
                target = self.config.target_peer_count,
                "Connected peers above target"
            );
        }
    }

    pub fn on_peer_disconnected(&self, peer_id: &PeerId) {
        self.network_state
            .upsert_peer(*peer_id, ConnectionState::Disconnected, Direction::Unknown);
        self.rate_limiter.on_peer_disconnected(peer_id);
        self.rpc_handler.peer_metadata().remove(peer_id);
    }

    /// Dispatches one event. Gossip validation runs on its own task so the caller is never
    /// blocked on it; the task handle is returned for callers that want the verdict.
    pub fn handle_event(&self, event: NetworkEvent) -> Option<JoinHandle<ValidationResult>> {
        match event {
            NetworkEvent::PeerConnected { peer_id, direction } => {
                self.on_peer_connected(peer_id, direction);
                None
            }
            NetworkEvent::PeerDisconnected { peer_id } => {
                self.on_peer_disconnected(&peer_id);
                None
            }
            NetworkEvent::GossipMessage {
                topic,
                data,
                source,
            } => {
                self.network_state.mark_seen(&source);
                let gossip_manager = self.gossip_manager.clone();
                Some(tokio::spawn(async move {
                    gossip_manager.handle_message(&topic, &data, source).await
                }))
            }
            NetworkEvent::PingRequest {
                peer_id,
                request,
                mut callback,
            } => {
                self.rpc_handler
                    .handle_ping(&peer_id, request, callback.as_mut());
                None
            }
            NetworkEvent::MetaDataRequest {
                peer_id,
                protocol_id,
                mut callback,
            } => {
                self.rpc_handler
                    .handle_metadata(&peer_id, &protocol_id, callback.as_mut());
                None
            }
        }
    }

    /// Starts the manager service, which dispatches network events and drives slot ticks until
    /// the event channel closes.
    pub async fn start(mut self) {
        let seconds_per_slot = self.config.network.seconds_per_slot;
        let mut slot_interval = interval(Duration::from_secs(seconds_per_slot));
        info!(seconds_per_slot, "Network manager started");

        loop {
            tokio::select! {
                _ = slot_interval.tick() => {
                    let now = SystemTimeProvider.now().as_secs();
                    let current_slot = self.config.network.slot_at(now);
                    if let Err(err) = self.on_slot_tick(current_slot) {
                        error!("Failed to process slot tick: {err}");
                    }
                }
                event = self.manager_receiver.recv() => {
                    let Some(event) = event else {
                        warn!("Network event channel closed, stopping manager");
                        break;
                    };
                    // Gossip verdicts are reported by the gossip manager itself.
                    drop(self.handle_event(event));
                }
            }
        }
    }
}
