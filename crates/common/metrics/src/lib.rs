pub mod helpers;

pub use helpers::{inc_int_counter_vec, set_int_gauge_vec};
use helpers::{create_int_counter_vec, create_int_gauge_vec};
use prometheus_exporter::prometheus::{IntCounterVec, IntGaugeVec};

lazy_static::lazy_static! {
    pub static ref SUBNET_PEER_COUNT: IntGaugeVec = create_int_gauge_vec(
        "skein_subnet_peer_count",
        "Number of connected peers subscribed to each gossip subnet",
        &["subnet"]
    );

    pub static ref SUBSCRIBERS_REQUIRED: IntGaugeVec = create_int_gauge_vec(
        "skein_subnet_subscribers_required",
        "Additional subscribers needed to reach the target count on the weakest subnet",
        &[]
    );

    pub static ref RATE_LIMITER_REJECTIONS: IntCounterVec = create_int_counter_vec(
        "skein_rate_limiter_rejections_total",
        "Peer requests refused because their trailing-window budget was exhausted",
        &["resource"]
    );

    pub static ref AGGREGATION_POOL_SIZE: IntGaugeVec = create_int_gauge_vec(
        "skein_aggregation_pool_size",
        "Number of retained contributions per aggregation pool",
        &["pool"]
    );

    pub static ref GOSSIP_VALIDATION_RESULTS: IntCounterVec = create_int_counter_vec(
        "skein_gossip_validation_results_total",
        "Outcome of validating gossiped contributions",
        &["topic", "result"]
    );

    pub static ref RPC_REQUESTS: IntCounterVec = create_int_counter_vec(
        "skein_rpc_requests_total",
        "Inbound req/resp requests by protocol and outcome",
        &["protocol", "outcome"]
    );
}
