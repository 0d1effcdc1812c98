use std::sync::Arc;

use clap::Args;
use serde::{Deserialize, Deserializer};
use skein_network_spec::{cli::network_parser, networks::NetworkSpec};
use skein_rate_limiter::{
    RateLimitConfig,
    config::{
        DEFAULT_PEER_BLOB_SIDECARS_RATE_LIMIT, DEFAULT_PEER_BLOCKS_RATE_LIMIT,
        DEFAULT_PEER_REQUEST_LIMIT,
    },
};
use skein_subnets::subscriptions::DEFAULT_TARGET_SUBNET_SUBSCRIBER_COUNT;

pub const DEFAULT_NETWORK: &str = "mainnet";
pub const DEFAULT_TARGET_PEER_COUNT: usize = 64;
pub const DEFAULT_CUSTODY_GROUP_COUNT: u64 = 4;

#[derive(Debug, Clone, Args, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    #[arg(
        long,
        help = "Choose mainnet, minimal, or a path to a network spec YAML file",
        default_value = DEFAULT_NETWORK,
        value_parser = network_parser
    )]
    #[serde(default = "default_network", deserialize_with = "deserialize_network")]
    pub network: Arc<NetworkSpec>,

    /// Number of peers the node tries to stay connected to
    #[arg(long, env = "SKEIN_TARGET_PEER_COUNT", default_value_t = DEFAULT_TARGET_PEER_COUNT)]
    #[serde(default = "default_target_peer_count")]
    pub target_peer_count: usize,

    /// Subscribers wanted on every relevant subnet before it stops attracting new peers
    #[arg(
        long,
        default_value_t = DEFAULT_TARGET_SUBNET_SUBSCRIBER_COUNT as i64,
        allow_negative_numbers = true
    )]
    #[serde(default = "default_target_subnet_subscriber_count")]
    pub target_subnet_subscriber_count: i64,

    /// Blocks a single peer may request per rate limit window
    #[arg(long, default_value_t = DEFAULT_PEER_BLOCKS_RATE_LIMIT)]
    #[serde(default = "default_peer_blocks_rate_limit")]
    pub peer_blocks_rate_limit: u64,

    /// Blob sidecars a single peer may request per rate limit window
    #[arg(long, default_value_t = DEFAULT_PEER_BLOB_SIDECARS_RATE_LIMIT)]
    #[serde(default = "default_peer_blob_sidecars_rate_limit")]
    pub peer_blob_sidecars_rate_limit: u64,

    /// Req/resp requests a single peer may make per rate limit window
    #[arg(long, default_value_t = DEFAULT_PEER_REQUEST_LIMIT)]
    #[serde(default = "default_peer_request_limit")]
    pub peer_request_limit: u64,

    /// Custody group count advertised in metadata
    #[arg(long, default_value_t = DEFAULT_CUSTODY_GROUP_COUNT)]
    #[serde(default = "default_custody_group_count")]
    pub custody_group_count: u64,
}

impl ManagerConfig {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(
            self.peer_blocks_rate_limit,
            self.peer_blob_sidecars_rate_limit,
            self.peer_request_limit,
            self.network.number_of_columns,
        )
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            target_peer_count: DEFAULT_TARGET_PEER_COUNT,
            target_subnet_subscriber_count: default_target_subnet_subscriber_count(),
            peer_blocks_rate_limit: DEFAULT_PEER_BLOCKS_RATE_LIMIT,
            peer_blob_sidecars_rate_limit: DEFAULT_PEER_BLOB_SIDECARS_RATE_LIMIT,
            peer_request_limit: DEFAULT_PEER_REQUEST_LIMIT,
            custody_group_count: DEFAULT_CUSTODY_GROUP_COUNT,
        }
    }
}

fn deserialize_network<'de, D>(deserializer: D) -> Result<Arc<NetworkSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let network = String::deserialize(deserializer)?;
    network_parser(&network).map_err(serde::de::Error::custom)
}

fn default_network() -> Arc<NetworkSpec> {
    skein_network_spec::networks::MAINNET.clone()
}

fn default_target_peer_count() -> usize {
    DEFAULT_TARGET_PEER_COUNT
}

fn default_target_subnet_subscriber_count() -> i64 {
    DEFAULT_TARGET_SUBNET_SUBSCRIBER_COUNT as i64
}

fn default_peer_blocks_rate_limit() -> u64 {
    DEFAULT_PEER_BLOCKS_RATE_LIMIT
}

fn default_peer_blob_sidecars_rate_limit() -> u64 {
    DEFAULT_PEER_BLOB_SIDECARS_RATE_LIMIT
}

fn default_peer_request_limit() -> u64 {
    DEFAULT_PEER_REQUEST_LIMIT
}

fn default_custody_group_count() -> u64 {
    DEFAULT_CUSTODY_GROUP_COUNT
}
