pub mod bls;
pub mod contribution;
pub mod errors;
pub mod pool;
pub mod sync_committee;
pub mod validation;

pub use contribution::{Contribution, ContributionKey};
pub use pool::{AggregationPool, PoolConfig};
pub use validation::{
    ContributionAddedSubscriber, ContributionValidator, SignatureAggregator, ValidationResult,
};

/// Pool of gossiped sync committee contributions used to build a block's `SyncAggregate`.
pub type SyncContributionPool = AggregationPool<sync_committee::SignedContributionAndProof>;
