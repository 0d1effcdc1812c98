use std::fmt::Debug;

use alloy_primitives::B256;
use tree_hash_derive::TreeHash;

use crate::errors::AggregationError;

/// Where a contribution is stored. At most one contribution is retained per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TreeHash)]
pub struct ContributionKey {
    pub slot: u64,
    pub root: B256,
    /// Subcommittee or committee index, depending on the contribution kind.
    pub sub_key: u64,
}

/// A partial aggregate that peers gossip and that the pool merges into a single result.
pub trait Contribution: Debug + Clone + Send + Sync + 'static {
    type Signature: Debug + Clone + Send + Sync;
    type Aggregate: Debug + Clone + Send + Sync;

    fn key(&self) -> ContributionKey;

    fn slot(&self) -> u64 {
        self.key().slot
    }

    /// Checks that the key can be placed in an aggregate. Contributions failing this are never
    /// stored.
    fn check_key(&self) -> Result<(), AggregationError> {
        Ok(())
    }

    /// Number of set participation bits; larger is better.
    fn participant_count(&self) -> usize;

    fn signature(&self) -> &Self::Signature;

    /// Unions the participation bits of `selected`, which holds at most one contribution per
    /// sub-key, and attaches the already aggregated `signature`.
    fn build_aggregate(
        selected: &[&Self],
        signature: Self::Signature,
    ) -> Result<Self::Aggregate, AggregationError>;

    fn empty_aggregate() -> Self::Aggregate;
}
