use std::{
    collections::{BTreeMap, btree_map::Entry},
    sync::Arc,
};

use alloy_primitives::B256;
use parking_lot::RwLock;
use skein_metrics::{AGGREGATION_POOL_SIZE, set_int_gauge_vec};
use skein_peer::PeerId;
use tracing::{debug, trace, warn};

use crate::{
    contribution::{Contribution, ContributionKey},
    validation::{
        ContributionAddedSubscriber, ContributionValidator, SignatureAggregator, ValidationResult,
    },
};

/// Keep the current slot and two slots back, enough for one slot of clock skew either side of
/// the slot a block is being produced for.
pub const DEFAULT_RETENTION_SLOTS: u64 = 2;

// Upper bound on distinct keys per slot. A slot has at most one key per (root, sub-key), so this
// only bites when peers gossip contributions for many competing roots.
pub const DEFAULT_MAX_KEYS_PER_SLOT: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub retention_slots: u64,
    pub max_keys_per_slot: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            retention_slots: DEFAULT_RETENTION_SLOTS,
            max_keys_per_slot: DEFAULT_MAX_KEYS_PER_SLOT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreOutcome {
    Inserted,
    Replaced,
    KeptIncumbent,
    SlotFull,
    Expired,
}

#[derive(Debug)]
struct PoolState<T> {
    by_slot: BTreeMap<u64, BTreeMap<ContributionKey, T>>,
    /// Every slot below this has been pruned and may not be repopulated.
    pruned_below: u64,
}

impl<T: Contribution> PoolState<T> {
    fn matching(&self, slot: u64, root: B256) -> Vec<&T> {
        self.by_slot
            .get(&slot)
            .into_iter()
            .flat_map(|contributions| contributions.iter())
            .filter(|(key, _)| key.root == root)
            .map(|(_, contribution)| contribution)
            .collect()
    }

    fn len(&self) -> usize {
        self.by_slot.values().map(BTreeMap::len).sum()
    }
}

/// Collects validated contributions and merges the best of them into a single aggregate on
/// demand.
///
/// Only the contribution with the most participants is retained per [`ContributionKey`]; an
/// equally good newcomer never displaces the incumbent, so selection is deterministic for a
/// given acceptance order.
pub struct AggregationPool<T: Contribution> {
    name: &'static str,
    config: PoolConfig,
    validator: Arc<dyn ContributionValidator<T>>,
    aggregator: Arc<dyn SignatureAggregator<T::Signature>>,
    state: RwLock<PoolState<T>>,
    subscribers: RwLock<Vec<Arc<dyn ContributionAddedSubscriber<T>>>>,
}

impl<T: Contribution> AggregationPool<T> {
    pub fn new(
        name: &'static str,
        validator: Arc<dyn ContributionValidator<T>>,
        aggregator: Arc<dyn SignatureAggregator<T::Signature>>,
        config: PoolConfig,
    ) -> Self {
        Self {
            name,
            config,
            validator,
            aggregator,
            state: RwLock::new(PoolState {
                by_slot: BTreeMap::new(),
                pruned_below: 0,
            }),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self, subscriber: Arc<dyn ContributionAddedSubscriber<T>>) {
        self.subscribers.write().push(subscriber);
    }

    pub async fn add_local(&self, contribution: T) -> ValidationResult {
        self.add(contribution, None, false).await
    }

    pub async fn add_remote(&self, contribution: T, source: Option<PeerId>) -> ValidationResult {
        self.add(contribution, source, true).await
    }

    async fn add(
        &self,
        contribution: T,
        source: Option<PeerId>,
        is_remote: bool,
    ) -> ValidationResult {
        let key = contribution.key();
        if contribution.slot() < self.state.read().pruned_below {
            debug!(pool = self.name, ?key, ?source, "Ignoring contribution for pruned slot");
            return ValidationResult::ignore("slot already pruned");
        }
        if let Err(err) = contribution.check_key() {
            debug!(pool = self.name, ?key, ?source, "Rejecting malformed contribution: {err}");
            return ValidationResult::reject(err.to_string());
        }

        let result = self.validator.validate(&contribution).await;
        match &result {
            ValidationResult::Accept => {}
            ValidationResult::Ignore(reason) => {
                debug!(
                    pool = self.name,
                    ?key,
                    ?source,
                    is_remote,
                    %reason,
                    "Ignored contribution"
                );
                return result;
            }
            ValidationResult::Reject(reason) => {
                debug!(
                    pool = self.name,
                    ?key,
                    ?source,
                    is_remote,
                    %reason,
                    "Rejected contribution"
                );
                return result;
            }
        }

        let outcome = self.store(contribution.clone());
        trace!(pool = self.name, ?key, ?source, ?outcome, "Stored accepted contribution");
        if outcome == StoreOutcome::Expired {
            debug!(
                pool = self.name,
                ?key,
                ?source,
                "Discarding contribution whose slot was pruned during validation"
            );
            return ValidationResult::ignore("slot pruned during validation");
        }

        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber.on_contribution_added(&contribution, &result, is_remote);
        }
        result
    }

    fn store(&self, contribution: T) -> StoreOutcome {
        let key = contribution.key();
        let mut guard = self.state.write();
        let state = &mut *guard;
        if key.slot < state.pruned_below {
            return StoreOutcome::Expired;
        }

        let slot_contributions = state.by_slot.entry(key.slot).or_default();
        let slot_len = slot_contributions.len();
        let outcome = match slot_contributions.entry(key) {
            Entry::Occupied(mut incumbent) => {
                if contribution.participant_count() > incumbent.get().participant_count() {
                    incumbent.insert(contribution);
                    StoreOutcome::Replaced
                } else {
                    StoreOutcome::KeptIncumbent
                }
            }
            Entry::Vacant(_) if slot_len >= self.config.max_keys_per_slot => {
                warn!(
                    pool = self.name,
                    max_keys_per_slot = self.config.max_keys_per_slot,
                    slot = key.slot,
                    root = ?key.root,
                    sub_key = key.sub_key,
                    "Aggregation pool capacity reached, dropping contribution"
                );
                StoreOutcome::SlotFull
            }
            Entry::Vacant(vacant) => {
                vacant.insert(contribution);
                StoreOutcome::Inserted
            }
        };

        set_int_gauge_vec(&AGGREGATION_POOL_SIZE, state.len() as i64, &[self.name]);
        outcome
    }

    /// Merges the best contribution of every sub-key at `slot` for `root`. Falls back to
    /// `slot - 1` when nothing matches exactly, since a block carries the previous slot's
    /// aggregate. Returns the empty aggregate when nothing matches either way.
    pub fn aggregate_for(&self, slot: u64, root: B256) -> T::Aggregate {
        let state = self.state.read();
        let mut selected = state.matching(slot, root);
        if selected.is_empty()
            && let Some(previous_slot) = slot.checked_sub(1)
        {
            selected = state.matching(previous_slot, root);
        }
        if selected.is_empty() {
            return T::empty_aggregate();
        }

        let signatures: Vec<&T::Signature> =
            selected.iter().map(|contribution| contribution.signature()).collect();
        let signature = match self.aggregator.aggregate(&signatures) {
            Ok(signature) => signature,
            Err(err) => {
                warn!(pool = self.name, slot, ?root, "Failed to aggregate signatures: {err:?}");
                return T::empty_aggregate();
            }
        };

        match T::build_aggregate(&selected, signature) {
            Ok(aggregate) => aggregate,
            Err(err) => {
                warn!(pool = self.name, slot, ?root, "Failed to build aggregate: {err}");
                T::empty_aggregate()
            }
        }
    }

    /// Drops everything older than `current_slot - retention_slots`.
    pub fn on_slot(&self, current_slot: u64) {
        let cutoff = current_slot.saturating_sub(self.config.retention_slots);
        let mut guard = self.state.write();
        let state = &mut *guard;
        if cutoff <= state.pruned_below {
            return;
        }

        state.by_slot = state.by_slot.split_off(&cutoff);
        state.pruned_below = cutoff;
        set_int_gauge_vec(&AGGREGATION_POOL_SIZE, state.len() as i64, &[self.name]);
        trace!(pool = self.name, cutoff, "Pruned aggregation pool");
    }

    pub fn best_contribution(&self, key: &ContributionKey) -> Option<T> {
        self.state
            .read()
            .by_slot
            .get(&key.slot)
            .and_then(|contributions| contributions.get(key))
            .cloned()
    }

    pub fn contributions_for(&self, slot: u64, root: B256) -> Vec<T> {
        self.state
            .read()
            .matching(slot, root)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
