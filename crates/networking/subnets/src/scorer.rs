use std::sync::Arc;

use skein_network_spec::{networks::NetworkSpec, subnet::SubnetKind};
use skein_peer::PeerId;

use crate::{bits::SubnetBits, subscriptions::PeerSubnetSubscriptions};

/// Score of a subnet nobody else covers.
pub const MAX_SUBNET_SCORE: i64 = 1000;

pub trait PeerScorer: Send + Sync {
    fn score_existing_peer(&self, peer_id: &PeerId) -> i64;

    fn score_candidate_peer(&self, candidate: &CandidatePeer) -> i64;
}

/// Subnets a not yet connected peer advertises, e.g. in its discovery record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePeer {
    pub attestation_subnets: SubnetBits,
    pub sync_committee_subnets: SubnetBits,
    pub data_column_subnets: SubnetBits,
}

impl CandidatePeer {
    /// A candidate advertising nothing, sized for `spec`.
    pub fn new(spec: &NetworkSpec) -> Self {
        let bits = |kind: SubnetKind| SubnetBits::new(spec.subnet_count(kind) as usize);
        Self {
            attestation_subnets: bits(SubnetKind::Attestation),
            sync_committee_subnets: bits(SubnetKind::SyncCommittee),
            data_column_subnets: bits(SubnetKind::DataColumn),
        }
    }
}

/// Favours peers on under-subscribed subnets. Each relevant subnet a peer covers is worth
/// `MAX_SUBNET_SCORE / (k + 1)^2`, where `k` is the number of other subscribers.
#[derive(Debug, Clone)]
pub struct SubnetScorer {
    subscriptions: Arc<PeerSubnetSubscriptions>,
}

impl SubnetScorer {
    pub fn new(subscriptions: Arc<PeerSubnetSubscriptions>) -> Self {
        Self { subscriptions }
    }

    fn score(
        &self,
        subnets: [(SubnetKind, &SubnetBits); 3],
        subscriber_count_to_score: fn(usize) -> i64,
    ) -> i64 {
        subnets
            .into_iter()
            .map(|(kind, bits)| {
                bits.iter_set()
                    .filter(|subnet_id| self.subscriptions.is_subnet_relevant(kind, *subnet_id))
                    .map(|subnet_id| {
                        let subscriber_count = self.subscriptions.subscriber_count(kind, subnet_id);
                        subscriber_count_to_score(subscriber_count)
                    })
                    .sum::<i64>()
            })
            .sum()
    }
}

// The peer being scored is already counted among the subscribers.
fn score_subnet_for_existing_peer(subscriber_count: usize) -> i64 {
    score_subnet_for_candidate_peer(subscriber_count.saturating_sub(1))
}

fn score_subnet_for_candidate_peer(other_subscribers: usize) -> i64 {
    let value = other_subscribers as i64 + 1;
    MAX_SUBNET_SCORE / value.saturating_mul(value)
}

impl PeerScorer for SubnetScorer {
    fn score_existing_peer(&self, peer_id: &PeerId) -> i64 {
        let attestation = self
            .subscriptions
            .subscriptions(SubnetKind::Attestation, peer_id);
        let sync_committee = self
            .subscriptions
            .subscriptions(SubnetKind::SyncCommittee, peer_id);
        let data_column = self
            .subscriptions
            .subscriptions(SubnetKind::DataColumn, peer_id);
        self.score(
            [
                (SubnetKind::Attestation, &attestation),
                (SubnetKind::SyncCommittee, &sync_committee),
                (SubnetKind::DataColumn, &data_column),
            ],
            score_subnet_for_existing_peer,
        )
    }

    fn score_candidate_peer(&self, candidate: &CandidatePeer) -> i64 {
        self.score(
            [
                (SubnetKind::Attestation, &candidate.attestation_subnets),
                (SubnetKind::SyncCommittee, &candidate.sync_committee_subnets),
                (SubnetKind::DataColumn, &candidate.data_column_subnets),
            ],
            score_subnet_for_candidate_peer,
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use skein_network_spec::networks::MAINNET;

    use super::*;

    fn snapshot(
        counts: &[(SubnetKind, u64, usize)],
        relevant: &[(SubnetKind, u64)],
    ) -> (Arc<PeerSubnetSubscriptions>, Vec<PeerId>) {
        let mut peers = Vec::new();
        let mut builder = PeerSubnetSubscriptions::builder(&MAINNET);
        for kind in SubnetKind::ALL {
            builder = builder.subnet_subscriptions(kind, |subnet_builder| {
                for (relevant_kind, subnet_id) in relevant {
                    if *relevant_kind == kind {
                        subnet_builder.add_relevant_subnet(*subnet_id);
                    }
                }
                for (count_kind, subnet_id, count) in counts {
                    if *count_kind != kind {
                        continue;
                    }
                    for _ in 0..*count {
                        let peer = PeerId::random();
                        subnet_builder.add_subscriber(*subnet_id, peer);
                        peers.push(peer);
                    }
                }
            });
        }
        (Arc::new(builder.build()), peers)
    }

    #[rstest]
    #[case(0, 1000)]
    #[case(1, 250)]
    #[case(2, 111)]
    #[case(3, 62)]
    #[case(9, 10)]
    #[case(40, 0)]
    fn test_candidate_score_by_subscriber_count(#[case] subscribers: usize, #[case] expected: i64) {
        let (subscriptions, _) = snapshot(
            &[(SubnetKind::Attestation, 4, subscribers)],
            &[(SubnetKind::Attestation, 4)],
        );
        let mut candidate = CandidatePeer::new(&MAINNET);
        candidate.attestation_subnets.set(4);

        assert_eq!(
            subscriptions.create_scorer().score_candidate_peer(&candidate),
            expected
        );
    }

    #[test]
    fn test_candidate_score_strictly_decreasing() {
        let scores: Vec<i64> = (0..6).map(score_subnet_for_candidate_peer).collect();
        assert_eq!(scores[0], MAX_SUBNET_SCORE);
        assert!(scores.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[rstest]
    #[case(1, 1000)]
    #[case(2, 250)]
    #[case(3, 111)]
    fn test_existing_peer_excludes_itself(#[case] subscribers: usize, #[case] expected: i64) {
        let (subscriptions, peers) = snapshot(
            &[(SubnetKind::SyncCommittee, 1, subscribers)],
            &[(SubnetKind::SyncCommittee, 1)],
        );
        let scorer = subscriptions.create_scorer();
        assert_eq!(scorer.score_existing_peer(&peers[0]), expected);
    }

    #[test]
    fn test_existing_peer_only_scores_own_subnets() {
        let (subscriptions, peers) = snapshot(
            &[
                (SubnetKind::Attestation, 0, 1),
                (SubnetKind::Attestation, 1, 3),
            ],
            &[(SubnetKind::Attestation, 0), (SubnetKind::Attestation, 1)],
        );
        let scorer = subscriptions.create_scorer();

        assert_eq!(scorer.score_existing_peer(&peers[0]), 1000);
        assert_eq!(scorer.score_existing_peer(&peers[1]), 111);
        assert_eq!(scorer.score_existing_peer(&PeerId::random()), 0);
    }

    #[test]
    fn test_irrelevant_subnets_are_not_scored() {
        let (subscriptions, _) = snapshot(&[], &[(SubnetKind::DataColumn, 7)]);
        let mut candidate = CandidatePeer::new(&MAINNET);
        candidate.data_column_subnets.set(8);
        candidate.sync_committee_subnets.set(0);

        assert_eq!(subscriptions.create_scorer().score_candidate_peer(&candidate), 0);

        candidate.data_column_subnets.set(7);
        assert_eq!(
            subscriptions.create_scorer().score_candidate_peer(&candidate),
            MAX_SUBNET_SCORE
        );
    }

    #[test]
    fn test_scores_sum_across_kinds() {
        let (subscriptions, _) = snapshot(
            &[(SubnetKind::Attestation, 2, 1)],
            &[
                (SubnetKind::Attestation, 2),
                (SubnetKind::SyncCommittee, 0),
                (SubnetKind::DataColumn, 100),
            ],
        );
        let mut candidate = CandidatePeer::new(&MAINNET);
        candidate.attestation_subnets.set(2);
        candidate.sync_committee_subnets.set(0);
        candidate.data_column_subnets.set(100);

        assert_eq!(
            subscriptions.create_scorer().score_candidate_peer(&candidate),
            250 + 1000 + 1000
        );
    }
}
