use std::fmt;

use alloy_primitives::{aliases::B32, hex};
use skein_network_spec::subnet::SubnetKind;

use crate::error::GossipsubError;

pub const TOPIC_PREFIX: &str = "eth2";
pub const ENCODING_POSTFIX: &str = "ssz_snappy";

pub const BEACON_ATTESTATION_PREFIX: &str = "beacon_attestation_";
pub const SYNC_COMMITTEE_PREFIX: &str = "sync_committee_";
pub const DATA_COLUMN_SIDECAR_PREFIX: &str = "data_column_sidecar_";
pub const SYNC_COMMITTEE_CONTRIBUTION_AND_PROOF_TOPIC: &str =
    "sync_committee_contribution_and_proof";

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum GossipTopicKind {
    BeaconAttestation(u64),
    SyncCommittee(u64),
    DataColumnSidecar(u64),
    SyncCommitteeContributionAndProof,
}

impl GossipTopicKind {
    pub fn for_subnet(kind: SubnetKind, subnet_id: u64) -> Self {
        match kind {
            SubnetKind::Attestation => GossipTopicKind::BeaconAttestation(subnet_id),
            SubnetKind::SyncCommittee => GossipTopicKind::SyncCommittee(subnet_id),
            SubnetKind::DataColumn => GossipTopicKind::DataColumnSidecar(subnet_id),
        }
    }

    pub fn subnet(&self) -> Option<(SubnetKind, u64)> {
        match self {
            GossipTopicKind::BeaconAttestation(id) => Some((SubnetKind::Attestation, *id)),
            GossipTopicKind::SyncCommittee(id) => Some((SubnetKind::SyncCommittee, *id)),
            GossipTopicKind::DataColumnSidecar(id) => Some((SubnetKind::DataColumn, *id)),
            GossipTopicKind::SyncCommitteeContributionAndProof => None,
        }
    }

    fn parse(name: &str) -> Result<Self, GossipsubError> {
        if name == SYNC_COMMITTEE_CONTRIBUTION_AND_PROOF_TOPIC {
            return Ok(GossipTopicKind::SyncCommitteeContributionAndProof);
        }

        let (constructor, subnet_str): (fn(u64) -> Self, &str) =
            if let Some(rest) = name.strip_prefix(BEACON_ATTESTATION_PREFIX) {
                (GossipTopicKind::BeaconAttestation, rest)
            } else if let Some(rest) = name.strip_prefix(SYNC_COMMITTEE_PREFIX) {
                (GossipTopicKind::SyncCommittee, rest)
            } else if let Some(rest) = name.strip_prefix(DATA_COLUMN_SIDECAR_PREFIX) {
                (GossipTopicKind::DataColumnSidecar, rest)
            } else {
                return Err(GossipsubError::InvalidTopic(format!(
                    "Invalid topic: {name:?}"
                )));
            };

        let subnet_id = subnet_str.parse::<u64>().map_err(|err| {
            GossipsubError::InvalidTopic(format!(
                "Invalid subnet id: {subnet_str:?}, error: {err}"
            ))
        })?;
        Ok(constructor(subnet_id))
    }
}

impl fmt::Display for GossipTopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GossipTopicKind::BeaconAttestation(id) => write!(f, "{BEACON_ATTESTATION_PREFIX}{id}"),
            GossipTopicKind::SyncCommittee(id) => write!(f, "{SYNC_COMMITTEE_PREFIX}{id}"),
            GossipTopicKind::DataColumnSidecar(id) => write!(f, "{DATA_COLUMN_SIDECAR_PREFIX}{id}"),
            GossipTopicKind::SyncCommitteeContributionAndProof => {
                write!(f, "{SYNC_COMMITTEE_CONTRIBUTION_AND_PROOF_TOPIC}")
            }
        }
    }
}

/// A fully qualified topic, `/eth2/{fork_digest}/{name}/ssz_snappy`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct GossipTopic {
    pub fork_digest: B32,
    pub kind: GossipTopicKind,
}

impl GossipTopic {
    pub fn new(fork_digest: B32, kind: GossipTopicKind) -> Self {
        Self { fork_digest, kind }
    }

    pub fn for_subnet(fork_digest: B32, kind: SubnetKind, subnet_id: u64) -> Self {
        Self::new(fork_digest, GossipTopicKind::for_subnet(kind, subnet_id))
    }

    pub fn from_topic_str(topic: &str) -> Result<Self, GossipsubError> {
        let topic_parts: Vec<&str> = topic.trim_start_matches('/').split('/').collect();

        if topic_parts.len() != 4
            || topic_parts[0] != TOPIC_PREFIX
            || topic_parts[3] != ENCODING_POSTFIX
        {
            return Err(GossipsubError::InvalidTopic(format!(
                "Invalid topic format: {topic:?}"
            )));
        }

        let digest_bytes = hex::decode(topic_parts[1]).map_err(|err| {
            GossipsubError::InvalidTopic(format!(
                "Invalid fork digest: {:?}, error: {err}",
                topic_parts[1]
            ))
        })?;
        let fork_digest = B32::try_from(digest_bytes.as_slice()).map_err(|_| {
            GossipsubError::InvalidTopic(format!(
                "Fork digest must be 4 bytes: {:?}",
                topic_parts[1]
            ))
        })?;

        Ok(Self {
            fork_digest,
            kind: GossipTopicKind::parse(topic_parts[2])?,
        })
    }
}

impl fmt::Display for GossipTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{TOPIC_PREFIX}/{}/{}/{ENCODING_POSTFIX}",
            hex::encode(self.fork_digest),
            self.kind
        )
    }
}

impl From<GossipTopic> for String {
    fn from(topic: GossipTopic) -> Self {
        topic.to_string()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::fixed_bytes;
    use rstest::rstest;

    use super::*;

    const DIGEST: B32 = fixed_bytes!("0x6a95a1a9");

    #[rstest]
    #[case(GossipTopicKind::BeaconAttestation(5), "/eth2/6a95a1a9/beacon_attestation_5/ssz_snappy")]
    #[case(GossipTopicKind::SyncCommittee(3), "/eth2/6a95a1a9/sync_committee_3/ssz_snappy")]
    #[case(
        GossipTopicKind::DataColumnSidecar(127),
        "/eth2/6a95a1a9/data_column_sidecar_127/ssz_snappy"
    )]
    #[case(
        GossipTopicKind::SyncCommitteeContributionAndProof,
        "/eth2/6a95a1a9/sync_committee_contribution_and_proof/ssz_snappy"
    )]
    fn test_topic_names(#[case] kind: GossipTopicKind, #[case] expected: &str) {
        let topic = GossipTopic::new(DIGEST, kind);
        assert_eq!(topic.to_string(), expected);
        assert_eq!(
            GossipTopic::from_topic_str(expected).expect("valid topic"),
            topic
        );
    }

    #[rstest]
    #[case("/eth2/6a95a1a9/beacon_block/ssz_snappy")]
    #[case("/eth2/6a95a1a9/beacon_attestation_x/ssz_snappy")]
    #[case("/eth2/6a95a1/sync_committee_1/ssz_snappy")]
    #[case("/eth2/zzzzzzzz/sync_committee_1/ssz_snappy")]
    #[case("/leanconsensus/6a95a1a9/sync_committee_1/ssz_snappy")]
    #[case("/eth2/6a95a1a9/sync_committee_1/ssz")]
    #[case("/eth2/6a95a1a9/sync_committee_1")]
    fn test_invalid_topics(#[case] topic: &str) {
        assert!(matches!(
            GossipTopic::from_topic_str(topic),
            Err(GossipsubError::InvalidTopic(_))
        ));
    }

    #[test]
    fn test_subnet_mapping() {
        for kind in SubnetKind::ALL {
            let topic = GossipTopic::for_subnet(DIGEST, kind, 2);
            assert_eq!(topic.kind.subnet(), Some((kind, 2)));
        }
        assert_eq!(
            GossipTopicKind::SyncCommitteeContributionAndProof.subnet(),
            None
        );
    }
}
