use skein_aggregation_pool::sync_committee::SignedContributionAndProof;

use crate::{
    encoding,
    error::GossipsubError,
    topics::{GossipTopic, GossipTopicKind},
};

#[derive(Debug, Clone, PartialEq)]
pub enum GossipsubMessage {
    SyncCommitteeContributionAndProof(Box<SignedContributionAndProof>),
}

impl GossipsubMessage {
    pub fn decode(topic: &str, data: &[u8]) -> Result<Self, GossipsubError> {
        match GossipTopic::from_topic_str(topic)?.kind {
            GossipTopicKind::SyncCommitteeContributionAndProof => Ok(
                Self::SyncCommitteeContributionAndProof(Box::new(encoding::decode(data)?)),
            ),
            kind => Err(GossipsubError::UnsupportedTopic(kind.to_string())),
        }
    }
}
