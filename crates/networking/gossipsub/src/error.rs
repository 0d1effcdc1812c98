use alloy_primitives::aliases::B32;
use ssz::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GossipsubError {
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Topic fork digest {actual} does not match {expected}")]
    ForkDigestMismatch { expected: B32, actual: B32 },

    #[error("No decoder for topic: {0}")]
    UnsupportedTopic(String),

    #[error("Snappy error: {0}")]
    Snappy(#[from] snap::Error),

    #[error("SSZ decode error: {0:?}")]
    Ssz(DecodeError),

    #[error("Payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },
}

impl From<DecodeError> for GossipsubError {
    fn from(err: DecodeError) -> Self {
        GossipsubError::Ssz(err)
    }
}
