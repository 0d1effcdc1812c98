use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Sub-key {0} is outside the aggregate's range")]
    InvalidSubKey(u64),

    #[error("Participation bit {0} does not fit in the aggregate")]
    BitIndexOutOfRange(usize),

    #[error("Signature aggregation failed: {0}")]
    Signature(#[from] anyhow::Error),
}
