use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid target subnet subscriber count: {0}")]
    InvalidTargetSubnetSubscriberCount(i64),
}
