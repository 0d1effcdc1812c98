use std::fmt;

use async_trait::async_trait;

/// Outcome of validating a contribution. Only `Accept` leads to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Accept,
    Ignore(String),
    Reject(String),
}

impl ValidationResult {
    pub fn ignore(reason: impl Into<String>) -> Self {
        ValidationResult::Ignore(reason.into())
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        ValidationResult::Reject(reason.into())
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, ValidationResult::Accept)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationResult::Accept => "accept",
            ValidationResult::Ignore(_) => "ignore",
            ValidationResult::Reject(_) => "reject",
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Accept => f.write_str("accept"),
            ValidationResult::Ignore(reason) => write!(f, "ignore: {reason}"),
            ValidationResult::Reject(reason) => write!(f, "reject: {reason}"),
        }
    }
}

/// State-transition rules deciding whether a contribution may enter the pool.
#[async_trait]
pub trait ContributionValidator<T: Sync>: Send + Sync {
    async fn validate(&self, contribution: &T) -> ValidationResult;
}

/// Combines signatures of the selected contributions into one.
pub trait SignatureAggregator<S>: Send + Sync {
    fn aggregate(&self, signatures: &[&S]) -> anyhow::Result<S>;
}

/// Notified after a contribution is accepted into the pool.
pub trait ContributionAddedSubscriber<T>: Send + Sync {
    fn on_contribution_added(&self, contribution: &T, result: &ValidationResult, is_remote: bool);
}
