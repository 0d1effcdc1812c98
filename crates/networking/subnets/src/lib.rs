pub mod bits;
pub mod error;
pub mod scorer;
pub mod service;
pub mod subscriptions;

pub use bits::SubnetBits;
pub use error::ConfigurationError;
pub use scorer::{CandidatePeer, MAX_SUBNET_SCORE, PeerScorer, SubnetScorer};
pub use service::SubnetSubscriptionService;
pub use subscriptions::{PeerSubnetSubscriptions, SubnetSubscriptions};
