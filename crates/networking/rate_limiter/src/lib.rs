pub mod config;
pub mod limiter;
pub mod time;
pub mod tracker;

pub use config::{RateLimitConfig, ResourceKind};
pub use limiter::{PeerRateLimits, RateLimiter};
pub use time::{StubTimeProvider, SystemTimeProvider, TimeProvider};
pub use tracker::{RateTracker, RequestApproval};
