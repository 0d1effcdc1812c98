pub mod encoding;
pub mod error;
pub mod manager;
pub mod message;
pub mod network;
pub mod topics;

pub use error::GossipsubError;
pub use manager::GossipManager;
pub use network::{GossipNetwork, InMemoryGossipNetwork};
pub use topics::{GossipTopic, GossipTopicKind};
