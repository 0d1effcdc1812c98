pub mod constants;
pub mod error;
pub mod handler;
pub mod messages;
pub mod metadata_factory;
pub mod peer_metadata;
pub mod protocol_id;

pub use error::RpcError;
pub use handler::{HandlerOutcome, RequestState, ResponseCallback, RpcProtocolHandler};
pub use metadata_factory::MetadataMessagesFactory;
pub use peer_metadata::PeerMetadataStore;
pub use protocol_id::SupportedProtocol;
