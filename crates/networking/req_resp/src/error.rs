use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("Unknown protocol version: {0}")]
    UnknownProtocolVersion(u8),

    #[error("Invalid protocol id: {0}")]
    InvalidProtocolId(String),
}
