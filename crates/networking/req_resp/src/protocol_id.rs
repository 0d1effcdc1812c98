use std::fmt;

use crate::{
    constants::{ENCODING_POSTFIX, PROTOCOL_PREFIX},
    error::RpcError,
};

/// All valid protocol name and version combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedProtocol {
    GetMetaDataV1,
    GetMetaDataV2,
    GetMetaDataV3,
    PingV1,
}

impl SupportedProtocol {
    pub const ALL: [SupportedProtocol; 4] = [
        SupportedProtocol::GetMetaDataV1,
        SupportedProtocol::GetMetaDataV2,
        SupportedProtocol::GetMetaDataV3,
        SupportedProtocol::PingV1,
    ];

    pub fn message_name(&self) -> &'static str {
        match self {
            SupportedProtocol::GetMetaDataV1 => "metadata",
            SupportedProtocol::GetMetaDataV2 => "metadata",
            SupportedProtocol::GetMetaDataV3 => "metadata",
            SupportedProtocol::PingV1 => "ping",
        }
    }

    pub fn schema_version(&self) -> &'static str {
        match self {
            SupportedProtocol::GetMetaDataV1 => "1",
            SupportedProtocol::GetMetaDataV2 => "2",
            SupportedProtocol::GetMetaDataV3 => "3",
            SupportedProtocol::PingV1 => "1",
        }
    }

    pub fn protocol_id(&self) -> String {
        format!(
            "{PROTOCOL_PREFIX}/{}/{}/{ENCODING_POSTFIX}",
            self.message_name(),
            self.schema_version()
        )
    }
}

impl fmt::Display for SupportedProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.protocol_id())
    }
}

/// Splits `/eth2/beacon_chain/req/{name}/{version}/ssz_snappy` into name and version.
fn parse_protocol_id(protocol_id: &str) -> Result<(&str, &str), RpcError> {
    let invalid = || RpcError::InvalidProtocolId(protocol_id.to_string());
    let rest = protocol_id
        .strip_prefix(PROTOCOL_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(invalid)?;
    let parts: Vec<&str> = rest.split('/').collect();
    if parts.len() != 3 || parts[2] != ENCODING_POSTFIX {
        return Err(invalid());
    }
    Ok((parts[0], parts[1]))
}

/// Version requested by a metadata protocol id. The version is returned even when this node
/// has no schema for it; mapping it to a schema is the handler's job.
pub fn extract_metadata_version(protocol_id: &str) -> Result<u8, RpcError> {
    let (name, version) = parse_protocol_id(protocol_id)?;
    if name != SupportedProtocol::GetMetaDataV1.message_name() {
        return Err(RpcError::InvalidProtocolId(protocol_id.to_string()));
    }
    version
        .parse::<u8>()
        .map_err(|_| RpcError::InvalidProtocolId(protocol_id.to_string()))
}

impl TryFrom<&str> for SupportedProtocol {
    type Error = RpcError;

    fn try_from(protocol_id: &str) -> Result<Self, Self::Error> {
        let (name, version) = parse_protocol_id(protocol_id)?;
        SupportedProtocol::ALL
            .into_iter()
            .find(|protocol| {
                protocol.message_name() == name && protocol.schema_version() == version
            })
            .ok_or_else(|| RpcError::InvalidProtocolId(protocol_id.to_string()))
    }
}
