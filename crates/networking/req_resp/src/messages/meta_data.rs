use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::BitVector;

use crate::{
    constants::{AttestationSubnetCount, SyncCommitteeSubnetCount},
    error::RpcError,
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct GetMetaDataV1 {
    #[serde(with = "serde_utils::quoted_u64")]
    pub seq_number: u64,
    pub attnets: BitVector<AttestationSubnetCount>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct GetMetaDataV2 {
    #[serde(with = "serde_utils::quoted_u64")]
    pub seq_number: u64,
    pub attnets: BitVector<AttestationSubnetCount>,
    pub syncnets: BitVector<SyncCommitteeSubnetCount>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct GetMetaDataV3 {
    #[serde(with = "serde_utils::quoted_u64")]
    pub seq_number: u64,
    pub attnets: BitVector<AttestationSubnetCount>,
    pub syncnets: BitVector<SyncCommitteeSubnetCount>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub custody_group_count: u64,
}

/// Schema used to answer a metadata request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaDataVersion {
    Phase0,
    Altair,
    Fulu,
}

impl MetaDataVersion {
    pub fn from_protocol_version(version: u8) -> Result<Self, RpcError> {
        match version {
            1 => Ok(MetaDataVersion::Phase0),
            2 => Ok(MetaDataVersion::Altair),
            3 => Ok(MetaDataVersion::Fulu),
            version => Err(RpcError::UnknownProtocolVersion(version)),
        }
    }

    pub fn protocol_version(&self) -> u8 {
        match self {
            MetaDataVersion::Phase0 => 1,
            MetaDataVersion::Altair => 2,
            MetaDataVersion::Fulu => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaData {
    V1(GetMetaDataV1),
    V2(GetMetaDataV2),
    V3(GetMetaDataV3),
}

impl MetaData {
    pub fn version(&self) -> MetaDataVersion {
        match self {
            MetaData::V1(_) => MetaDataVersion::Phase0,
            MetaData::V2(_) => MetaDataVersion::Altair,
            MetaData::V3(_) => MetaDataVersion::Fulu,
        }
    }

    pub fn seq_number(&self) -> u64 {
        match self {
            MetaData::V1(meta_data) => meta_data.seq_number,
            MetaData::V2(meta_data) => meta_data.seq_number,
            MetaData::V3(meta_data) => meta_data.seq_number,
        }
    }

    pub fn attnets(&self) -> &BitVector<AttestationSubnetCount> {
        match self {
            MetaData::V1(meta_data) => &meta_data.attnets,
            MetaData::V2(meta_data) => &meta_data.attnets,
            MetaData::V3(meta_data) => &meta_data.attnets,
        }
    }

    pub fn syncnets(&self) -> Option<&BitVector<SyncCommitteeSubnetCount>> {
        match self {
            MetaData::V1(_) => None,
            MetaData::V2(meta_data) => Some(&meta_data.syncnets),
            MetaData::V3(meta_data) => Some(&meta_data.syncnets),
        }
    }

    pub fn custody_group_count(&self) -> Option<u64> {
        match self {
            MetaData::V3(meta_data) => Some(meta_data.custody_group_count),
            _ => None,
        }
    }

    pub fn as_ssz_bytes(&self) -> Vec<u8> {
        match self {
            MetaData::V1(meta_data) => ssz::Encode::as_ssz_bytes(meta_data),
            MetaData::V2(meta_data) => ssz::Encode::as_ssz_bytes(meta_data),
            MetaData::V3(meta_data) => ssz::Encode::as_ssz_bytes(meta_data),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1, Ok(MetaDataVersion::Phase0))]
    #[case(2, Ok(MetaDataVersion::Altair))]
    #[case(3, Ok(MetaDataVersion::Fulu))]
    #[case(0, Err(RpcError::UnknownProtocolVersion(0)))]
    #[case(4, Err(RpcError::UnknownProtocolVersion(4)))]
    fn test_version_mapping(
        #[case] version: u8,
        #[case] expected: Result<MetaDataVersion, RpcError>,
    ) {
        assert_eq!(MetaDataVersion::from_protocol_version(version), expected);
        if let Ok(schema) = expected {
            assert_eq!(schema.protocol_version(), version);
        }
    }

    #[test]
    fn test_encoded_lengths() {
        // seq_number(8) + attnets(8) + syncnets(1) + custody_group_count(8)
        assert_eq!(MetaData::V1(GetMetaDataV1::default()).as_ssz_bytes().len(), 16);
        assert_eq!(MetaData::V2(GetMetaDataV2::default()).as_ssz_bytes().len(), 17);
        assert_eq!(MetaData::V3(GetMetaDataV3::default()).as_ssz_bytes().len(), 25);
    }

    #[test]
    fn test_optional_fields_follow_version() {
        let v1 = MetaData::V1(GetMetaDataV1::default());
        assert!(v1.syncnets().is_none());
        assert!(v1.custody_group_count().is_none());

        let v3 = MetaData::V3(GetMetaDataV3 {
            custody_group_count: 4,
            ..Default::default()
        });
        assert_eq!(v3.version(), MetaDataVersion::Fulu);
        assert_eq!(v3.custody_group_count(), Some(4));
        assert!(v3.syncnets().is_some());
    }
}
