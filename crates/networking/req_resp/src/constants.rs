pub const PROTOCOL_PREFIX: &str = "/eth2/beacon_chain/req";
pub const ENCODING_POSTFIX: &str = "ssz_snappy";

/// Length of the `attnets` bitfield advertised in metadata.
pub type AttestationSubnetCount = ssz_types::typenum::U64;

/// Length of the `syncnets` bitfield advertised in metadata.
pub type SyncCommitteeSubnetCount = ssz_types::typenum::U4;
