use std::sync::{Arc, LazyLock};

use alloy_primitives::{aliases::B32, fixed_bytes};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::subnet::SubnetKind;

/// Upper bound on any subnet id space. Subnet bitsets are allocated with this capacity.
pub const MAX_SUBNET_COUNT: u64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Minimal,
    Custom,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NetworkSpecError {
    #[error("{kind} subnet count must be between 1 and {MAX_SUBNET_COUNT}, got {count}")]
    InvalidSubnetCount { kind: SubnetKind, count: u64 },

    #[error("seconds_per_slot must be greater than zero")]
    ZeroSlotDuration,

    #[error("number_of_columns must be greater than zero")]
    ZeroColumns,
}

/// Networking constants of the chain this node follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub network: Network,
    pub seconds_per_slot: u64,
    pub slots_per_epoch: u64,
    pub genesis_time: u64,
    pub attestation_subnet_count: u64,
    pub sync_committee_subnet_count: u64,
    pub data_column_sidecar_subnet_count: u64,
    pub number_of_columns: u64,
    #[serde(with = "crate::b32_hex")]
    pub fork_digest: B32,
}

impl NetworkSpec {
    pub fn subnet_count(&self, kind: SubnetKind) -> u64 {
        match kind {
            SubnetKind::Attestation => self.attestation_subnet_count,
            SubnetKind::SyncCommittee => self.sync_committee_subnet_count,
            SubnetKind::DataColumn => self.data_column_sidecar_subnet_count,
        }
    }

    pub fn validate(&self) -> Result<(), NetworkSpecError> {
        if self.seconds_per_slot == 0 {
            return Err(NetworkSpecError::ZeroSlotDuration);
        }
        if self.number_of_columns == 0 {
            return Err(NetworkSpecError::ZeroColumns);
        }
        for kind in SubnetKind::ALL {
            let count = self.subnet_count(kind);
            if count == 0 || count > MAX_SUBNET_COUNT {
                return Err(NetworkSpecError::InvalidSubnetCount { kind, count });
            }
        }
        Ok(())
    }

    /// Slot at the given unix time, saturating at zero before genesis.
    pub fn slot_at(&self, unix_seconds: u64) -> u64 {
        unix_seconds.saturating_sub(self.genesis_time) / self.seconds_per_slot
    }
}

pub static MAINNET: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Mainnet,
        seconds_per_slot: 12,
        slots_per_epoch: 32,
        genesis_time: 1606824023,
        attestation_subnet_count: 64,
        sync_committee_subnet_count: 4,
        data_column_sidecar_subnet_count: 128,
        number_of_columns: 128,
        fork_digest: fixed_bytes!("0x6a95a1a9"),
    }
    .into()
});

pub static MINIMAL: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Minimal,
        seconds_per_slot: 6,
        slots_per_epoch: 8,
        genesis_time: 0,
        attestation_subnet_count: 64,
        sync_committee_subnet_count: 4,
        data_column_sidecar_subnet_count: 128,
        number_of_columns: 128,
        fork_digest: fixed_bytes!("0x00000000"),
    }
    .into()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(MAINNET.validate(), Ok(()));
        assert_eq!(MINIMAL.validate(), Ok(()));
    }

    #[test]
    fn test_subnet_count_out_of_range() {
        let mut spec = (**MAINNET).clone();
        spec.data_column_sidecar_subnet_count = MAX_SUBNET_COUNT + 1;
        assert_eq!(
            spec.validate(),
            Err(NetworkSpecError::InvalidSubnetCount {
                kind: SubnetKind::DataColumn,
                count: MAX_SUBNET_COUNT + 1,
            })
        );

        spec.data_column_sidecar_subnet_count = 128;
        spec.sync_committee_subnet_count = 0;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_slot_at() {
        let spec = &MAINNET;
        assert_eq!(spec.slot_at(0), 0);
        assert_eq!(spec.slot_at(spec.genesis_time), 0);
        assert_eq!(spec.slot_at(spec.genesis_time + 25), 2);
    }
}
