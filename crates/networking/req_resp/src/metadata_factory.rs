use parking_lot::RwLock;
use ssz_types::BitVector;
use tracing::debug;

use crate::{
    constants::{AttestationSubnetCount, SyncCommitteeSubnetCount},
    messages::{
        meta_data::{GetMetaDataV1, GetMetaDataV2, GetMetaDataV3, MetaData, MetaDataVersion},
        ping::Ping,
    },
};

#[derive(Debug, Default, Clone)]
struct LocalMetadata {
    seq_number: u64,
    attnets: BitVector<AttestationSubnetCount>,
    syncnets: BitVector<SyncCommitteeSubnetCount>,
    custody_group_count: u64,
}

/// Snapshot of what this node advertises to its peers. Every change to the advertised subnets
/// or custody bumps the sequence number so peers know to re-fetch.
#[derive(Debug, Default)]
pub struct MetadataMessagesFactory {
    inner: RwLock<LocalMetadata>,
}

impl MetadataMessagesFactory {
    pub fn new(custody_group_count: u64) -> Self {
        Self {
            inner: RwLock::new(LocalMetadata {
                custody_group_count,
                ..Default::default()
            }),
        }
    }

    pub fn seq_number(&self) -> u64 {
        self.inner.read().seq_number
    }

    pub fn update_attestation_subnets(&self, subnet_ids: &[u64]) {
        let mut attnets = BitVector::<AttestationSubnetCount>::new();
        for &subnet_id in subnet_ids {
            if attnets.set(subnet_id as usize, true).is_err() {
                debug!(subnet_id, "Ignoring out of range attestation subnet");
            }
        }
        let mut inner = self.inner.write();
        if inner.attnets != attnets {
            inner.attnets = attnets;
            inner.seq_number += 1;
            debug!(seq_number = inner.seq_number, "Attestation subnets changed");
        }
    }

    pub fn update_sync_committee_subnets(&self, subnet_ids: &[u64]) {
        let mut syncnets = BitVector::<SyncCommitteeSubnetCount>::new();
        for &subnet_id in subnet_ids {
            if syncnets.set(subnet_id as usize, true).is_err() {
                debug!(subnet_id, "Ignoring out of range sync committee subnet");
            }
        }
        let mut inner = self.inner.write();
        if inner.syncnets != syncnets {
            inner.syncnets = syncnets;
            inner.seq_number += 1;
            debug!(seq_number = inner.seq_number, "Sync committee subnets changed");
        }
    }

    pub fn update_custody_group_count(&self, custody_group_count: u64) {
        let mut inner = self.inner.write();
        if inner.custody_group_count != custody_group_count {
            inner.custody_group_count = custody_group_count;
            inner.seq_number += 1;
            debug!(
                seq_number = inner.seq_number,
                custody_group_count, "Custody group count changed"
            );
        }
    }

    pub fn create_ping(&self) -> Ping {
        Ping::new(self.seq_number())
    }

    pub fn create_metadata(&self, version: MetaDataVersion) -> MetaData {
        let inner = self.inner.read();
        match version {
            MetaDataVersion::Phase0 => MetaData::V1(GetMetaDataV1 {
                seq_number: inner.seq_number,
                attnets: inner.attnets.clone(),
            }),
            MetaDataVersion::Altair => MetaData::V2(GetMetaDataV2 {
                seq_number: inner.seq_number,
                attnets: inner.attnets.clone(),
                syncnets: inner.syncnets.clone(),
            }),
            MetaDataVersion::Fulu => MetaData::V3(GetMetaDataV3 {
                seq_number: inner.seq_number,
                attnets: inner.attnets.clone(),
                syncnets: inner.syncnets.clone(),
                custody_group_count: inner.custody_group_count,
            }),
        }
    }
}
