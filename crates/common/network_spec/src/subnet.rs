use std::fmt;

use serde::{Deserialize, Serialize};

/// The gossip subnet families a peer can subscribe to. Each family has its own id space whose
/// size comes from the active [`crate::networks::NetworkSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetKind {
    Attestation,
    SyncCommittee,
    DataColumn,
}

impl SubnetKind {
    pub const ALL: [SubnetKind; 3] = [
        SubnetKind::Attestation,
        SubnetKind::SyncCommittee,
        SubnetKind::DataColumn,
    ];

    /// Prefix used for metric labels, e.g. `attestation_3`.
    pub fn label_prefix(&self) -> &'static str {
        match self {
            SubnetKind::Attestation => "attestation",
            SubnetKind::SyncCommittee => "sync_committee",
            SubnetKind::DataColumn => "data_column",
        }
    }
}

impl fmt::Display for SubnetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label_prefix())
    }
}
