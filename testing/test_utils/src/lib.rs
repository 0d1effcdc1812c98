//! Test doubles for the collaborators the networking crates treat as external: contribution
//! validation and signature aggregation.

use std::collections::HashMap;

use alloy_primitives::B256;
use async_trait::async_trait;
use parking_lot::Mutex;
use skein_aggregation_pool::{
    ContributionAddedSubscriber, ContributionValidator, SignatureAggregator, ValidationResult,
    bls::BLSSignature,
    sync_committee::{ContributionAndProof, SignedContributionAndProof, SyncCommitteeContribution},
};
use ssz_types::{BitVector, typenum::U128};

/// Accepts everything unless a result was scripted for the contribution's aggregator index.
#[derive(Debug, Default)]
pub struct ScriptedValidator {
    results: Mutex<HashMap<u64, ValidationResult>>,
    calls: Mutex<usize>,
}

impl ScriptedValidator {
    pub fn set_result(&self, aggregator_index: u64, result: ValidationResult) {
        self.results.lock().insert(aggregator_index, result);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ContributionValidator<SignedContributionAndProof> for ScriptedValidator {
    async fn validate(&self, contribution: &SignedContributionAndProof) -> ValidationResult {
        *self.calls.lock() += 1;
        self.results
            .lock()
            .get(&contribution.message.aggregator_index)
            .cloned()
            .unwrap_or(ValidationResult::Accept)
    }
}

/// XORs signature bytes together. Aggregating a single signature returns it unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct XorSignatureAggregator;

impl SignatureAggregator<BLSSignature> for XorSignatureAggregator {
    fn aggregate(&self, signatures: &[&BLSSignature]) -> anyhow::Result<BLSSignature> {
        let mut bytes = [0u8; 96];
        for signature in signatures {
            for (byte, other) in bytes.iter_mut().zip(signature.to_bytes()) {
                *byte ^= other;
            }
        }
        Ok(BLSSignature::from_bytes(&bytes))
    }
}

#[derive(Debug, Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<(SignedContributionAndProof, ValidationResult, bool)>>,
}

impl RecordingSubscriber {
    pub fn events(&self) -> Vec<(SignedContributionAndProof, ValidationResult, bool)> {
        self.events.lock().clone()
    }
}

impl ContributionAddedSubscriber<SignedContributionAndProof> for RecordingSubscriber {
    fn on_contribution_added(
        &self,
        contribution: &SignedContributionAndProof,
        result: &ValidationResult,
        is_remote: bool,
    ) {
        self.events
            .lock()
            .push((contribution.clone(), result.clone(), is_remote));
    }
}

/// Builds a contribution whose signature bytes are all `aggregator_index`, so aggregated
/// signatures can be predicted with [`XorSignatureAggregator`].
pub fn signed_contribution(
    slot: u64,
    beacon_block_root: B256,
    subcommittee_index: u64,
    aggregator_index: u64,
    bits: &[usize],
) -> SignedContributionAndProof {
    let mut aggregation_bits = BitVector::<U128>::default();
    for bit in bits {
        // Out of range bits are a bug in the calling test.
        let _ = aggregation_bits.set(*bit, true);
    }
    SignedContributionAndProof {
        message: ContributionAndProof {
            aggregator_index,
            contribution: SyncCommitteeContribution {
                slot,
                beacon_block_root,
                subcommittee_index,
                aggregation_bits,
                signature: BLSSignature::from_bytes(&[aggregator_index as u8; 96]),
            },
            selection_proof: BLSSignature::infinity(),
        },
        signature: BLSSignature::infinity(),
    }
}
