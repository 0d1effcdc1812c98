use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    BitVector,
    typenum::{U128, U512},
};
use tree_hash_derive::TreeHash;

use crate::{
    bls::BLSSignature,
    contribution::{Contribution, ContributionKey},
    errors::AggregationError,
};

pub const SYNC_COMMITTEE_SIZE: usize = 512;
pub const SYNC_COMMITTEE_SUBNET_COUNT: usize = 4;
pub const SYNC_SUBCOMMITTEE_SIZE: usize = SYNC_COMMITTEE_SIZE / SYNC_COMMITTEE_SUBNET_COUNT;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct SyncCommitteeContribution {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    pub beacon_block_root: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub subcommittee_index: u64,
    pub aggregation_bits: BitVector<U128>,
    pub signature: BLSSignature,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct ContributionAndProof {
    #[serde(with = "serde_utils::quoted_u64")]
    pub aggregator_index: u64,
    pub contribution: SyncCommitteeContribution,
    pub selection_proof: BLSSignature,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct SignedContributionAndProof {
    pub message: ContributionAndProof,
    pub signature: BLSSignature,
}

/// Sync committee participation carried by a block.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct SyncAggregate {
    pub sync_committee_bits: BitVector<U512>,
    pub sync_committee_signature: BLSSignature,
}

impl SyncAggregate {
    pub fn empty() -> Self {
        Self {
            sync_committee_bits: BitVector::default(),
            sync_committee_signature: BLSSignature::infinity(),
        }
    }

    pub fn participant_indices(&self) -> Vec<usize> {
        self.sync_committee_bits
            .iter()
            .enumerate()
            .filter_map(|(index, bit)| bit.then_some(index))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sync_committee_bits.iter().all(|bit| !bit)
    }
}

/// First aggregate bit owned by `subcommittee_index`.
fn subcommittee_offset(subcommittee_index: u64) -> Result<usize, AggregationError> {
    usize::try_from(subcommittee_index)
        .ok()
        .filter(|index| *index < SYNC_COMMITTEE_SUBNET_COUNT)
        .map(|index| index * SYNC_SUBCOMMITTEE_SIZE)
        .ok_or(AggregationError::InvalidSubKey(subcommittee_index))
}

impl Contribution for SignedContributionAndProof {
    type Signature = BLSSignature;
    type Aggregate = SyncAggregate;

    fn key(&self) -> ContributionKey {
        let contribution = &self.message.contribution;
        ContributionKey {
            slot: contribution.slot,
            root: contribution.beacon_block_root,
            sub_key: contribution.subcommittee_index,
        }
    }

    fn participant_count(&self) -> usize {
        self.message
            .contribution
            .aggregation_bits
            .iter()
            .filter(|bit| *bit)
            .count()
    }

    fn signature(&self) -> &BLSSignature {
        &self.message.contribution.signature
    }

    fn check_key(&self) -> Result<(), AggregationError> {
        subcommittee_offset(self.message.contribution.subcommittee_index).map(|_| ())
    }

    fn build_aggregate(
        selected: &[&Self],
        signature: BLSSignature,
    ) -> Result<SyncAggregate, AggregationError> {
        let mut sync_committee_bits = BitVector::<U512>::default();
        for proof in selected {
            let contribution = &proof.message.contribution;
            let offset = subcommittee_offset(contribution.subcommittee_index)?;

            for (index, bit) in contribution.aggregation_bits.iter().enumerate() {
                if bit {
                    sync_committee_bits
                        .set(offset + index, true)
                        .map_err(|_| AggregationError::BitIndexOutOfRange(offset + index))?;
                }
            }
        }

        Ok(SyncAggregate {
            sync_committee_bits,
            sync_committee_signature: signature,
        })
    }

    fn empty_aggregate() -> SyncAggregate {
        SyncAggregate::empty()
    }
}

#[cfg(test)]
mod tests {
    use ssz::{Decode, Encode};

    use super::*;

    fn proof(subcommittee_index: u64, bits: &[usize]) -> SignedContributionAndProof {
        let mut aggregation_bits = BitVector::<U128>::default();
        for bit in bits {
            aggregation_bits.set(*bit, true).expect("bit in range");
        }
        SignedContributionAndProof {
            message: ContributionAndProof {
                aggregator_index: 3,
                contribution: SyncCommitteeContribution {
                    slot: 9,
                    beacon_block_root: B256::from([4u8; 32]),
                    subcommittee_index,
                    aggregation_bits,
                    signature: BLSSignature::from_bytes(&[1u8; 96]),
                },
                selection_proof: BLSSignature::infinity(),
            },
            signature: BLSSignature::infinity(),
        }
    }

    #[test]
    fn test_key_and_participation() {
        let proof = proof(2, &[0, 5, 127]);
        let key = proof.key();
        assert_eq!(key.slot, 9);
        assert_eq!(key.root, B256::from([4u8; 32]));
        assert_eq!(key.sub_key, 2);
        assert_eq!(proof.participant_count(), 3);
    }

    #[test]
    fn test_aggregate_offsets_bits_by_subcommittee() {
        let first = proof(0, &[1, 2]);
        let third = proof(3, &[0, 127]);

        let aggregate = SignedContributionAndProof::build_aggregate(
            &[&first, &third],
            BLSSignature::infinity(),
        )
        .expect("indices in range");

        assert_eq!(aggregate.participant_indices(), vec![1, 2, 384, 511]);
    }

    #[test]
    fn test_aggregate_rejects_unknown_subcommittee() {
        let proof = proof(4, &[0]);
        assert!(matches!(proof.check_key(), Err(AggregationError::InvalidSubKey(4))));
        let result =
            SignedContributionAndProof::build_aggregate(&[&proof], BLSSignature::infinity());
        assert!(matches!(result, Err(AggregationError::InvalidSubKey(4))));
    }

    #[test]
    fn test_empty_aggregate() {
        let aggregate = SignedContributionAndProof::empty_aggregate();
        assert!(aggregate.is_empty());
        assert!(aggregate.sync_committee_signature.is_infinity());
    }

    #[test]
    fn test_signed_contribution_ssz_round_trip() {
        let proof = proof(1, &[10]);
        let decoded = SignedContributionAndProof::from_ssz_bytes(&proof.as_ssz_bytes())
            .expect("valid ssz");
        assert_eq!(decoded, proof);
    }
}
