use alloy_primitives::hex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, typenum};
use tree_hash_derive::TreeHash;

/// Compressed G2 point. Verification and aggregation live outside this crate.
#[derive(Debug, PartialEq, Eq, Clone, Encode, Decode, TreeHash)]
pub struct BLSSignature {
    pub inner: FixedVector<u8, typenum::U96>,
}

impl BLSSignature {
    /// The point at infinity, i.e. the aggregate of no signatures.
    pub fn infinity() -> Self {
        let mut bytes = vec![0u8; 96];
        bytes[0] = 0xc0;
        Self {
            inner: FixedVector::new(bytes).expect("signature is 96 bytes"),
        }
    }

    pub fn from_bytes(bytes: &[u8; 96]) -> Self {
        Self {
            inner: FixedVector::new(bytes.to_vec()).expect("signature is 96 bytes"),
        }
    }

    pub fn to_bytes(&self) -> &[u8] {
        self.inner.iter().as_slice()
    }

    pub fn is_infinity(&self) -> bool {
        *self == Self::infinity()
    }
}

impl Default for BLSSignature {
    fn default() -> Self {
        Self::infinity()
    }
}

impl Serialize for BLSSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode_prefixed(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for BLSSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let result: String = Deserialize::deserialize(deserializer)?;
        let bytes = hex::decode(&result).map_err(serde::de::Error::custom)?;
        let bytes: [u8; 96] = bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| serde::de::Error::invalid_length(bytes.len(), &"96 bytes"))?;
        Ok(Self::from_bytes(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infinity_encoding() {
        let signature = BLSSignature::infinity();
        assert_eq!(signature.to_bytes()[0], 0xc0);
        assert!(signature.to_bytes()[1..].iter().all(|byte| *byte == 0));
        assert!(signature.is_infinity());
    }

    #[test]
    fn test_serde_hex_round_trip() {
        let signature = BLSSignature::from_bytes(&[7u8; 96]);
        let encoded = serde_yaml::to_string(&signature).expect("signature should serialize");
        assert!(encoded.contains(&hex::encode_prefixed([7u8; 96])));

        let decoded: BLSSignature = serde_yaml::from_str(&format!("\"{}\"", hex::encode([7u8; 96])))
            .expect("signature should deserialize");
        assert_eq!(decoded, signature);
    }

    #[test]
    fn test_deserialize_rejects_wrong_length() {
        let result: Result<BLSSignature, _> = serde_yaml::from_str("\"0x0102\"");
        assert!(result.is_err());
    }
}
