use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};

/// Liveness check carrying the sender's current metadata sequence number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[ssz(struct_behaviour = "transparent")]
pub struct Ping {
    #[serde(with = "serde_utils::quoted_u64")]
    pub data: u64,
}

impl Ping {
    pub fn new(data: u64) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use ssz::{Decode, Encode};

    use super::*;

    #[test]
    fn test_ping_encodes_as_bare_u64() {
        let ping = Ping::new(0x0102);
        let bytes = ping.as_ssz_bytes();
        assert_eq!(bytes, 0x0102u64.to_le_bytes().to_vec());
        assert_eq!(Ping::from_ssz_bytes(&bytes), Ok(ping));
    }
}
