use snap::raw::{Decoder, Encoder, decompress_len};
use ssz::{Decode, Encode};

use crate::error::GossipsubError;

/// Largest uncompressed gossip payload accepted or produced.
pub const MAX_PAYLOAD_SIZE: usize = 10485760;

pub fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, GossipsubError> {
    let ssz_bytes = value.as_ssz_bytes();
    if ssz_bytes.len() > MAX_PAYLOAD_SIZE {
        return Err(GossipsubError::PayloadTooLarge {
            size: ssz_bytes.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    let mut encoder = Encoder::new();
    Ok(encoder.compress_vec(&ssz_bytes)?)
}

/// Checks the advertised length before decompressing, so an oversized frame never gets
/// allocated.
pub fn decode<T: Decode>(data: &[u8]) -> Result<T, GossipsubError> {
    let size = decompress_len(data)?;
    if size > MAX_PAYLOAD_SIZE {
        return Err(GossipsubError::PayloadTooLarge {
            size,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    let mut decoder = Decoder::new();
    let ssz_bytes = decoder.decompress_vec(data)?;
    Ok(T::from_ssz_bytes(&ssz_bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let value: u64 = 42;
        let encoded = encode(&value).expect("encodes");
        assert_eq!(decode::<u64>(&encoded).expect("decodes"), 42);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode::<u64>(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
            Err(GossipsubError::Snappy(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_frame() {
        // Snappy raw frames start with the uncompressed length as a varint.
        let mut frame = Vec::new();
        let mut length = MAX_PAYLOAD_SIZE + 1;
        while length >= 0x80 {
            frame.push((length as u8) | 0x80);
            length >>= 7;
        }
        frame.push(length as u8);

        assert!(matches!(
            decode::<u64>(&frame),
            Err(GossipsubError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_ssz_length() {
        let encoded = encode(&7u32).expect("encodes");
        assert!(matches!(
            decode::<u64>(&encoded),
            Err(GossipsubError::Ssz(_))
        ));
    }
}
