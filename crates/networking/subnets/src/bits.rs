use ssz_types::{BitVector, typenum::{U128, Unsigned}};

/// Subnet membership of one peer for one [`skein_network_spec::subnet::SubnetKind`].
///
/// Backed by a bitvector of the largest supported subnet space; only the first `len` bits are
/// addressable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetBits {
    bits: BitVector<U128>,
    len: usize,
}

impl SubnetBits {
    pub fn new(len: usize) -> Self {
        Self {
            bits: BitVector::new(),
            len: len.min(U128::to_usize()),
        }
    }

    /// Bits outside `len` are dropped.
    pub fn from_indices(len: usize, subnet_ids: impl IntoIterator<Item = u64>) -> Self {
        let mut bits = Self::new(len);
        for subnet_id in subnet_ids {
            bits.set(subnet_id);
        }
        bits
    }

    /// Converts an advertised bitfield such as the `attnets` of a metadata response.
    pub fn from_bitvector<N: Unsigned + Clone>(bitvector: &BitVector<N>) -> Self {
        Self::from_indices(
            bitvector.len(),
            bitvector
                .iter()
                .enumerate()
                .filter_map(|(index, bit)| bit.then_some(index as u64)),
        )
    }

    /// Returns false when `subnet_id` is outside the space.
    pub fn set(&mut self, subnet_id: u64) -> bool {
        let Ok(index) = usize::try_from(subnet_id) else {
            return false;
        };
        index < self.len && self.bits.set(index, true).is_ok()
    }

    pub fn get(&self, subnet_id: u64) -> bool {
        usize::try_from(subnet_id)
            .ok()
            .filter(|index| *index < self.len)
            .and_then(|index| self.bits.get(index).ok())
            .unwrap_or(false)
    }

    pub fn iter_set(&self) -> impl Iterator<Item = u64> + '_ {
        self.bits
            .iter()
            .take(self.len)
            .enumerate()
            .filter_map(|(index, bit)| bit.then_some(index as u64))
    }

    pub fn count(&self) -> usize {
        self.iter_set().count()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
