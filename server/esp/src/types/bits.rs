use crate::*;

/// Fixed size bit set of `BITS` bits, encoded as `ceil(BITS / 8)` bytes with bit 0 in the lowest bit of the first byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedBitSet<const BITS: usize> {
    bits: u64,
}

impl<const BITS: usize> FixedBitSet<BITS> {
    const BYTES: usize = BITS.div_ceil(8);

    pub const fn new() -> Self {
        assert!(BITS <= 64, "FixedBitSet supports at most 64 bits");
        Self { bits: 0 }
    }

    #[inline]
    pub fn set_bit(&mut self, pos: usize) {
        self.assign_bit(pos, true);
    }

    #[inline]
    pub fn clear_bit(&mut self, pos: usize) {
        self.assign_bit(pos, false);
    }

    #[inline]
    pub fn get_bit(&self, pos: usize) -> bool {
        pos < BITS && self.bits & (1 << pos) != 0
    }

    #[inline]
    pub fn assign_bit(&mut self, pos: usize, state: bool) {
        debug_assert!(pos < BITS, "attempting to assign bit number {pos} in a bit set with length of {BITS} bits");

        if state {
            self.bits |= 1 << pos;
        } else {
            self.bits &= !(1 << pos);
        }
    }

    /// Iterate over the positions of all set bits, in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..BITS).filter(|&pos| self.get_bit(pos))
    }
}

impl<const BITS: usize> Default for FixedBitSet<BITS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BITS: usize> Encodable for FixedBitSet<BITS> {
    fn encode(&self, buf: &mut ByteBuffer) {
        let bytes = self.bits.to_le_bytes();
        buf.write_bytes(&bytes[..Self::BYTES]);
    }
}

impl<const BITS: usize> Decodable for FixedBitSet<BITS> {
    fn decode_from_reader(buf: &mut ByteReader) -> DecodeResult<Self>
    where
        Self: Sized,
    {
        let data = buf.read_bytes(Self::BYTES)?;
        let mut bytes = [0u8; 8];
        bytes[..Self::BYTES].copy_from_slice(&data);

        let mut set = Self::new();
        set.bits = u64::from_le_bytes(bytes);
        if BITS < 64 {
            set.bits &= (1u64 << BITS) - 1;
        }

        Ok(set)
    }
}
