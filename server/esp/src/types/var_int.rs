use crate::*;

/// A signed 32-bit integer encoded in 1 to 5 bytes, 7 bits per byte, least significant group first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Amount of bytes `value` takes up when encoded.
    pub const fn encoded_len(value: i32) -> usize {
        let value = value as u32;
        match value {
            0..=0x7f => 1,
            0x80..=0x3fff => 2,
            0x4000..=0x1f_ffff => 3,
            0x20_0000..=0x0fff_ffff => 4,
            _ => 5,
        }
    }
}

impl From<i32> for VarInt {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

encode_impl!(VarInt, buf, self, buf.write_var_int(self.0));
decode_impl!(VarInt, buf, Ok(Self(buf.read_var_int()?)));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_len_matches_writer() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, i32::MAX, -1, i32::MIN] {
            let mut buf = ByteBuffer::new();
            buf.write_var_int(value);
            assert_eq!(buf.len(), VarInt::encoded_len(value), "length mismatch for {value}");
        }
    }
}
