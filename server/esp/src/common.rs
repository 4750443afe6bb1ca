/* Encodable/Decodable implementations for common types */

use crate::*;
use uuid::Uuid;

macro_rules! impl_primitive {
    ($typ:ty,$read:ident,$write:ident) => {
        impl crate::Encodable for $typ {
            #[inline(always)]
            fn encode(&self, buf: &mut bytebuffer::ByteBuffer) {
                buf.$write(*self);
            }
        }

        impl crate::Decodable for $typ {
            #[inline(always)]
            fn decode_from_reader(buf: &mut bytebuffer::ByteReader) -> crate::DecodeResult<Self> {
                buf.$read().map_err(|e| e.into())
            }
        }
    };
}

impl_primitive!(u8, read_u8, write_u8);
impl_primitive!(u16, read_u16, write_u16);
impl_primitive!(u32, read_u32, write_u32);
impl_primitive!(u64, read_u64, write_u64);
impl_primitive!(i8, read_i8, write_i8);
impl_primitive!(i16, read_i16, write_i16);
impl_primitive!(i32, read_i32, write_i32);
impl_primitive!(i64, read_i64, write_i64);
impl_primitive!(f32, read_f32, write_f32);
impl_primitive!(f64, read_f64, write_f64);

encode_impl!(bool, buf, self, buf.write_bool(*self));
decode_impl!(bool, buf, buf.read_bool());

encode_impl!(String, buf, self, buf.write_prefixed_str(self));
decode_impl!(String, buf, buf.read_prefixed_str(MAX_STRING_LENGTH));

encode_impl!(str, buf, self, buf.write_prefixed_str(self));

/* Option<T> */

impl<T> Encodable for Option<T>
where
    T: Encodable,
{
    #[inline]
    fn encode(&self, buf: &mut ByteBuffer) {
        buf.write_optional_value(self.as_ref());
    }
}

impl<T> Decodable for Option<T>
where
    T: Decodable,
{
    #[inline]
    fn decode_from_reader(buf: &mut ByteReader) -> DecodeResult<Self>
    where
        Self: Sized,
    {
        buf.read_optional_value()
    }
}

/* Vec<T> */

impl<T> Encodable for Vec<T>
where
    T: Encodable,
{
    #[inline]
    fn encode(&self, buf: &mut ByteBuffer) {
        buf.write_value_vec(self);
    }
}

impl<T> Decodable for Vec<T>
where
    T: Decodable,
{
    #[inline]
    fn decode_from_reader(buf: &mut ByteReader) -> DecodeResult<Self>
    where
        Self: Sized,
    {
        buf.read_value_vec()
    }
}

/* Uuid, two big-endian u64s */

impl Encodable for Uuid {
    #[inline]
    fn encode(&self, buf: &mut ByteBuffer) {
        let (high, low) = self.as_u64_pair();
        buf.write_u64(high);
        buf.write_u64(low);
    }
}

impl Decodable for Uuid {
    #[inline]
    fn decode_from_reader(buf: &mut ByteReader) -> DecodeResult<Self>
    where
        Self: Sized,
    {
        let high = buf.read_u64()?;
        let low = buf.read_u64()?;
        Ok(Uuid::from_u64_pair(high, low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_is_big_endian() {
        let id = Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap();
        let mut buf = ByteBuffer::new();
        buf.write_value(&id);

        assert_eq!(buf.as_bytes().len(), 16);
        assert_eq!(buf.as_bytes()[0], 0x06);
        assert_eq!(buf.as_bytes()[15], 0xf5);

        let mut reader = ByteReader::from_bytes(buf.as_bytes());
        assert_eq!(reader.read_value::<Uuid>().unwrap(), id);
    }
}
