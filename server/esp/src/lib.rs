//! esp - Binary serialization protocol library.
//! Provides traits `Encodable` and `Decodable` and implementations of those traits for the core types
//! used by the game's wire protocol (big-endian primitives, VarInts, length-prefixed strings, UUIDs).
//!
//! Also re-exports `ByteBuffer` and `ByteReader` (extended w/ traits `ByteBufferExtRead` and `ByteBufferExtWrite`).

#![allow(
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::wildcard_imports,
    clippy::module_name_repetitions
)]
use std::fmt::Display;
mod common;
pub mod types;

pub use bytebuffer::{ByteBuffer, ByteReader, Endian};
pub use types::*;

/// Maximum amount of characters in a protocol string when the packet does not say otherwise.
pub const MAX_STRING_LENGTH: usize = 32767;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    NotEnoughData,
    VarIntTooLong,
    InvalidEnumValue,
    InvalidStringValue,
    StringTooLong(usize),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnoughData => f.write_str("could not read enough bytes from the ByteBuffer"),
            Self::VarIntTooLong => f.write_str("VarInt is longer than 5 bytes"),
            Self::InvalidEnumValue => f.write_str("invalid enum value was passed"),
            Self::InvalidStringValue => f.write_str("invalid string was passed, likely not properly UTF-8 encoded"),
            Self::StringTooLong(len) => write!(f, "string exceeds the maximum permitted length ({len} bytes)"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<std::io::Error> for DecodeError {
    fn from(_: std::io::Error) -> Self {
        Self::NotEnoughData
    }
}

pub type DecodeResult<T> = core::result::Result<T, DecodeError>;

pub trait Encodable {
    fn encode(&self, buf: &mut ByteBuffer);
}

pub trait Decodable {
    #[inline]
    fn decode(buf: &mut ByteBuffer) -> DecodeResult<Self>
    where
        Self: Sized,
    {
        let rpos = buf.get_rpos();
        let data = &buf.as_bytes()[rpos..];
        let mut reader = ByteReader::from_bytes(data);
        let value = Self::decode_from_reader(&mut reader)?;
        buf.set_rpos(rpos + reader.get_rpos());
        Ok(value)
    }

    fn decode_from_reader(buf: &mut ByteReader) -> DecodeResult<Self>
    where
        Self: Sized;
}

/// Simple and compact way of implementing `Decodable::decode_from_reader`.
///
/// Example usage:
/// ```rust
/// use esp::*;
/// struct Type {
///     some_val: String,
/// }
///
/// decode_impl!(Type, buf, {
///     Ok(Self { some_val: buf.read()? })
/// });
/// ```
#[macro_export]
macro_rules! decode_impl {
    ($typ:ty, $buf:ident, $decode:expr) => {
        impl $crate::Decodable for $typ {
            #[inline]
            fn decode_from_reader($buf: &mut $crate::ByteReader) -> $crate::DecodeResult<Self> {
                $decode
            }
        }
    };
}

/// Simple and compact way of implementing `Encodable::encode`.
///
/// Example usage:
/// ```rust
/// use esp::*;
/// struct Type {
///     some_val: String,
/// }
///
/// encode_impl!(Type, buf, self, {
///     buf.write(&self.some_val);
/// });
/// ```
#[macro_export]
macro_rules! encode_impl {
    ($typ:ty, $buf:ident, $self:ident, $encode:expr) => {
        impl $crate::Encodable for $typ {
            #[inline]
            fn encode(&$self, $buf: &mut $crate::ByteBuffer) {
                $encode
            }
        }
    };
}

/* ByteBuffer extensions */

pub trait ByteBufferExt {
    fn with_capacity(capacity: usize) -> Self;
}

pub trait ByteBufferExtWrite {
    /// alias to `write_value`
    fn write<T: Encodable + ?Sized>(&mut self, val: &T) {
        self.write_value(val);
    }

    fn write_bool(&mut self, val: bool);
    /// write an `i32` in the variable-length (LEB128-like) format, 1 to 5 bytes
    fn write_var_int(&mut self, val: i32);
    /// write a UTF-8 string prefixed with its byte length as a VarInt
    fn write_prefixed_str(&mut self, val: &str);
    /// write a `&[u8]`, prefixed with its length as a VarInt
    fn write_prefixed_bytes(&mut self, val: &[u8]);

    fn write_value<T: Encodable + ?Sized>(&mut self, val: &T);
    /// write a boolean presence flag followed by the value if present
    fn write_optional_value<T: Encodable>(&mut self, val: Option<&T>);
    /// write a slice of values, prefixed with the amount of values as a VarInt
    fn write_value_vec<T: Encodable>(&mut self, val: &[T]);
}

pub trait ByteBufferExtRead {
    /// alias to `read_value`
    fn read<T: Decodable>(&mut self) -> DecodeResult<T> {
        self.read_value()
    }

    /// skip the next `n` bytes
    fn skip(&mut self, n: usize);

    fn read_bool(&mut self) -> DecodeResult<bool>;
    fn read_var_int(&mut self) -> DecodeResult<i32>;
    /// read a VarInt-prefixed UTF-8 string that must not be longer than `max_len` bytes
    fn read_prefixed_str(&mut self, max_len: usize) -> DecodeResult<String>;
    fn read_prefixed_bytes(&mut self) -> DecodeResult<Vec<u8>>;
    /// read the remaining data into a Vec
    fn read_remaining_bytes(&mut self) -> DecodeResult<Vec<u8>>;

    fn read_value<T: Decodable>(&mut self) -> DecodeResult<T>;
    fn read_optional_value<T: Decodable>(&mut self) -> DecodeResult<Option<T>>;
    /// read a VarInt-prefixed `Vec<T>`
    fn read_value_vec<T: Decodable>(&mut self) -> DecodeResult<Vec<T>>;
}

/* ByteBuffer extension implementation for ByteBuffer and ByteReader */

impl ByteBufferExt for ByteBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }
}

impl ByteBufferExtWrite for ByteBuffer {
    #[inline]
    fn write_bool(&mut self, val: bool) {
        self.write_u8(u8::from(val));
    }

    #[inline]
    fn write_var_int(&mut self, val: i32) {
        let mut value = val as u32;
        loop {
            if value & !SEGMENT_BITS == 0 {
                self.write_u8(value as u8);
                return;
            }

            self.write_u8(((value & SEGMENT_BITS) | CONTINUE_BIT) as u8);
            value >>= 7;
        }
    }

    #[inline]
    fn write_prefixed_str(&mut self, val: &str) {
        self.write_prefixed_bytes(val.as_bytes());
    }

    #[inline]
    fn write_prefixed_bytes(&mut self, val: &[u8]) {
        self.write_var_int(val.len() as i32);
        self.write_bytes(val);
    }

    #[inline]
    fn write_value<T: Encodable + ?Sized>(&mut self, val: &T) {
        val.encode(self);
    }

    #[inline]
    fn write_optional_value<T: Encodable>(&mut self, val: Option<&T>) {
        self.write_bool(val.is_some());
        if let Some(val) = val {
            self.write_value(val);
        }
    }

    #[inline]
    fn write_value_vec<T: Encodable>(&mut self, val: &[T]) {
        self.write_var_int(val.len() as i32);
        for elem in val {
            self.write_value(elem);
        }
    }
}

const SEGMENT_BITS: u32 = 0x7f;
const CONTINUE_BIT: u32 = 0x80;

macro_rules! impl_extread {
    () => {
        #[inline]
        fn skip(&mut self, n: usize) {
            self.set_rpos(self.get_rpos() + n);
        }

        #[inline]
        fn read_bool(&mut self) -> DecodeResult<bool> {
            Ok(self.read_u8()? != 0u8)
        }

        #[inline]
        fn read_var_int(&mut self) -> DecodeResult<i32> {
            let mut value = 0u32;
            for position in 0..5 {
                let byte = u32::from(self.read_u8()?);
                value |= (byte & SEGMENT_BITS) << (position * 7);

                if byte & CONTINUE_BIT == 0 {
                    return Ok(value as i32);
                }
            }

            Err(DecodeError::VarIntTooLong)
        }

        #[inline]
        fn read_prefixed_str(&mut self, max_len: usize) -> DecodeResult<String> {
            let length = self.read_var_int()?;
            let length = usize::try_from(length).map_err(|_| DecodeError::InvalidStringValue)?;
            if length > max_len {
                return Err(DecodeError::StringTooLong(length));
            }

            String::from_utf8(self.read_bytes(length)?).map_err(|_| DecodeError::InvalidStringValue)
        }

        #[inline]
        fn read_prefixed_bytes(&mut self) -> DecodeResult<Vec<u8>> {
            let length = usize::try_from(self.read_var_int()?).map_err(|_| DecodeError::NotEnoughData)?;
            Ok(self.read_bytes(length)?)
        }

        #[inline]
        fn read_remaining_bytes(&mut self) -> DecodeResult<Vec<u8>> {
            let remainder = self.len().saturating_sub(self.get_rpos());
            Ok(self.read_bytes(remainder)?)
        }

        #[inline]
        fn read_value<T: Decodable>(&mut self) -> DecodeResult<T> {
            T::decode_from_reader(self)
        }

        #[inline]
        fn read_optional_value<T: Decodable>(&mut self) -> DecodeResult<Option<T>> {
            Ok(match self.read_bool()? {
                false => None,
                true => Some(self.read_value::<T>()?),
            })
        }

        #[inline]
        fn read_value_vec<T: Decodable>(&mut self) -> DecodeResult<Vec<T>> {
            let length = usize::try_from(self.read_var_int()?).map_err(|_| DecodeError::NotEnoughData)?;
            let mut out = Vec::with_capacity(length.min(64));
            for _ in 0..length {
                out.push(self.read_value()?);
            }

            Ok(out)
        }
    };
}

impl<'a> ByteBufferExtRead for ByteReader<'a> {
    impl_extread!();
}

impl ByteBufferExtRead for ByteBuffer {
    fn skip(&mut self, n: usize) {
        self.set_rpos(self.get_rpos() + n);
    }

    fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_u8()? != 0u8)
    }

    fn read_var_int(&mut self) -> DecodeResult<i32> {
        self.read_value::<VarInt>().map(|v| v.0)
    }

    fn read_prefixed_str(&mut self, max_len: usize) -> DecodeResult<String> {
        let value = String::decode(self)?;
        if value.len() > max_len {
            return Err(DecodeError::StringTooLong(value.len()));
        }

        Ok(value)
    }

    fn read_prefixed_bytes(&mut self) -> DecodeResult<Vec<u8>> {
        let length = usize::try_from(self.read_var_int()?).map_err(|_| DecodeError::NotEnoughData)?;
        Ok(self.read_bytes(length)?)
    }

    fn read_remaining_bytes(&mut self) -> DecodeResult<Vec<u8>> {
        let remainder = self.len().saturating_sub(self.get_rpos());
        Ok(self.read_bytes(remainder)?)
    }

    fn read_value<T: Decodable>(&mut self) -> DecodeResult<T> {
        T::decode(self)
    }

    fn read_optional_value<T: Decodable>(&mut self) -> DecodeResult<Option<T>> {
        Ok(match self.read_bool()? {
            false => None,
            true => Some(self.read_value::<T>()?),
        })
    }

    fn read_value_vec<T: Decodable>(&mut self) -> DecodeResult<Vec<T>> {
        Vec::<T>::decode(self)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn var_int_known_encodings() {
        let cases: [(i32, &[u8]); 6] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (300, &[0xac, 0x02]),
            (2_147_483_647, &[0xff, 0xff, 0xff, 0xff, 0x07]),
            (-1, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
        ];

        for (value, expected) in cases {
            let mut buf = ByteBuffer::new();
            buf.write_var_int(value);
            assert_eq!(buf.as_bytes(), expected, "wrong encoding for {value}");

            let mut reader = ByteReader::from_bytes(expected);
            assert_eq!(reader.read_var_int().unwrap(), value);
        }
    }

    #[test]
    fn var_int_too_long() {
        let mut reader = ByteReader::from_bytes(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert_eq!(reader.read_var_int(), Err(DecodeError::VarIntTooLong));
    }

    #[test]
    fn prefixed_string() {
        let mut buf = ByteBuffer::new();
        buf.write_prefixed_str("hello there");

        assert_eq!(buf.as_bytes()[0], 11);

        let mut reader = ByteReader::from_bytes(buf.as_bytes());
        assert_eq!(reader.read_prefixed_str(16).unwrap(), "hello there");

        let mut reader = ByteReader::from_bytes(buf.as_bytes());
        assert_eq!(reader.read_prefixed_str(4), Err(DecodeError::StringTooLong(11)));
    }

    #[test]
    fn optional_and_vec() {
        let mut buf = ByteBuffer::new();
        buf.write_optional_value::<String>(None);
        buf.write_optional_value(Some(&"sig".to_owned()));
        buf.write_value_vec(&[VarInt(1), VarInt(300)]);

        let mut reader = ByteReader::from_bytes(buf.as_bytes());
        assert_eq!(reader.read_optional_value::<String>().unwrap(), None);
        assert_eq!(reader.read_optional_value::<String>().unwrap().as_deref(), Some("sig"));
        assert_eq!(reader.read_value_vec::<VarInt>().unwrap(), vec![VarInt(1), VarInt(300)]);
    }

    #[test]
    fn decode_advances_buffer() {
        let mut buf = ByteBuffer::new();
        buf.write_var_int(300);
        buf.write_prefixed_str("abc");

        buf.set_rpos(0);
        assert_eq!(buf.read_var_int().unwrap(), 300);
        assert_eq!(buf.read_prefixed_str(3).unwrap(), "abc");
    }
}
