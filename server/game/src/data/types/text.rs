/* Chat component encodings. Up to 1.20.2 a component is a JSON string, from 1.20.3 onward it's network NBT. */

use crate::data::*;

const TAG_STRING: u8 = 0x08;

/// Plain text component serialized as JSON, `{"text":"..."}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonText(pub String);

impl JsonText {
    pub fn to_json(&self) -> String {
        serde_json::json!({ "text": self.0 }).to_string()
    }
}

encode_impl!(JsonText, buf, self, buf.write_prefixed_str(&self.to_json()));

decode_impl!(JsonText, buf, {
    let json = buf.read_prefixed_str(MAX_STRING_LENGTH)?;
    let value: serde_json::Value = serde_json::from_str(&json).map_err(|_| DecodeError::InvalidStringValue)?;

    match value {
        serde_json::Value::String(text) => Ok(Self(text)),
        serde_json::Value::Object(mut map) => match map.remove("text") {
            Some(serde_json::Value::String(text)) => Ok(Self(text)),
            _ => Err(DecodeError::InvalidStringValue),
        },
        _ => Err(DecodeError::InvalidStringValue),
    }
});

/// Plain text component as a nameless NBT string tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NbtText(pub String);

impl Encodable for NbtText {
    fn encode(&self, buf: &mut ByteBuffer) {
        let encoded = to_modified_utf8(&self.0);
        // NBT strings are capped at u16::MAX bytes
        let len = encoded.len().min(usize::from(u16::MAX));

        buf.write_u8(TAG_STRING);
        buf.write_u16(len as u16);
        buf.write_bytes(&encoded[..len]);
    }
}

decode_impl!(NbtText, buf, {
    if buf.read_u8()? != TAG_STRING {
        return Err(DecodeError::InvalidEnumValue);
    }

    let len = buf.read_u16()?;
    let bytes = buf.read_bytes(usize::from(len))?;
    from_modified_utf8(&bytes).map(Self)
});

/// Java's modified UTF-8: NUL is written as two bytes and supplementary characters as surrogate pairs.
fn to_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());

    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push((0xc0 | ((unit >> 6) & 0x1f)) as u8);
                out.push((0x80 | (unit & 0x3f)) as u8);
            }
            _ => {
                out.push((0xe0 | ((unit >> 12) & 0x0f)) as u8);
                out.push((0x80 | ((unit >> 6) & 0x3f)) as u8);
                out.push((0x80 | (unit & 0x3f)) as u8);
            }
        }
    }

    out
}

fn from_modified_utf8(bytes: &[u8]) -> DecodeResult<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = u16::from(bytes[i]);
        if b & 0x80 == 0 {
            units.push(b);
            i += 1;
        } else if b & 0xe0 == 0xc0 && i + 1 < bytes.len() {
            units.push(((b & 0x1f) << 6) | (u16::from(bytes[i + 1]) & 0x3f));
            i += 2;
        } else if b & 0xf0 == 0xe0 && i + 2 < bytes.len() {
            units.push(((b & 0x0f) << 12) | ((u16::from(bytes[i + 1]) & 0x3f) << 6) | (u16::from(bytes[i + 2]) & 0x3f));
            i += 3;
        } else {
            return Err(DecodeError::InvalidStringValue);
        }
    }

    String::from_utf16(&units).map_err(|_| DecodeError::InvalidStringValue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_text_escapes() {
        assert_eq!(JsonText("Sir \"Lance\"".to_owned()).to_json(), r#"{"text":"Sir \"Lance\""}"#);
    }

    #[test]
    fn nbt_string_layout() {
        let mut buf = ByteBuffer::new();
        buf.write_value(&NbtText("Alice".to_owned()));
        assert_eq!(buf.as_bytes(), &[0x08, 0x00, 0x05, b'A', b'l', b'i', b'c', b'e']);
    }

    #[test]
    fn modified_utf8_special_chars() {
        assert_eq!(to_modified_utf8("\0"), vec![0xc0, 0x80]);
        // U+1F600 becomes a surrogate pair, 3 bytes each
        assert_eq!(to_modified_utf8("\u{1f600}").len(), 6);

        let text = "a\0ß\u{1f600}";
        assert_eq!(from_modified_utf8(&to_modified_utf8(text)).unwrap(), text);
    }
}
