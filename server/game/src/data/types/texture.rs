use masquerade_shared::base64::{Engine, engine::general_purpose as b64e};
use serde::{Deserialize, Serialize};

use crate::data::*;

/// Signed skin texture as handed out by the texture service: a base64 JSON document and its signature.
/// Both are opaque to us and are sent to clients verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureBlob {
    pub value: String,
    #[serde(default)]
    pub signature: Option<String>,
}

impl TextureBlob {
    pub fn signed(value: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            signature: Some(signature.into()),
        }
    }

    pub fn unsigned(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            signature: None,
        }
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signature.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Decode the texture document and return the skin url, if there is one.
    pub fn skin_url(&self) -> Option<String> {
        let decoded = b64e::STANDARD.decode(self.value.trim()).ok()?;
        let document: serde_json::Value = serde_json::from_slice(&decoded).ok()?;

        document
            .get("textures")?
            .get("SKIN")?
            .get("url")?
            .as_str()
            .map(ToOwned::to_owned)
    }

    /// The `textures` game profile property carrying this blob.
    pub fn to_property(&self) -> ProfileProperty {
        ProfileProperty {
            name: TEXTURES_PROPERTY.to_owned(),
            value: self.value.clone(),
            signature: self.signature.clone(),
        }
    }
}

/// Single game profile property, the layout is the same in every supported revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

encode_impl!(ProfileProperty, buf, self, {
    buf.write_prefixed_str(&self.name);
    buf.write_prefixed_str(&self.value);
    buf.write_optional_value(self.signature.as_ref());
});

decode_impl!(ProfileProperty, buf, {
    Ok(Self {
        name: buf.read_prefixed_str(MAX_PROPERTY_NAME_LEN)?,
        value: buf.read_prefixed_str(MAX_STRING_LENGTH)?,
        signature: match buf.read_bool()? {
            true => Some(buf.read_prefixed_str(MAX_PROPERTY_SIGNATURE_LEN)?),
            false => None,
        },
    })
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skin_url_from_document() {
        let document = r#"{"timestamp":0,"profileId":"069a79f444e94726a5befca90e38aaf5","textures":{"SKIN":{"url":"http://textures.minecraft.net/texture/abc"}}}"#;
        let blob = TextureBlob::signed(b64e::STANDARD.encode(document), "c2ln");

        assert!(blob.is_signed());
        assert_eq!(blob.skin_url().as_deref(), Some("http://textures.minecraft.net/texture/abc"));
    }

    #[test]
    fn garbage_has_no_skin_url() {
        assert_eq!(TextureBlob::unsigned("not base64 at all!").skin_url(), None);
        assert!(!TextureBlob::unsigned("e30=").is_signed());
    }

    #[test]
    fn property_keeps_signature_verbatim() {
        let blob = TextureBlob::signed("dmFsdWU=", "c2lnbmF0dXJl+/==");
        let mut buf = ByteBuffer::new();
        buf.write_value(&blob.to_property());

        let mut reader = ByteReader::from_bytes(buf.as_bytes());
        let property = reader.read_value::<ProfileProperty>().unwrap();
        assert_eq!(property.name, TEXTURES_PROPERTY);
        assert_eq!(property.signature.as_deref(), Some("c2lnbmF0dXJl+/=="));
    }
}
