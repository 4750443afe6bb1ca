use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One supported generation of the wire protocol, named after the server's internal package tag.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolRevision {
    #[serde(rename = "v1_20_R1")]
    V1_20_R1,
    #[serde(rename = "v1_20_R2")]
    V1_20_R2,
    #[serde(rename = "v1_20_R3")]
    V1_20_R3,
    #[serde(rename = "v1_20_R4")]
    V1_20_R4,
    #[serde(rename = "v1_21_R1")]
    V1_21_R1,
}

impl ProtocolRevision {
    pub const ALL: [Self; 5] = [Self::V1_20_R1, Self::V1_20_R2, Self::V1_20_R3, Self::V1_20_R4, Self::V1_21_R1];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::V1_20_R1 => "v1_20_R1",
            Self::V1_20_R2 => "v1_20_R2",
            Self::V1_20_R3 => "v1_20_R3",
            Self::V1_20_R4 => "v1_20_R4",
            Self::V1_21_R1 => "v1_21_R1",
        }
    }

    pub const fn protocol_version(self) -> i32 {
        match self {
            Self::V1_20_R1 => 763,
            Self::V1_20_R2 => 764,
            Self::V1_20_R3 => 765,
            Self::V1_20_R4 => 766,
            Self::V1_21_R1 => 767,
        }
    }

    /// Game versions that speak this revision.
    pub const fn game_versions(self) -> &'static [&'static str] {
        match self {
            Self::V1_20_R1 => &["1.20", "1.20.1"],
            Self::V1_20_R2 => &["1.20.2"],
            Self::V1_20_R3 => &["1.20.3", "1.20.4"],
            Self::V1_20_R4 => &["1.20.5", "1.20.6"],
            Self::V1_21_R1 => &["1.21", "1.21.1"],
        }
    }

    /// Whether clients on this revision get unsigned skin textures rejected, unless overridden in the config.
    pub const fn requires_signed_textures_by_default(self) -> bool {
        matches!(self, Self::V1_20_R4 | Self::V1_21_R1)
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rev| rev.tag().eq_ignore_ascii_case(tag))
    }

    /// Look up a game version like `1.20.4`. `1.20.0` is treated the same as `1.20`.
    pub fn from_game_version(version: &str) -> Option<Self> {
        let version = version.strip_suffix(".0").unwrap_or(version);
        Self::ALL.into_iter().find(|rev| rev.game_versions().contains(&version))
    }
}

impl Display for ProtocolRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(ProtocolRevision::from_tag("v1_20_r3"), Some(ProtocolRevision::V1_20_R3));
        assert_eq!(ProtocolRevision::from_game_version("1.20.0"), Some(ProtocolRevision::V1_20_R1));
        assert_eq!(ProtocolRevision::from_game_version("1.21.1"), Some(ProtocolRevision::V1_21_R1));
        assert_eq!(ProtocolRevision::from_game_version("1.19.4"), None);
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&ProtocolRevision::V1_20_R4).unwrap();
        assert_eq!(json, "\"v1_20_R4\"");
    }
}
