use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered quality ranking of a video rendition; higher is better.
///
/// The numeric values are the origin platform's own `qn` codes, so tiers
/// decoded from a play-URL response compare directly against the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityTier(pub u32);

impl QualityTier {
    pub const P240: Self = Self(6);
    pub const P360: Self = Self(16);
    pub const P480: Self = Self(32);
    pub const P720: Self = Self(64);
    pub const P720_60: Self = Self(74);
    pub const P1080: Self = Self(80);
    pub const P1080_PLUS: Self = Self(112);
    pub const P1080_60: Self = Self(116);
    pub const UHD_4K: Self = Self(120);
    pub const HDR: Self = Self(125);
    pub const DOLBY: Self = Self(126);
    pub const UHD_8K: Self = Self(127);

    /// Parse a token from the configuration vocabulary
    /// (`8K, DOLBY, HDR, 4K, 1080P60, 1080P+, 1080P, 720P60, 720P, 480P, 360P, 240P`).
    pub fn from_token(token: &str) -> Option<Self> {
        let tier = match token.trim().to_ascii_uppercase().as_str() {
            "8K" => Self::UHD_8K,
            "DOLBY" => Self::DOLBY,
            "HDR" => Self::HDR,
            "4K" => Self::UHD_4K,
            "1080P60" => Self::P1080_60,
            "1080P+" | "1080PPLUS" => Self::P1080_PLUS,
            "1080P" => Self::P1080,
            "720P60" => Self::P720_60,
            "720P" => Self::P720,
            "480P" => Self::P480,
            "360P" => Self::P360,
            "240P" => Self::P240,
            _ => return None,
        };
        Some(tier)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Video codecs the selector knows how to rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    Avc,
    Hevc,
    Av1,
}

impl VideoCodec {
    /// Upstream codec id carried by each rendition
    pub fn id(self) -> u32 {
        match self {
            VideoCodec::Avc => 7,
            VideoCodec::Hevc => 12,
            VideoCodec::Av1 => 13,
        }
    }

    /// Fold a configuration token and its synonyms into a codec.
    ///
    /// Matching is case-insensitive and by substring, AV1 first, then HEVC, then AVC.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        if token.contains("av1") || token.contains("av01") {
            Some(VideoCodec::Av1)
        } else if token.contains("hevc") || token.contains("h265") || token.contains("h.265") {
            Some(VideoCodec::Hevc)
        } else if token.contains("avc") || token.contains("h264") || token.contains("h.264") {
            Some(VideoCodec::Avc)
        } else {
            None
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoCodec::Avc => "AVC",
            VideoCodec::Hevc => "HEVC",
            VideoCodec::Av1 => "AV1",
        };
        f.write_str(name)
    }
}
