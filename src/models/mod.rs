//! Domain types shared by the cache, selector, manifest writers and origin client.
//!
//! Everything here is plain data. Origin wire formats live in `origin::types` and
//! are converted into these types at the client boundary.

use serde::{Deserialize, Serialize};

pub mod quality;

pub use quality::{QualityTier, VideoCodec};

/// A complete video work with one or more playable parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// Stable public identifier (e.g. `BV1xx411c7mD`)
    pub id: String,
    pub name: String,
    pub owner_name: String,
    pub parts: Vec<Part>,
}

/// One playable unit of a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Opaque id used to request play-URLs for this part
    pub internal_id: u64,
    pub name: String,
    /// Duration in whole seconds
    pub duration: u64,
    pub dimension: Dimension,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Title {
    /// Look up a part by its 1-based position
    pub fn part(&self, number: usize) -> Option<&Part> {
        number.checked_sub(1).and_then(|index| self.parts.get(index))
    }
}

impl Part {
    /// Display name, falling back to `P{n}` for unnamed parts.
    ///
    /// `index` is the 0-based position of the part within its title.
    pub fn display_name(&self, index: usize) -> String {
        if self.name.is_empty() {
            format!("P{}", index + 1)
        } else {
            self.name.clone()
        }
    }
}

/// Inclusive byte range such as `0-927`, kept verbatim from upstream
pub type ByteRange = String;

/// One encoded option for a part's audio or video stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    /// Upstream codec id (see [`VideoCodec`]); audio renditions carry 0
    pub codec_id: u32,
    pub quality: QualityTier,
    pub mime_type: String,
    /// RFC 6381 codec string, e.g. `hev1.1.6.L150.90`
    pub codecs: String,
    /// Bits per second
    pub bandwidth: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<String>,
    pub initialization_range: Option<ByteRange>,
    pub index_range: Option<ByteRange>,
    /// Delivery mirrors in preference order
    pub mirrors: Vec<String>,
}

impl Rendition {
    /// The mirror the gateway actually hands out.
    ///
    /// Mirror order is decided once, when the origin response is decoded; later
    /// mirrors are never tried.
    pub fn primary_url(&self) -> Option<&str> {
        self.mirrors.first().map(String::as_str)
    }
}

/// Renditions available for one part at a fixed point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenditionSet {
    pub video: Vec<Rendition>,
    pub audio: Vec<Rendition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str) -> Part {
        Part {
            internal_id: 1,
            name: name.to_string(),
            duration: 10,
            dimension: Dimension::default(),
        }
    }

    #[test]
    fn test_unnamed_part_uses_positional_name() {
        assert_eq!(part("").display_name(2), "P3");
        assert_eq!(part("Intro").display_name(2), "Intro");
    }

    #[test]
    fn test_part_lookup_is_one_based() {
        let title = Title {
            id: "BV1".to_string(),
            name: "t".to_string(),
            owner_name: "o".to_string(),
            parts: vec![part("a"), part("b")],
        };
        assert!(title.part(0).is_none());
        assert_eq!(title.part(1).map(|p| p.name.as_str()), Some("a"));
        assert_eq!(title.part(2).map(|p| p.name.as_str()), Some("b"));
        assert!(title.part(3).is_none());
    }
}
