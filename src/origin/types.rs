//! Wire formats of the origin web API and their conversion into domain models.
//!
//! The API repeats many fields in both snake_case and camelCase; only the
//! snake_case spelling is read. Unknown fields are ignored.

use serde::Deserialize;

use crate::errors::{OriginError, OriginResult};
use crate::models::{Dimension, Part, QualityTier, Rendition, RenditionSet, Title};

/// `{code, message, data}` wrapper around every API payload
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self, endpoint: &str) -> OriginResult<T> {
        if self.code != 0 {
            return Err(OriginError::Api {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or_else(|| OriginError::EmptyData {
            endpoint: endpoint.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewData {
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub owner: OwnerData,
    #[serde(default)]
    pub pages: Vec<PageData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnerData {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PageData {
    pub cid: u64,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub dimension: DimensionData,
}

#[derive(Debug, Default, Deserialize)]
pub struct DimensionData {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// 1 when the stored frame is rotated a quarter turn
    #[serde(default)]
    pub rotate: u8,
}

#[derive(Debug, Deserialize)]
pub struct PlayUrlData {
    pub dash: Option<DashData>,
}

#[derive(Debug, Deserialize)]
pub struct DashData {
    #[serde(default)]
    pub video: Vec<DashStream>,
    /// `null` for silent videos
    #[serde(default)]
    pub audio: Option<Vec<DashStream>>,
}

#[derive(Debug, Deserialize)]
pub struct DashStream {
    /// Quality tier for video, audio quality code for audio
    pub id: u32,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
    #[serde(default)]
    pub bandwidth: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub codecs: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub frame_rate: Option<String>,
    #[serde(default)]
    pub segment_base: Option<SegmentBaseData>,
    #[serde(default)]
    pub codecid: u32,
}

#[derive(Debug, Deserialize)]
pub struct SegmentBaseData {
    #[serde(default)]
    pub initialization: String,
    #[serde(default)]
    pub index_range: String,
}

impl ViewData {
    /// `requested_id` is used when the payload carries no bvid
    pub fn into_title(self, requested_id: &str) -> Title {
        let id = if self.bvid.is_empty() {
            requested_id.to_string()
        } else {
            self.bvid
        };

        Title {
            id,
            name: self.title,
            owner_name: self.owner.name,
            parts: self.pages.into_iter().map(PageData::into_part).collect(),
        }
    }
}

impl PageData {
    fn into_part(self) -> Part {
        Part {
            internal_id: self.cid,
            name: self.part,
            duration: self.duration,
            dimension: self.dimension.into_dimension(),
        }
    }
}

impl DimensionData {
    fn into_dimension(self) -> Dimension {
        if self.rotate == 1 {
            Dimension {
                width: self.height,
                height: self.width,
            }
        } else {
            Dimension {
                width: self.width,
                height: self.height,
            }
        }
    }
}

impl PlayUrlData {
    pub fn into_rendition_set(self) -> OriginResult<RenditionSet> {
        let dash = self.dash.ok_or(OriginError::NoDash)?;
        Ok(dash.into_rendition_set())
    }
}

impl DashData {
    fn into_rendition_set(self) -> RenditionSet {
        RenditionSet {
            video: convert_streams(self.video),
            audio: convert_streams(self.audio.unwrap_or_default()),
        }
    }
}

// Streams without any delivery URL are dropped here so every Rendition has a primary mirror
fn convert_streams(streams: Vec<DashStream>) -> Vec<Rendition> {
    streams
        .into_iter()
        .map(DashStream::into_rendition)
        .filter(|r| !r.mirrors.is_empty())
        .collect()
}

impl DashStream {
    /// Backup URLs come first; the base URL is the one most often routed to
    /// peer-assisted CDN nodes.
    fn into_rendition(self) -> Rendition {
        let mut mirrors: Vec<String> = self
            .backup_url
            .unwrap_or_default()
            .into_iter()
            .filter(|u| !u.is_empty())
            .collect();
        if !self.base_url.is_empty() && !mirrors.contains(&self.base_url) {
            mirrors.push(self.base_url);
        }

        let (initialization_range, index_range) = match self.segment_base {
            Some(segment) => (
                Some(segment.initialization).filter(|r| !r.is_empty()),
                Some(segment.index_range).filter(|r| !r.is_empty()),
            ),
            None => (None, None),
        };

        Rendition {
            codec_id: self.codecid,
            quality: QualityTier(self.id),
            mime_type: self.mime_type,
            codecs: self.codecs,
            bandwidth: self.bandwidth,
            width: self.width.filter(|w| *w > 0),
            height: self.height.filter(|h| *h > 0),
            frame_rate: self.frame_rate.filter(|f| !f.is_empty()),
            initialization_range,
            index_range,
            mirrors,
        }
    }
}
