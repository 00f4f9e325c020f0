//! Origin platform collaborators
//!
//! The playback service only sees the two traits below. [`OriginClient`] is the
//! reqwest-backed implementation against the platform's public web API; tests
//! substitute in-memory fakes.

use async_trait::async_trait;

use crate::errors::OriginResult;
use crate::models::{RenditionSet, Title};

pub mod client;
pub mod types;

pub use client::{build_http_client, upstream_headers, OriginClient, TitleRef};

/// Bit flags selecting which stream formats the play-URL endpoint returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayUrlFlags(pub u32);

impl PlayUrlFlags {
    pub const DASH: Self = Self(16);
    pub const HDR: Self = Self(64);
    pub const UHD_4K: Self = Self(128);
    pub const DOLBY_AUDIO: Self = Self(256);
    pub const DOLBY_VISION: Self = Self(512);
    pub const UHD_8K: Self = Self(1024);
    pub const AV1: Self = Self(2048);
    /// Every DASH variant the platform knows about
    pub const DASH_ALL: Self = Self(
        Self::DASH.0
            | Self::HDR.0
            | Self::UHD_4K.0
            | Self::DOLBY_AUDIO.0
            | Self::DOLBY_VISION.0
            | Self::UHD_8K.0
            | Self::AV1.0,
    );

    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Fetches title metadata (name, owner, parts)
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_title(&self, id: &str) -> OriginResult<Title>;
}

/// Fetches the renditions currently offered for one part
#[async_trait]
pub trait PlayUrlSource: Send + Sync {
    /// Fails with [`OriginError::NoDash`](crate::errors::OriginError::NoDash)
    /// when the response has no DASH section.
    async fn fetch_renditions(
        &self,
        id: &str,
        part_internal_id: u64,
        flags: PlayUrlFlags,
    ) -> OriginResult<RenditionSet>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_all_value() {
        assert_eq!(PlayUrlFlags::DASH_ALL.bits(), 4048);
    }
}
