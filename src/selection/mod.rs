//! Rendition selection
//!
//! Picks exactly one video rendition and at most one audio rendition for a part.
//! Codec priority dominates, the quality ceiling filters, and within a codec the
//! upstream listing order is taken as-is: the first rendition that passes the
//! ceiling wins, not the best one.

use std::collections::HashSet;
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::models::{QualityTier, Rendition, VideoCodec};

/// Codec order used when the configured priority yields nothing usable
pub const DEFAULT_CODEC_PRIORITY: [VideoCodec; 3] =
    [VideoCodec::Hevc, VideoCodec::Avc, VideoCodec::Av1];

/// Process-wide selection preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub codec_priority: Vec<VideoCodec>,
    pub max_quality: QualityTier,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            codec_priority: DEFAULT_CODEC_PRIORITY.to_vec(),
            max_quality: QualityTier::P1080,
        }
    }
}

impl SelectionPolicy {
    /// Build a policy from the raw configuration strings.
    ///
    /// Never fails: unknown codec tokens are skipped, an unknown quality
    /// becomes the highest tier, and both cases are logged.
    pub fn from_tokens(codec_priority: &str, max_quality: &str) -> Self {
        Self {
            codec_priority: parse_codec_priority(codec_priority),
            max_quality: parse_max_quality(max_quality),
        }
    }
}

/// Parse a comma separated codec list, de-duplicated in first-seen order
pub fn parse_codec_priority(raw: &str) -> Vec<VideoCodec> {
    let mut seen = HashSet::new();
    let mut codecs = Vec::with_capacity(DEFAULT_CODEC_PRIORITY.len());

    for token in raw.split(',') {
        match VideoCodec::from_token(token) {
            Some(codec) => {
                if seen.insert(codec) {
                    codecs.push(codec);
                }
            }
            None => warn!(codec = %token.trim(), "Unknown codec in priority"),
        }
    }

    if codecs.is_empty() {
        warn!("No valid codecs in priority, using default: \"HEVC, AVC, AV1\"");
        return DEFAULT_CODEC_PRIORITY.to_vec();
    }
    codecs
}

/// Parse the quality ceiling, falling back to 8K
pub fn parse_max_quality(raw: &str) -> QualityTier {
    QualityTier::from_token(raw).unwrap_or_else(|| {
        warn!(quality = %raw.trim(), "Unknown quality, using 8K");
        QualityTier::UHD_8K
    })
}

/// Outcome of a video selection
#[derive(Debug, Clone, Copy)]
pub struct VideoSelection<'a> {
    pub rendition: &'a Rendition,
    /// False when nothing satisfied the policy and the first rendition was used
    pub within_policy: bool,
}

/// Applies a [`SelectionPolicy`] to rendition lists
#[derive(Debug, Clone)]
pub struct StreamSelector {
    policy: SelectionPolicy,
}

impl StreamSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Choose the video rendition for a part.
    ///
    /// Fails only when `videos` is empty; `part` is used for the error message.
    pub fn select_video<'a>(
        &self,
        videos: &'a [Rendition],
        part: usize,
    ) -> AppResult<VideoSelection<'a>> {
        if let Some(rendition) = self.first_within_policy(videos) {
            return Ok(VideoSelection {
                rendition,
                within_policy: true,
            });
        }

        let rendition = videos.first().ok_or(AppError::NoVideoStream { part })?;
        warn!(
            max_quality = %self.policy.max_quality,
            available = %rendition.quality,
            "No video <= maxQuality found, using first available"
        );
        Ok(VideoSelection {
            rendition,
            within_policy: false,
        })
    }

    /// Choose the audio rendition for a part: always the first one listed
    pub fn select_audio<'a>(&self, audios: &'a [Rendition]) -> Option<&'a Rendition> {
        audios.first()
    }

    fn first_within_policy<'a>(&self, videos: &'a [Rendition]) -> Option<&'a Rendition> {
        self.policy.codec_priority.iter().find_map(|codec| {
            videos.iter().find(|v| {
                v.codec_id == codec.id() && v.quality <= self.policy.max_quality
            })
        })
    }
}
