//! DASH MPD writer
//!
//! One `Period` per part; each period carries a video adaptation set with id
//! `2 * period` and, when audio exists, an audio adaptation set with id
//! `2 * period + 1`. Ids are unique across periods without a counter.

use std::fmt::Write;

use super::{iso8601_duration, relay_url, xml_escape};
use crate::errors::{AppError, AppResult};
use crate::models::{Dimension, Rendition};

const DEFAULT_FRAME_RATE: &str = "30";
const UNKNOWN_RANGE: &str = "0-0";

/// Everything needed to write one MPD document
#[derive(Debug, Clone, PartialEq)]
pub struct MpdView {
    pub title: String,
    pub owner_name: String,
    pub title_id: String,
    pub periods: Vec<PeriodView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodView {
    /// Seconds
    pub duration: u64,
    pub video: VideoTrackView,
    pub audio: Option<AudioTrackView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoTrackView {
    /// Upstream media URL; written through the relay path
    pub url: String,
    pub mime_type: String,
    pub codecs: String,
    pub bandwidth: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: String,
    pub initialization_range: String,
    pub index_range: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrackView {
    pub url: String,
    pub mime_type: String,
    pub codecs: String,
    pub bandwidth: u64,
    pub initialization_range: String,
    pub index_range: String,
}

impl VideoTrackView {
    /// Build from the selected rendition; dimensions fall back to the part's.
    ///
    /// Returns `None` when the rendition has no delivery URL.
    pub fn from_rendition(rendition: &Rendition, part_dimension: Dimension) -> Option<Self> {
        Some(Self {
            url: rendition.primary_url()?.to_string(),
            mime_type: non_empty_or(&rendition.mime_type, "video/mp4"),
            codecs: rendition.codecs.clone(),
            bandwidth: rendition.bandwidth,
            width: rendition.width.unwrap_or(part_dimension.width),
            height: rendition.height.unwrap_or(part_dimension.height),
            frame_rate: frame_rate_attr(rendition.frame_rate.as_deref()),
            initialization_range: range_or_unknown(&rendition.initialization_range),
            index_range: range_or_unknown(&rendition.index_range),
        })
    }
}

impl AudioTrackView {
    pub fn from_rendition(rendition: &Rendition) -> Option<Self> {
        Some(Self {
            url: rendition.primary_url()?.to_string(),
            mime_type: non_empty_or(&rendition.mime_type, "audio/mp4"),
            codecs: rendition.codecs.clone(),
            bandwidth: rendition.bandwidth,
            initialization_range: range_or_unknown(&rendition.initialization_range),
            index_range: range_or_unknown(&rendition.index_range),
        })
    }
}

impl MpdView {
    pub fn total_duration(&self) -> u64 {
        self.periods.iter().map(|p| p.duration).sum()
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Frame rate as a `FrameRateType`: an integer or `n/d`. Decimal rates close to
/// an NTSC rate become `n/1001`, any other fraction is rounded.
fn frame_rate_attr(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return DEFAULT_FRAME_RATE.to_string(),
    };

    if let Some((num, den)) = raw.split_once('/') {
        return match (num.trim().parse::<u32>(), den.trim().parse::<u32>()) {
            (Ok(num), Ok(den)) if num > 0 && den > 0 => format!("{num}/{den}"),
            _ => DEFAULT_FRAME_RATE.to_string(),
        };
    }

    match raw.parse::<f64>() {
        Ok(fps) if fps.is_finite() && fps > 0.0 => {
            let nearest = fps.round().max(1.0);
            if (fps - nearest).abs() < 0.001 {
                return format!("{}", nearest as u32);
            }
            let ntsc = nearest * 1000.0 / 1001.0;
            if (fps - ntsc).abs() < 0.01 {
                format!("{}/1001", nearest as u32 * 1000)
            } else {
                format!("{}", nearest as u32)
            }
        }
        _ => DEFAULT_FRAME_RATE.to_string(),
    }
}

fn range_or_unknown(range: &Option<String>) -> String {
    range
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or(UNKNOWN_RANGE)
        .to_string()
}

/// Render an MPD document
pub fn render_mpd(view: &MpdView) -> AppResult<String> {
    let mut out = String::with_capacity(2048 + view.periods.len() * 1536);
    write_mpd(&mut out, view).map_err(|e| AppError::render("MPD", e.to_string()))?;
    Ok(out)
}

fn write_mpd(out: &mut String, view: &MpdView) -> std::fmt::Result {
    let owner = xml_escape(&view.owner_name);

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011""#)?;
    writeln!(out, r#"    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#)?;
    writeln!(out, r#"    xsi:schemaLocation="urn:mpeg:dash:schema:mpd:2011 DASH-MPD.xsd""#)?;
    writeln!(out, r#"    type="static""#)?;
    writeln!(out, r#"    minBufferTime="PT1.5S""#)?;
    writeln!(
        out,
        r#"    mediaPresentationDuration="{}""#,
        iso8601_duration(view.total_duration())
    )?;
    writeln!(out, r#"    profiles="urn:mpeg:dash:profile:isoff-main:2011">"#)?;
    writeln!(out)?;
    writeln!(out, "    <ProgramInformation>")?;
    writeln!(out, "        <Title>{}</Title>", xml_escape(&view.title))?;
    writeln!(
        out,
        "        <Source>{} (BV: {})</Source>",
        owner,
        xml_escape(&view.title_id)
    )?;
    writeln!(out, "        <Copyright>{}</Copyright>", owner)?;
    writeln!(out, "    </ProgramInformation>")?;

    for (index, period) in view.periods.iter().enumerate() {
        write_period(out, index, period)?;
    }

    writeln!(out, "</MPD>")
}

fn write_period(out: &mut String, index: usize, period: &PeriodView) -> std::fmt::Result {
    let video = &period.video;
    let video_id = index * 2;

    writeln!(
        out,
        r#"    <Period id="{}" duration="{}">"#,
        index,
        iso8601_duration(period.duration)
    )?;
    writeln!(
        out,
        r#"        <AdaptationSet id="{video_id}" mimeType="{}" contentType="video" segmentAlignment="true" width="{}" height="{}" frameRate="{}">"#,
        xml_escape(&video.mime_type),
        video.width,
        video.height,
        xml_escape(&video.frame_rate),
    )?;
    writeln!(
        out,
        r#"            <Representation id="{video_id}" bandwidth="{}" codecs="{}" width="{}" height="{}">"#,
        video.bandwidth,
        xml_escape(&video.codecs),
        video.width,
        video.height,
    )?;
    write_segment_source(
        out,
        &video.url,
        &video.initialization_range,
        &video.index_range,
    )?;
    writeln!(out, "            </Representation>")?;
    writeln!(out, "        </AdaptationSet>")?;

    if let Some(audio) = &period.audio {
        let audio_id = video_id + 1;
        writeln!(out)?;
        writeln!(
            out,
            r#"        <AdaptationSet id="{audio_id}" mimeType="{}" contentType="audio" segmentAlignment="true" lang="und">"#,
            xml_escape(&audio.mime_type),
        )?;
        writeln!(
            out,
            r#"            <Representation id="{audio_id}" bandwidth="{}" codecs="{}">"#,
            audio.bandwidth,
            xml_escape(&audio.codecs),
        )?;
        writeln!(
            out,
            r#"                <AudioChannelConfiguration schemeIdUri="urn:mpeg:dash:23003:3:audio_channel_configuration:2011" value="2"/>"#
        )?;
        write_segment_source(
            out,
            &audio.url,
            &audio.initialization_range,
            &audio.index_range,
        )?;
        writeln!(out, "            </Representation>")?;
        writeln!(out, "        </AdaptationSet>")?;
    }

    writeln!(out, "    </Period>")
}

fn write_segment_source(
    out: &mut String,
    url: &str,
    initialization_range: &str,
    index_range: &str,
) -> std::fmt::Result {
    writeln!(out, "                <BaseURL>{}</BaseURL>", relay_url(url))?;
    writeln!(
        out,
        r#"                <SegmentBase indexRange="{}">"#,
        xml_escape(index_range)
    )?;
    writeln!(
        out,
        r#"                    <Initialization range="{}"/>"#,
        xml_escape(initialization_range)
    )?;
    writeln!(out, "                </SegmentBase>")
}
