//! Manifest rendering
//!
//! Both writers are pure functions over fully-populated view structs: no
//! network, no cache, no clock. Rendering the same view twice yields the same
//! bytes.

use std::borrow::Cow;

pub mod dash;
pub mod hls;

pub use dash::{render_mpd, AudioTrackView, MpdView, PeriodView, VideoTrackView};
pub use hls::{render_playlist, PlaylistEntryView, PlaylistView};

/// Path of the relay endpoint that media `BaseURL`s point at
pub const RELAY_PATH: &str = "/v1/proxy";

/// Format whole seconds as a restricted ISO-8601 duration.
///
/// Leading zero units are dropped (`PT30S`, `PT1M30S`), but once hours are
/// present minutes and seconds are always written (`PT1H0M0S`).
pub fn iso8601_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("PT{hours}H{minutes}M{secs}S")
    } else if minutes > 0 {
        format!("PT{minutes}M{secs}S")
    } else {
        format!("PT{secs}S")
    }
}

/// Escape free text for XML element content and attribute values
pub fn xml_escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Same-origin relay path carrying the upstream URL as a query parameter
pub fn relay_url(upstream: &str) -> String {
    format!("{RELAY_PATH}?url={}", urlencoding::encode(upstream))
}
