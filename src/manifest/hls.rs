//! Extended M3U playlist writer
//!
//! Each entry points back at this gateway's play endpoint, so a player opening
//! the playlist fetches one MPD per part.

use std::fmt::Write;

use crate::errors::{AppError, AppResult};
use crate::models::Title;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistView {
    pub title: String,
    pub entries: Vec<PlaylistEntryView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntryView {
    /// Seconds
    pub duration: u64,
    pub name: String,
    pub url: String,
}

impl PlaylistView {
    /// One entry per part, linking to `{scheme}://{host}/v1/play/{id}?p={n}`
    pub fn for_title(title: &Title, scheme: &str, host: &str) -> Self {
        let entries = title
            .parts
            .iter()
            .enumerate()
            .map(|(index, part)| PlaylistEntryView {
                duration: part.duration,
                name: part.display_name(index),
                url: format!(
                    "{scheme}://{host}/v1/play/{}?p={}",
                    urlencoding::encode(&title.id),
                    index + 1
                ),
            })
            .collect();

        Self {
            title: title.name.clone(),
            entries,
        }
    }
}

/// Render an extended M3U playlist
pub fn render_playlist(view: &PlaylistView) -> AppResult<String> {
    let mut out = String::with_capacity(64 + view.entries.len() * 96);
    write_playlist(&mut out, view).map_err(|e| AppError::render("playlist", e.to_string()))?;
    Ok(out)
}

fn write_playlist(out: &mut String, view: &PlaylistView) -> std::fmt::Result {
    writeln!(out, "#EXTM3U")?;
    writeln!(out, "#PLAYLIST:{}", single_line(&view.title))?;
    for entry in &view.entries {
        writeln!(out, "#EXTINF:{},{}", entry.duration, single_line(&entry.name))?;
        writeln!(out, "{}", entry.url)?;
    }
    Ok(())
}

// A line break inside a directive would start a new playlist line
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dimension, Part};

    fn title() -> Title {
        let part = |name: &str, duration| Part {
            internal_id: duration,
            name: name.to_string(),
            duration,
            dimension: Dimension::default(),
        };
        Title {
            id: "BV1xx411c7mD".to_string(),
            name: "Three Parts".to_string(),
            owner_name: "someone".to_string(),
            parts: vec![part("Opening", 61), part("Middle", 120), part("", 7)],
        }
    }

    #[test]
    fn test_playlist_links_every_part() {
        let view = PlaylistView::for_title(&title(), "http", "gw.local:2233");
        let playlist = render_playlist(&view).unwrap();

        assert_eq!(
            playlist,
            "#EXTM3U\n\
             #PLAYLIST:Three Parts\n\
             #EXTINF:61,Opening\n\
             http://gw.local:2233/v1/play/BV1xx411c7mD?p=1\n\
             #EXTINF:120,Middle\n\
             http://gw.local:2233/v1/play/BV1xx411c7mD?p=2\n\
             #EXTINF:7,P3\n\
             http://gw.local:2233/v1/play/BV1xx411c7mD?p=3\n"
        );
    }

    #[test]
    fn test_scheme_is_taken_verbatim() {
        let view = PlaylistView::for_title(&title(), "https", "example.org");
        assert!(view.entries[0]
            .url
            .starts_with("https://example.org/v1/play/"));
    }

    #[test]
    fn test_line_breaks_are_flattened() {
        let view = PlaylistView {
            title: "a\nb".to_string(),
            entries: vec![PlaylistEntryView {
                duration: 1,
                name: "c\r\nd".to_string(),
                url: "http://h/v1/play/x?p=1".to_string(),
            }],
        };
        let playlist = render_playlist(&view).unwrap();
        assert!(playlist.contains("#PLAYLIST:a b\n"));
        assert!(playlist.contains("#EXTINF:1,c  d\n"));
    }
}
