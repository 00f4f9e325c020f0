//! Playback orchestration
//!
//! Resolves a title through the metadata cache, then either lists its parts
//! as a playlist or picks renditions for one part and writes its MPD.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::cache::MetadataCache;
use crate::errors::{AppError, AppResult, OriginStage};
use crate::manifest::{
    render_mpd, render_playlist, AudioTrackView, MpdView, PeriodView, PlaylistView,
    VideoTrackView,
};
use crate::models::{Part, Title};
use crate::origin::{MetadataSource, PlayUrlFlags, PlayUrlSource};
use crate::selection::StreamSelector;

pub struct PlaybackService {
    cache: Arc<MetadataCache>,
    metadata: Arc<dyn MetadataSource>,
    playurls: Arc<dyn PlayUrlSource>,
    selector: StreamSelector,
    ttl: Duration,
}

impl PlaybackService {
    pub fn new(
        cache: Arc<MetadataCache>,
        metadata: Arc<dyn MetadataSource>,
        playurls: Arc<dyn PlayUrlSource>,
        selector: StreamSelector,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            metadata,
            playurls,
            selector,
            ttl,
        }
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Title metadata, from the cache when live, else fetched and cached.
    ///
    /// Failed fetches are not cached.
    pub async fn title(&self, id: &str) -> AppResult<Arc<Title>> {
        require_id(id)?;

        if let Some(title) = self.cache.get(id).await {
            debug!(id, "Video info from cache");
            return Ok(title);
        }

        let title = self.metadata.fetch_title(id).await.map_err(|e| {
            error!(id, error = %e, "Failed to fetch video info");
            AppError::origin(OriginStage::VideoInfo, e)
        })?;
        let title = Arc::new(title);
        self.cache.put(id, Arc::clone(&title), self.ttl).await;
        debug!(id, "Video info cached");

        Ok(title)
    }

    /// Extended M3U listing every part of the title
    pub async fn playlist(&self, id: &str, scheme: &str, host: &str) -> AppResult<String> {
        let title = self.title(id).await?;
        info!(id, parts = title.parts.len(), "Playlist request");
        render_playlist(&PlaylistView::for_title(&title, scheme, host))
    }

    /// DASH MPD for one part; `page` is the raw `p` query value (1-based, default 1)
    pub async fn play(&self, id: &str, page: Option<&str>) -> AppResult<String> {
        require_id(id)?;
        let page_num = parse_page(page)?;

        let title = self.title(id).await?;
        let part = title.part(page_num).ok_or_else(|| {
            let message = format!("Page num {} out of range {}", page_num, title.parts.len());
            warn!(id, page_num, parts = title.parts.len(), "Page num out of range");
            AppError::validation(message)
        })?;

        let renditions = self
            .playurls
            .fetch_renditions(id, part.internal_id, PlayUrlFlags::DASH_ALL)
            .await
            .map_err(|e| {
                error!(id, cid = part.internal_id, error = %e, "Failed to fetch video playurl");
                AppError::origin(OriginStage::PlayUrl, e)
            })?;

        let selection = self.selector.select_video(&renditions.video, page_num)?;
        let video = selection.rendition;
        info!(
            codecid = video.codec_id,
            quality = %video.quality,
            codecs = %video.codecs,
            within_policy = selection.within_policy,
            "Selected video stream"
        );

        let video_track = VideoTrackView::from_rendition(video, part.dimension)
            .ok_or_else(|| AppError::internal("Selected video stream has no delivery URL"))?;
        let audio_track = self
            .selector
            .select_audio(&renditions.audio)
            .and_then(AudioTrackView::from_rendition);
        if audio_track.is_none() {
            debug!(id, page_num, "No audio stream, writing video-only period");
        }

        let view = MpdView {
            title: document_title(&title, part),
            owner_name: title.owner_name.clone(),
            title_id: title.id.clone(),
            periods: vec![PeriodView {
                duration: part.duration,
                video: video_track,
                audio: audio_track,
            }],
        };

        render_mpd(&view).inspect_err(|e| error!(id, page_num, error = %e, "Failed to render MPD"))
    }
}

fn require_id(id: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        return Err(AppError::validation("Empty id"));
    }
    Ok(())
}

/// Missing or empty means the first part
fn parse_page(raw: Option<&str>) -> AppResult<usize> {
    match raw.filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(p) => match p.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => {
                error!(p, "Invalid page num");
                Err(AppError::validation(format!("Invalid page num: {p}")))
            }
        },
    }
}

/// `{title} - {part}` for named parts of multi-part titles
fn document_title(title: &Title, part: &Part) -> String {
    if title.parts.len() > 1 && !part.name.is_empty() {
        format!("{} - {}", title.name, part.name)
    } else {
        title.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::errors::{OriginError, OriginResult};
    use crate::models::{Dimension, QualityTier, Rendition, RenditionSet};
    use crate::selection::SelectionPolicy;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeOrigin {
        title: Title,
        renditions: RenditionSet,
        title_calls: AtomicUsize,
        fail_title: bool,
        requested_cids: Mutex<Vec<u64>>,
    }

    impl FakeOrigin {
        fn new(title: Title, renditions: RenditionSet) -> Self {
            Self {
                title,
                renditions,
                title_calls: AtomicUsize::new(0),
                fail_title: false,
                requested_cids: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MetadataSource for FakeOrigin {
        async fn fetch_title(&self, _id: &str) -> OriginResult<Title> {
            self.title_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_title {
                return Err(OriginError::Api {
                    code: -404,
                    message: "not found".to_string(),
                });
            }
            Ok(self.title.clone())
        }
    }

    #[async_trait]
    impl PlayUrlSource for FakeOrigin {
        async fn fetch_renditions(
            &self,
            _id: &str,
            part_internal_id: u64,
            flags: PlayUrlFlags,
        ) -> OriginResult<RenditionSet> {
            assert_eq!(flags, PlayUrlFlags::DASH_ALL);
            self.requested_cids.lock().unwrap().push(part_internal_id);
            Ok(self.renditions.clone())
        }
    }

    fn part(cid: u64, name: &str) -> Part {
        Part {
            internal_id: cid,
            name: name.to_string(),
            duration: 100 + cid,
            dimension: Dimension {
                width: 1920,
                height: 1080,
            },
        }
    }

    fn rendition(codec_id: u32, quality: QualityTier, url: &str) -> Rendition {
        Rendition {
            codec_id,
            quality,
            mime_type: "video/mp4".to_string(),
            codecs: format!("codec{codec_id}"),
            bandwidth: 1000,
            width: None,
            height: None,
            frame_rate: None,
            initialization_range: Some("0-99".to_string()),
            index_range: Some("100-199".to_string()),
            mirrors: vec![url.to_string()],
        }
    }

    fn title(parts: Vec<Part>) -> Title {
        Title {
            id: "BV1ab".to_string(),
            name: "Show".to_string(),
            owner_name: "Owner".to_string(),
            parts,
        }
    }

    fn service(origin: Arc<FakeOrigin>) -> (Arc<ManualClock>, PlaybackService) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(MetadataCache::new(clock.clone()));
        let service = PlaybackService::new(
            cache,
            origin.clone(),
            origin,
            StreamSelector::new(SelectionPolicy::default()),
            Duration::from_secs(300),
        );
        (clock, service)
    }

    fn renditions() -> RenditionSet {
        RenditionSet {
            video: vec![
                rendition(7, QualityTier::P1080, "https://cdn/avc1080"),
                rendition(12, QualityTier::UHD_4K, "https://cdn/hevc4k"),
                rendition(12, QualityTier::P1080, "https://cdn/hevc1080"),
            ],
            audio: vec![rendition(0, QualityTier(30280), "https://cdn/audio")],
        }
    }

    #[tokio::test]
    async fn test_metadata_is_fetched_once_within_ttl() {
        let origin = Arc::new(FakeOrigin::new(title(vec![part(1, "")]), renditions()));
        let (clock, service) = service(origin.clone());

        service.title("BV1ab").await.unwrap();
        service.title("BV1ab").await.unwrap();
        assert_eq!(origin.title_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(300));
        service.title("BV1ab").await.unwrap();
        assert_eq!(origin.title_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let mut fake = FakeOrigin::new(title(vec![part(1, "")]), renditions());
        fake.fail_title = true;
        let origin = Arc::new(fake);
        let (_clock, service) = service(origin.clone());

        let err = service.play("BV1ab", None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch video info: API error -404: not found"
        );
        assert!(service.title("BV1ab").await.is_err());
        assert_eq!(origin.title_calls.load(Ordering::SeqCst), 2);
        assert!(service.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_play_selects_part_and_hevc() {
        let origin = Arc::new(FakeOrigin::new(
            title(vec![part(11, "Intro"), part(22, "Main")]),
            renditions(),
        ));
        let (_clock, service) = service(origin.clone());

        let mpd = service.play("BV1ab", Some("2")).await.unwrap();

        assert_eq!(*origin.requested_cids.lock().unwrap(), vec![22]);
        assert!(mpd.contains("<Title>Show - Main</Title>"));
        assert!(mpd.contains(r#"<Period id="0" duration="PT2M2S">"#));
        assert!(mpd.contains("https%3A%2F%2Fcdn%2Fhevc1080"));
        assert!(!mpd.contains("hevc4k"));
        assert!(mpd.contains(r#"width="1920" height="1080""#));
    }

    #[tokio::test]
    async fn test_single_part_title_keeps_plain_title() {
        let origin = Arc::new(FakeOrigin::new(title(vec![part(1, "Only")]), renditions()));
        let (_clock, service) = service(origin);

        let mpd = service.play("BV1ab", None).await.unwrap();
        assert!(mpd.contains("<Title>Show</Title>"));
    }

    #[tokio::test]
    async fn test_page_validation_messages() {
        let origin = Arc::new(FakeOrigin::new(
            title(vec![part(1, ""), part(2, "")]),
            renditions(),
        ));
        let (_clock, service) = service(origin.clone());

        for raw in ["0", "-1", "abc", "1.5"] {
            let err = service.play("BV1ab", Some(raw)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
            assert_eq!(err.to_string(), format!("Invalid page num: {raw}"));
        }
        // invalid pages are rejected before any upstream call
        assert_eq!(origin.title_calls.load(Ordering::SeqCst), 0);

        let err = service.play("BV1ab", Some("3")).await.unwrap_err();
        assert_eq!(err.to_string(), "Page num 3 out of range 2");
        assert!(origin.requested_cids.lock().unwrap().is_empty());

        let err = service.play("", Some("1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Empty id");
    }

    #[tokio::test]
    async fn test_no_video_is_an_error() {
        let origin = Arc::new(FakeOrigin::new(
            title(vec![part(1, "")]),
            RenditionSet::default(),
        ));
        let (_clock, service) = service(origin);

        let err = service.play("BV1ab", None).await.unwrap_err();
        assert!(matches!(err, AppError::NoVideoStream { part: 1 }));
    }

    #[tokio::test]
    async fn test_playlist_uses_cached_title() {
        let origin = Arc::new(FakeOrigin::new(
            title(vec![part(1, "A"), part(2, "")]),
            renditions(),
        ));
        let (_clock, service) = service(origin.clone());

        let playlist = service
            .playlist("BV1ab", "http", "localhost:2233")
            .await
            .unwrap();
        service.play("BV1ab", Some("2")).await.unwrap();

        assert!(playlist.contains("#EXTINF:102,P2\nhttp://localhost:2233/v1/play/BV1ab?p=2\n"));
        assert_eq!(origin.title_calls.load(Ordering::SeqCst), 1);
    }
}
