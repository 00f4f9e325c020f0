//! reqwest-backed origin client

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::types::{ApiEnvelope, PlayUrlData, ViewData};
use super::{MetadataSource, PlayUrlFlags, PlayUrlSource};
use crate::config::OriginConfig;
use crate::errors::{OriginError, OriginResult};
use crate::models::{RenditionSet, Title};

const VIEW_ENDPOINT: &str = "/x/web-interface/view";
const PLAYURL_ENDPOINT: &str = "/x/player/playurl";

/// The headers every upstream request must carry: user agent, referer and,
/// when configured, the credential cookie.
pub fn upstream_headers(config: &OriginConfig) -> OriginResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|_| OriginError::InvalidHeader { name: "User-Agent" })?,
    );
    headers.insert(
        REFERER,
        HeaderValue::from_str(&config.referer)
            .map_err(|_| OriginError::InvalidHeader { name: "Referer" })?,
    );
    if let Some(cookie) = config.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
        let mut value = HeaderValue::from_str(cookie.trim())
            .map_err(|_| OriginError::InvalidHeader { name: "Cookie" })?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}

/// Client carrying the upstream headers and the configured connection behavior.
///
/// `total_timeout` is `None` for media relays, which stream for as long as the
/// player keeps reading.
pub fn build_http_client(
    config: &OriginConfig,
    total_timeout: Option<Duration>,
) -> OriginResult<Client> {
    let mut builder = Client::builder()
        .default_headers(upstream_headers(config)?)
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(8)
        .danger_accept_invalid_certs(config.insecure);

    if let Some(timeout) = total_timeout {
        builder = builder.timeout(timeout);
    }
    if !config.use_env_proxy {
        builder = builder.no_proxy();
    }

    Ok(builder.build()?)
}

/// How a public title id is passed to the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleRef {
    Bvid(String),
    Aid(u64),
}

impl TitleRef {
    /// `av170001` style ids become numeric aids; everything else is a bvid.
    pub fn parse(id: &str) -> OriginResult<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(OriginError::InvalidId { id: id.to_string() });
        }

        match id.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("av") => id[2..]
                .parse::<u64>()
                .map(TitleRef::Aid)
                .map_err(|_| OriginError::InvalidId { id: id.to_string() }),
            _ => Ok(TitleRef::Bvid(id.to_string())),
        }
    }

    fn query_pair(&self) -> (&'static str, String) {
        match self {
            TitleRef::Bvid(bvid) => ("bvid", bvid.clone()),
            TitleRef::Aid(aid) => ("aid", aid.to_string()),
        }
    }
}

/// Origin web API client
#[derive(Clone)]
pub struct OriginClient {
    http: Client,
    api_base: String,
}

impl OriginClient {
    pub fn new(config: &OriginConfig) -> OriginResult<Self> {
        let http = build_http_client(config, Some(config.request_timeout))?;
        info!(
            "Origin client ready: api_base={} cookie={} insecure={} env_proxy={}",
            config.api_base,
            config.cookie.as_deref().is_some_and(|c| !c.trim().is_empty()),
            config.insecure,
            config.use_env_proxy
        );
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> OriginResult<T> {
        let url = format!("{}{}", self.api_base, endpoint);
        debug!("Origin request: {} {:?}", url, query);

        let envelope: ApiEnvelope<T> = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        envelope.into_data(endpoint)
    }
}

#[async_trait]
impl MetadataSource for OriginClient {
    async fn fetch_title(&self, id: &str) -> OriginResult<Title> {
        let title_ref = TitleRef::parse(id)?;
        let view: ViewData = self
            .get_json(VIEW_ENDPOINT, &[title_ref.query_pair()])
            .await?;
        let title = view.into_title(id);
        debug!("Fetched title {} with {} part(s)", title.id, title.parts.len());
        Ok(title)
    }
}

#[async_trait]
impl PlayUrlSource for OriginClient {
    async fn fetch_renditions(
        &self,
        id: &str,
        part_internal_id: u64,
        flags: PlayUrlFlags,
    ) -> OriginResult<RenditionSet> {
        let title_ref = TitleRef::parse(id)?;
        let query = [
            title_ref.query_pair(),
            ("cid", part_internal_id.to_string()),
            ("fnval", flags.bits().to_string()),
            ("fnver", "0".to_string()),
            ("fourk", "1".to_string()),
        ];
        let data: PlayUrlData = self.get_json(PLAYURL_ENDPOINT, &query).await?;
        let set = data.into_rendition_set()?;
        debug!(
            "Fetched renditions for {} cid={}: {} video, {} audio",
            id,
            part_internal_id,
            set.video.len(),
            set.audio.len()
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_ref_parsing() {
        assert_eq!(
            TitleRef::parse("BV1xx411c7mD").unwrap(),
            TitleRef::Bvid("BV1xx411c7mD".to_string())
        );
        assert_eq!(TitleRef::parse("av170001").unwrap(), TitleRef::Aid(170001));
        assert_eq!(TitleRef::parse("AV2").unwrap(), TitleRef::Aid(2));
        assert!(matches!(
            TitleRef::parse("avocado"),
            Err(OriginError::InvalidId { .. })
        ));
        assert!(matches!(
            TitleRef::parse("  "),
            Err(OriginError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_upstream_headers_include_cookie_only_when_set() {
        let mut config = OriginConfig::default();
        let headers = upstream_headers(&config).unwrap();
        assert_eq!(headers.get(REFERER).unwrap(), "https://www.bilibili.com/");
        assert!(headers.get(USER_AGENT).is_some());
        assert!(headers.get(COOKIE).is_none());

        config.cookie = Some("SESSDATA=abc; bili_jct=def".to_string());
        let headers = upstream_headers(&config).unwrap();
        assert_eq!(headers.get(COOKIE).unwrap(), "SESSDATA=abc; bili_jct=def");
        assert!(headers.get(COOKIE).unwrap().is_sensitive());
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let config = OriginConfig {
            cookie: Some("a=b\nc".to_string()),
            ..OriginConfig::default()
        };
        assert!(matches!(
            upstream_headers(&config),
            Err(OriginError::InvalidHeader { name: "Cookie" })
        ));
    }
}
