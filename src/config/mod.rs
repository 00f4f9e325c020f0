use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::selection::SelectionPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub origin: OriginConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Host written into playlist links when the request has no `Host` header
    #[serde(default = "default_public_host")]
    pub public_host: String,
}

/// Origin platform access: API location, the identification headers every
/// upstream request must carry, and HTTP client behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Opaque credential cookie string, sent verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    /// Total timeout for metadata and play-URL calls; media relays have none
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    /// Honor HTTP_PROXY / HTTPS_PROXY
    #[serde(default = "default_use_env_proxy")]
    pub use_env_proxy: bool,
    /// Skip TLS certificate verification (CDN mirrors often present mismatched certs)
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Comma separated, e.g. `hevc,avc,av1`
    #[serde(default = "default_codec_priority")]
    pub codec_priority: String,
    /// One of `8K, DOLBY, HDR, 4K, 1080P60, 1080P+, 1080P, 720P60, 720P, 480P, 360P, 240P`
    #[serde(default = "default_max_quality")]
    pub max_quality: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl", with = "duration_serde::duration")]
    pub ttl: Duration,
    #[serde(default = "default_sweep_interval", with = "duration_serde::duration")]
    pub sweep_interval: Duration,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_public_host() -> String {
    DEFAULT_PUBLIC_HOST.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_string()
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_use_env_proxy() -> bool {
    DEFAULT_USE_ENV_PROXY
}

fn default_insecure() -> bool {
    DEFAULT_INSECURE
}

fn default_codec_priority() -> String {
    DEFAULT_CODEC_PRIORITY.to_string()
}

fn default_max_quality() -> String {
    DEFAULT_MAX_QUALITY.to_string()
}

fn default_cache_ttl() -> Duration {
    DEFAULT_CACHE_TTL
}

fn default_sweep_interval() -> Duration {
    DEFAULT_SWEEP_INTERVAL
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_host: default_public_host(),
        }
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            cookie: None,
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            use_env_proxy: default_use_env_proxy(),
            insecure: default_insecure(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            codec_priority: default_codec_priority(),
            max_quality: default_max_quality(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl SelectionConfig {
    /// Resolve the raw tokens; unknown tokens are logged and replaced by defaults
    pub fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::from_tokens(&self.codec_priority, &self.max_quality)
    }
}

impl Config {
    /// Read `config_file`, writing the defaults there first when it does not exist
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}
