/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
use std::time::Duration;

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 2233;
/// Host used in playlist links when the request carries no `Host` header
pub const DEFAULT_PUBLIC_HOST: &str = "localhost:2233";

// Origin platform defaults
pub const DEFAULT_API_BASE: &str = "https://api.bilibili.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
pub const DEFAULT_REFERER: &str = "https://www.bilibili.com/";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USE_ENV_PROXY: bool = true;
pub const DEFAULT_INSECURE: bool = false;

// Selection defaults
pub const DEFAULT_CODEC_PRIORITY: &str = "hevc,avc,av1";
pub const DEFAULT_MAX_QUALITY: &str = "1080P";

// Metadata cache defaults
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
