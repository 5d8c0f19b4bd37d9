use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 未配置 NEXT_PUBLIC_API_URL 时使用的后端地址
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub api_url: String,
    pub cache_ttl_secs: u64,
    pub nav_refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub auth_token_path: PathBuf,
    pub featured_limit: u32,
}

impl Config {
    /// 使用默认值构建配置，只指定后端地址
    pub fn new(api_url: impl Into<String>) -> Self {
        Config {
            api_url: normalize_base_url(&api_url.into()),
            cache_ttl_secs: 300,
            nav_refresh_interval_secs: 600,
            request_timeout_secs: 15,
            auth_token_path: PathBuf::from(".media-hub/auth.json"),
            featured_limit: 6,
        }
    }

    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let api_url = env::var("NEXT_PUBLIC_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mut config = Config::new(api_url);
        config.cache_ttl_secs = parse_secs("CACHE_TTL", config.cache_ttl_secs);
        config.nav_refresh_interval_secs =
            parse_secs("NAV_REFRESH_INTERVAL", config.nav_refresh_interval_secs);
        config.request_timeout_secs = parse_secs("REQUEST_TIMEOUT", config.request_timeout_secs);
        config.featured_limit = parse_var("FEATURED_LIMIT", config.featured_limit);
        if let Ok(path) = env::var("AUTH_TOKEN_PATH") {
            config.auth_token_path = PathBuf::from(path);
        }
        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn nav_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.nav_refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// REST 接口根路径
    pub fn api_base(&self) -> String {
        format!("{}/api", self.api_url)
    }

    /// 把相对资源路径拼成绝对地址，已经是绝对地址的原样返回
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => parse_raw(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_raw<T: std::str::FromStr>(name: &str, raw: &str, default: T) -> T {
    raw.trim().trim_end_matches('s').parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value for {}: {:?}, using default", name, raw);
        default
    })
}

/// 时长配置（秒），0 不是合法值
fn parse_secs(name: &str, default: u64) -> u64 {
    non_zero_secs(name, parse_var(name, default), default)
}

fn non_zero_secs(name: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        tracing::warn!("{} must be greater than zero, using default {}", name, default);
        return default;
    }
    value
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
