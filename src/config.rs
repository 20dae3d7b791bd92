use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use std::{fs::File, io::Read, path::Path};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// HTTP 客户端配置
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// 登录后的 cookie，每个请求都会带上
    pub cookie: String,
    /// 代理地址，支持 http 和 socks5
    pub proxy: Option<String>,
    /// 单个请求的超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_timeout")]
    pub connect_timeout: u64,
    /// 每个 host 保留的空闲连接数
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle: usize,
    /// 空闲连接的保留时间（秒）
    #[serde(default = "default_timeout")]
    pub pool_idle_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// 站点地址，用于 Referer
    pub base_url: String,
    /// 查询图片配额的页面
    pub home_url: String,
}

/// 批量请求配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 同时进行的请求数
    pub concurrency: usize,
    /// 最多请求几轮
    pub max_attempts: u32,
    /// 第二轮请求前的等待时间（毫秒），之后每轮翻倍
    pub backoff: u64,
    /// 等待时间上限（毫秒）
    pub max_backoff: u64,
}

fn default_timeout() -> u64 {
    30
}

fn default_pool_max_idle() -> usize {
    3
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://exhentai.org".to_owned(),
            home_url: "https://e-hentai.org/home.php".to_owned(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            max_attempts: 5,
            backoff: 1000,
            max_backoff: 30000,
        }
    }
}

impl ClientConfig {
    pub fn new(cookie: &str) -> Self {
        Self {
            cookie: cookie.to_owned(),
            proxy: None,
            timeout: default_timeout(),
            connect_timeout: default_timeout(),
            pool_max_idle: default_pool_max_idle(),
            pool_idle_timeout: default_timeout(),
        }
    }
}

impl BatchConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff)
    }
}

impl Config {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file =
            File::open(path).with_context(|| format!("无法打开配置文件 {}", path.display()))?;
        let mut str = String::new();
        file.read_to_string(&mut str)?;
        toml::from_str(&str).context("配置文件格式错误")
    }
}
