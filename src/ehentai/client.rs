use crate::config::{ClientConfig, SiteConfig};
use crate::error::{Error, Result};
use crate::fetch::{Fetch, Response};
use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::*;
use reqwest::{redirect::Policy, Client, Proxy};
use std::time::Duration;

const DEFAULT_HEADERS: [(HeaderName, &str); 6] = [
    (
        ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    (ACCEPT_ENCODING, "gzip, deflate, br"),
    (ACCEPT_LANGUAGE, "zh-CN,en-US;q=0.7,en;q=0.3"),
    (CACHE_CONTROL, "max-age=0"),
    (UPGRADE_INSECURE_REQUESTS, "1"),
    (
        USER_AGENT,
        "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:67.0) Gecko/20100101 Firefox/67.0",
    ),
];

/// 带 cookie 的 HTTP 客户端，不会跟随重定向
#[derive(Debug, Clone)]
pub struct EhClient {
    client: Client,
}

impl EhClient {
    pub fn new(config: &ClientConfig, site: &SiteConfig) -> anyhow::Result<Self> {
        let mut headers = DEFAULT_HEADERS
            .iter()
            .map(|(k, v)| (k.clone(), HeaderValue::from_static(*v)))
            .collect::<HeaderMap>();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&config.cookie).context("cookie 格式错误")?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&site.base_url).context("站点地址格式错误")?,
        );

        let mut client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .pool_max_idle_per_host(config.pool_max_idle)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout));
        if let Some(proxy) = &config.proxy {
            info!("使用代理: {}", proxy);
            client = client.proxy(Proxy::all(proxy).context("代理地址格式错误")?);
        }
        let client = client.build()?;

        Ok(Self { client })
    }

    async fn send(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let body = response.text().await.map_err(|e| classify(url, e))?;
        Ok(Response {
            url: url.to_owned(),
            status,
            location,
            body,
        })
    }
}

fn classify(url: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(url.to_owned())
    } else {
        Error::Transport {
            url: url.to_owned(),
            message: e.to_string(),
        }
    }
}

impl Fetch for EhClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Response>> {
        self.send(url).boxed()
    }
}
