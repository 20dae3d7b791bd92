use crate::error::{Error, Result};
use futures::future::BoxFuture;

/// 一次请求的响应，不会自动跟随重定向
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// 请求地址
    pub url: String,
    /// 状态码
    pub status: u16,
    /// Location 头
    pub location: Option<String>,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// 获取文档的能力，由外部配置好 cookie、代理和超时后注入
pub trait Fetch: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Response>>;
}

/// 请求一个页面并返回正文，状态码必须为 2xx
pub async fn fetch_html<F: Fetch + ?Sized>(fetcher: &F, url: &str) -> Result<String> {
    let response = fetcher.get(url).await?;
    trace!("状态码: {} {}", response.status, url);
    if !response.is_success() {
        return Err(Error::Status {
            url: url.to_owned(),
            status: response.status,
        });
    }
    Ok(response.body)
}
