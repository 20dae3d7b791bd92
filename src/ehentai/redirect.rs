use super::image::ImageDetail;
use crate::batch::BatchFetcher;
use crate::error::{Error, Result};
use crate::fetch::{fetch_html, Fetch};
use std::collections::{HashMap, HashSet};
use url::Url;

/// 原图地址中包含这个字符串，其他地址本身就是图片
pub const FULL_IMAGE_MARKER: &str = "fullimg.php";

/// 解析图片详情页的原图地址
pub struct RedirectResolver<'a, F: ?Sized> {
    fetcher: &'a F,
    batch: &'a BatchFetcher,
}

impl<'a, F: Fetch + ?Sized> RedirectResolver<'a, F> {
    pub fn new(fetcher: &'a F, batch: &'a BatchFetcher) -> Self {
        Self { fetcher, batch }
    }

    /// 请求并解析图片详情页
    pub async fn image_detail(&self, url: &str) -> Result<ImageDetail> {
        let fetcher = self.fetcher;
        self.batch
            .fetch_one(url.to_owned(), move |url: String| async move {
                let html = fetch_html(fetcher, &url).await?;
                ImageDetail::from_html(&html)
            })
            .await
    }

    /// 返回图片详情页对应的原图地址，没有原图时返回预览图地址
    pub async fn resolve_original(&self, url: &str) -> Result<String> {
        let detail = self.image_detail(url).await?;
        if detail.is_quota_exceeded() {
            warn!("图片配额已用完: {}", url);
        }
        match detail.redirect_url {
            Some(redirect) => {
                let fetcher = self.fetcher;
                self.batch
                    .fetch_one(redirect, move |redirect: String| async move {
                        redirect_target(fetcher, &redirect).await
                    })
                    .await
            }
            None => detail
                .preview_src
                .ok_or_else(|| Error::MissingImage(url.to_owned())),
        }
    }

    /// 批量解析原图地址，返回 详情页地址 -> 原图地址
    pub async fn resolve_originals(
        &self,
        urls: impl IntoIterator<Item = String>,
    ) -> Result<HashMap<String, String>> {
        let fetcher = self.fetcher;
        let candidates = self
            .batch
            .fetch_all(urls, move |url: String| async move {
                let html = fetch_html(fetcher, &url).await?;
                let detail = ImageDetail::from_html(&html)?;
                if detail.is_quota_exceeded() {
                    warn!("图片配额已用完: {}", url);
                }
                detail
                    .redirect_url
                    .or(detail.preview_src)
                    .ok_or_else(|| Error::MissingImage(url))
            })
            .await?;

        let targets = self
            .resolve_redirects(candidates.values().cloned().collect::<HashSet<_>>())
            .await?;
        Ok(candidates
            .into_iter()
            .filter_map(|(url, candidate)| targets.get(&candidate).map(|t| (url, t.clone())))
            .collect())
    }

    /// 批量请求原图地址，返回 原图地址 -> 重定向后的地址
    ///
    /// 不含 [`FULL_IMAGE_MARKER`] 的地址本身就是预览图，直接原样返回。
    pub async fn resolve_redirects(
        &self,
        urls: impl IntoIterator<Item = String>,
    ) -> Result<HashMap<String, String>> {
        let (originals, direct): (Vec<_>, Vec<_>) = urls
            .into_iter()
            .partition(|url| url.contains(FULL_IMAGE_MARKER));
        debug!("原图 {} 张，预览图 {} 张", originals.len(), direct.len());

        let mut result = direct
            .into_iter()
            .map(|url| (url.clone(), url))
            .collect::<HashMap<_, _>>();
        if !originals.is_empty() {
            let fetcher = self.fetcher;
            result.extend(
                self.batch
                    .fetch_all(originals, move |url: String| async move {
                        redirect_target(fetcher, &url).await
                    })
                    .await?,
            );
        }
        Ok(result)
    }
}

/// 请求原图地址，从 Location 头中取出真实地址
async fn redirect_target<F: Fetch + ?Sized>(fetcher: &F, url: &str) -> Result<String> {
    let response = fetcher.get(url).await?;
    match (response.is_redirect(), response.location) {
        (true, Some(location)) => {
            let target = Url::parse(url)
                .and_then(|base| base.join(&location))
                .map(String::from)
                .unwrap_or(location);
            trace!("{} -> {}", url, target);
            Ok(target)
        }
        _ => Err(Error::RedirectResolutionFailed {
            url: url.to_owned(),
            status: response.status,
        }),
    }
}
