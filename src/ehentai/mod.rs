mod assembler;
mod client;
mod gallery;
mod image;
pub mod parser;
mod redirect;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::assembler::PageAssembler;
pub use self::client::EhClient;
pub use self::gallery::{Gallery, GalleryIdentity, GalleryPage, Thumbnail};
pub use self::image::{ImageDetail, ImageLimit};
pub use self::redirect::{RedirectResolver, FULL_IMAGE_MARKER};

use crate::batch::BatchFetcher;
use crate::config::{Config, SiteConfig};
use crate::error::Result;
use crate::fetch::{fetch_html, Fetch};
use std::collections::HashMap;

/// 画廊、原图和图片配额的入口
pub struct EhApi<F> {
    fetcher: F,
    batch: BatchFetcher,
    site: SiteConfig,
}

impl EhApi<EhClient> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = EhClient::new(&config.client, &config.site)?;
        Ok(Self::new(
            client,
            BatchFetcher::new(&config.batch),
            config.site.clone(),
        ))
    }
}

impl<F: Fetch> EhApi<F> {
    pub fn new(fetcher: F, batch: BatchFetcher, site: SiteConfig) -> Self {
        Self {
            fetcher,
            batch,
            site,
        }
    }

    pub fn assembler(&self) -> PageAssembler<'_, F> {
        PageAssembler::new(&self.fetcher, &self.batch)
    }

    pub fn resolver(&self) -> RedirectResolver<'_, F> {
        RedirectResolver::new(&self.fetcher, &self.batch)
    }

    /// 获取画廊，`url` 可以是画廊的任意一页
    pub async fn gallery(&self, url: &str) -> Result<Gallery> {
        self.assembler().resolve_gallery(url).await
    }

    /// 获取单张图片的原图地址
    pub async fn original_url(&self, image_page_url: &str) -> Result<String> {
        self.resolver().resolve_original(image_page_url).await
    }

    /// 获取画廊中所有图片的原图地址，按缩略图顺序返回
    pub async fn original_urls(&self, gallery: &Gallery) -> Result<Vec<(String, String)>> {
        let urls = gallery
            .image_page_urls()
            .into_iter()
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        let mut resolved: HashMap<String, String> =
            self.resolver().resolve_originals(urls.clone()).await?;
        Ok(urls
            .into_iter()
            .filter_map(|url| resolved.remove(&url).map(|target| (url, target)))
            .collect())
    }

    /// 图片配额，站点不提供时返回 None
    pub async fn image_limit(&self) -> Result<Option<ImageLimit>> {
        let fetcher = &self.fetcher;
        self.batch
            .fetch_one(self.site.home_url.clone(), move |url: String| async move {
                let html = fetch_html(fetcher, &url).await?;
                ImageLimit::from_html(&html)
            })
            .await
    }
}
