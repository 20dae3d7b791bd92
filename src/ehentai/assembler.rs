use super::gallery::{Gallery, GalleryPage};
use crate::batch::BatchFetcher;
use crate::error::Result;
use crate::fetch::{fetch_html, Fetch};
use std::collections::BTreeMap;

/// 从画廊的任意一页出发，请求所有分页并组合为一个画廊
pub struct PageAssembler<'a, F: ?Sized> {
    fetcher: &'a F,
    batch: &'a BatchFetcher,
}

impl<'a, F: Fetch + ?Sized> PageAssembler<'a, F> {
    pub fn new(fetcher: &'a F, batch: &'a BatchFetcher) -> Self {
        Self { fetcher, batch }
    }

    /// 请求并解析一个画廊页
    pub async fn gallery_page(&self, url: &str) -> Result<GalleryPage> {
        let fetcher = self.fetcher;
        self.batch
            .fetch_one(url.to_owned(), move |url: String| async move {
                let html = fetch_html(fetcher, &url).await?;
                GalleryPage::from_html(&html)
            })
            .await
    }

    /// 并发请求多个画廊页
    pub async fn gallery_pages(
        &self,
        urls: impl IntoIterator<Item = String>,
    ) -> Result<Vec<GalleryPage>> {
        let fetcher = self.fetcher;
        let pages = self
            .batch
            .fetch_all(urls, move |url: String| async move {
                let html = fetch_html(fetcher, &url).await?;
                GalleryPage::from_html(&html)
            })
            .await?;
        Ok(pages.into_iter().map(|(_, page)| page).collect())
    }

    pub async fn resolve_gallery(&self, seed_url: &str) -> Result<Gallery> {
        info!("获取画廊: {}", seed_url);
        let seed = self.gallery_page(seed_url).await?;
        info!(
            "{}: 共 {} 页，当前第 {} 页",
            seed.title, seed.max_pages, seed.page
        );

        // 缺少的页
        let missing = seed
            .pages
            .iter()
            .filter(|url| *url != seed_url)
            .cloned()
            .collect::<Vec<_>>();

        let mut pages = BTreeMap::new();
        if !missing.is_empty() {
            debug!("请求剩余 {} 页", missing.len());
            for page in self.gallery_pages(missing).await? {
                pages.entry(page.page).or_insert(page);
            }
        }
        // 种子页优先，避免地址写法不同导致同一页出现两次
        pages.insert(seed.page, seed);

        let gallery = Gallery::from_pages(pages.into_values())?;
        info!(
            "{}: 共 {} 张图片",
            gallery.identity,
            gallery.thumbnails.len()
        );
        Ok(gallery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RetryPolicy;
    use crate::config::BatchConfig;
    use crate::ehentai::fixtures::*;
    use crate::error::Error;
    use crate::fetch::mock::{MockFetch, Reply};
    use std::time::Duration;

    fn batch() -> BatchFetcher {
        BatchFetcher::new(&BatchConfig::default()).with_policy(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(0),
            max_backoff: Duration::from_millis(0),
        })
    }

    fn gallery_site(max_pages: u32, per_page: u32) -> MockFetch {
        (1..=max_pages).fold(MockFetch::new(), |fetch, n| {
            let url = page_url(n);
            fetch.on(&url, Reply::html(&url, gallery_html(n, max_pages, per_page)))
        })
    }

    fn indexes(gallery: &Gallery) -> Vec<u32> {
        gallery.thumbnails.iter().map(|t| t.index).collect()
    }

    #[tokio::test]
    async fn from_first_page() {
        let fetch = gallery_site(3, 2);
        let batch = batch();
        let gallery = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(BASE)
            .await
            .unwrap();

        assert_eq!(indexes(&gallery), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(gallery.max_pages, 3);
        assert_eq!(gallery.pages.len(), 3);
        assert_eq!(gallery.identity.id, 123456);
        assert_eq!(gallery.title, "[Artist] Some Gallery");
        for n in 1..=3 {
            assert_eq!(fetch.count(&page_url(n)), 1);
        }
    }

    #[tokio::test]
    async fn from_middle_page() {
        let fetch = gallery_site(4, 1);
        let batch = batch();
        let gallery = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(&page_url(3))
            .await
            .unwrap();
        assert_eq!(indexes(&gallery), vec![1, 2, 3, 4]);
        assert_eq!(fetch.count(&page_url(3)), 1);
        assert_eq!(fetch.calls().len(), 4);
    }

    #[tokio::test]
    async fn non_canonical_seed_is_not_duplicated() {
        let seed = format!("{}?p=0", BASE);
        let fetch = gallery_site(2, 2).on(&seed, Reply::html(&seed, gallery_html(1, 2, 2)));
        let batch = batch();
        let gallery = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(&seed)
            .await
            .unwrap();
        assert_eq!(indexes(&gallery), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn single_page() {
        let fetch = gallery_site(1, 3);
        let batch = batch();
        let gallery = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(BASE)
            .await
            .unwrap();
        assert_eq!(indexes(&gallery), vec![1, 2, 3]);
        assert_eq!(fetch.calls(), vec![BASE.to_owned()]);
    }

    #[tokio::test]
    async fn pager_without_first_link_uses_seed_only() {
        let seed = page_url(3);
        let html = format!(
            r#"<html><body><h1 id="gn">Partial</h1>
            <table class="ptt"><tr>
              <td><a href="{}">&lt;</a></td>
              <td class="ptds"><a href="{}">3</a></td>
              <td><a href="{}">4</a></td>
            </tr></table>
            <div class="gdtl"><a href="{}"><img title="Page 5: 005.jpg" src="https://thumb.example/5.jpg"></a></div>
            </body></html>"#,
            page_url(2),
            seed,
            page_url(4),
            image_url(5)
        );
        let fetch = MockFetch::new().on(&seed, Reply::html(&seed, html));
        let batch = batch();
        let gallery = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(&seed)
            .await
            .unwrap();
        assert_eq!(gallery.max_pages, 4);
        assert!(gallery.pages.is_empty());
        assert_eq!(indexes(&gallery), vec![5]);
        assert_eq!(fetch.calls(), vec![seed]);
    }

    #[tokio::test]
    async fn retries_flaky_pages() {
        let fetch = gallery_site(3, 1)
            .on_front(&page_url(2), Reply::Timeout)
            .on_front(&page_url(3), Reply::Io("connection reset"));
        let batch = batch();
        let gallery = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(BASE)
            .await
            .unwrap();
        assert_eq!(indexes(&gallery), vec![1, 2, 3]);
        assert_eq!(fetch.count(&page_url(1)), 1);
        assert_eq!(fetch.count(&page_url(2)), 2);
        assert_eq!(fetch.count(&page_url(3)), 2);
    }

    #[tokio::test]
    async fn deleted_page_is_unresolved() {
        let gone = page_url(3);
        let fetch = (1..=2)
            .fold(MockFetch::new(), |fetch, n| {
                let url = page_url(n);
                fetch.on(&url, Reply::html(&url, gallery_html(n, 3, 1)))
            })
            .on(&gone, Reply::status(&gone, 404, None));
        let batch = batch();
        let err = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(BASE)
            .await
            .unwrap_err();
        match err {
            Error::Unresolved { attempts, keys } => {
                assert_eq!(attempts, 3);
                assert_eq!(keys, vec![gone.clone()]);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(fetch.count(&gone), 3);
        assert_eq!(fetch.count(&page_url(2)), 1);
    }

    #[tokio::test]
    async fn broken_page_aborts() {
        let url = page_url(2);
        let fetch = MockFetch::new()
            .on(BASE, Reply::html(BASE, gallery_html(1, 2, 1)))
            .on(&url, Reply::html(&url, "<html><body>no pager</body></html>"));
        let batch = batch();
        let err = PageAssembler::new(&fetch, &batch)
            .resolve_gallery(BASE)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingPager));
        assert_eq!(fetch.count(&url), 1);
    }
}
