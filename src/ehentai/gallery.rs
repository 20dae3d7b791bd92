use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"/g/(\d+)/(.{10})").unwrap());

/// 画廊的 ID 和 token，形如 `/g/<id>/<token>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GalleryIdentity {
    pub id: u64,
    pub tag: String,
}

impl FromStr for GalleryIdentity {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self> {
        let caps = URL_PATTERN
            .captures(url)
            .ok_or_else(|| Error::MalformedUrl(url.to_owned()))?;
        let id = caps[1]
            .parse()
            .map_err(|_| Error::MalformedUrl(url.to_owned()))?;
        Ok(Self {
            id,
            tag: caps[2].to_owned(),
        })
    }
}

impl fmt::Display for GalleryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/g/{}/{}", self.id, self.tag)
    }
}

/// 缩略图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    /// 图片序号，解析失败时为 0
    pub index: u32,
    /// 图片详情页地址
    pub url: String,
    /// 文件名
    pub filename: Option<String>,
    /// 缩略图地址
    pub thumbnail_url: Option<String>,
}

/// 画廊的某一页
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryPage {
    /// 当前页，从 1 开始
    pub page: u32,
    /// 最大页
    pub max_pages: u32,
    /// 画廊标题
    pub title: String,
    /// 日文标题
    pub title_jp: Option<String>,
    pub identity: GalleryIdentity,
    /// 所有分页的链接
    pub pages: Vec<String>,
    /// 本页的缩略图
    pub thumbnails: Vec<Thumbnail>,
}

/// 画廊
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gallery {
    pub identity: GalleryIdentity,
    /// 画廊标题
    pub title: String,
    /// 日文标题
    pub title_jp: Option<String>,
    /// 最大页
    pub max_pages: u32,
    /// 所有分页的链接
    pub pages: Vec<String>,
    /// 全部缩略图，按页码排列
    pub thumbnails: Vec<Thumbnail>,
}

impl Gallery {
    /// 将多个画廊页组合为一个画廊，页面顺序无关
    pub fn from_pages(pages: impl IntoIterator<Item = GalleryPage>) -> Result<Self> {
        let mut pages = pages.into_iter().collect::<Vec<_>>();
        pages.sort_by_key(|p| p.page);

        let mut iter = pages.into_iter();
        let first = iter.next().ok_or(Error::EmptyGallery)?;
        let mut thumbnails = first.thumbnails;
        for page in iter {
            if page.identity != first.identity {
                return Err(Error::IdentityMismatch(first.identity, page.identity));
            }
            thumbnails.extend(page.thumbnails);
        }

        Ok(Self {
            identity: first.identity,
            title: first.title,
            title_jp: first.title_jp,
            max_pages: first.max_pages,
            pages: first.pages,
            thumbnails,
        })
    }

    /// 所有图片详情页的地址
    pub fn image_page_urls(&self) -> Vec<&str> {
        self.thumbnails.iter().map(|t| t.url.as_str()).collect()
    }
}
