//! 从页面中提取画廊页、图片详情页和图片配额
//!
//! 选择器与站点的页面结构一一对应，只依赖解析后的文档，不做任何请求。

use super::gallery::{GalleryIdentity, GalleryPage, Thumbnail};
use super::image::{ImageDetail, ImageLimit};
use crate::error::{Error, Result};
use crate::xpath::{has_class, parse_html, Node};
use once_cell::sync::Lazy;
use regex::Regex;

static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"Page (\d+): (.+)").unwrap());

/// 解析画廊的某一页
pub fn parse_gallery_page(root: &Node) -> Result<GalleryPage> {
    // 标题
    let title = match root.first_elem(r#"//*[@id="gn"]"#)? {
        Some(e) => e.own_text()?,
        None => {
            warn!("找不到画廊标题");
            String::new()
        }
    };
    let title_jp = root
        .first_elem(r#"//*[@id="gj"]"#)?
        .map(|e| e.own_text())
        .transpose()?
        .filter(|s| !s.is_empty());

    // 翻页组件
    let pager = root
        .first_elem(&format!("(//*[{}])[1]", has_class("ptt")))?
        .ok_or(Error::MissingPager)?;

    // 当前页
    let page = pager
        .first_elem(&format!(
            "(.//*[{}])[1]/descendant-or-self::a",
            has_class("ptds")
        ))?
        .map(|a| a.own_text())
        .transpose()?
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0)
        .ok_or(Error::MissingPager)?;

    // 最大页和第一页的链接
    let anchors = pager.xpath_elem(".//a")?;
    let mut max_pages = 0;
    let mut first_url = None;
    for a in &anchors {
        let text = a.own_text()?;
        if first_url.is_none() && text == "1" {
            first_url = a.attr("href");
        }
        if let Ok(n) = text.parse::<u32>() {
            max_pages = max_pages.max(n);
        }
    }
    trace!("当前页: {}, 最大页: {}", page, max_pages);

    let identity: GalleryIdentity = match &first_url {
        Some(url) => url.parse::<GalleryIdentity>()?,
        None => anchors
            .iter()
            .filter_map(|a| a.attr("href"))
            .find_map(|href| href.parse::<GalleryIdentity>().ok())
            .ok_or_else(|| Error::MalformedUrl("翻页组件中没有画廊地址".to_owned()))?,
    };

    let pages = match &first_url {
        Some(url) => sibling_pages(url, max_pages),
        None => {
            warn!("找不到第一页的链接: {}", identity);
            vec![]
        }
    };

    let thumbnails = root
        .xpath_elem(&format!("//*[{}]", has_class("gdtl")))?
        .iter()
        .map(parse_thumbnail)
        .collect::<Result<Vec<_>>>()?;

    Ok(GalleryPage {
        page,
        max_pages,
        title,
        title_jp,
        identity,
        pages,
        thumbnails,
    })
}

/// 第一页的链接加上 `?p=N`，共 `max_pages` 个
pub fn sibling_pages(first_url: &str, max_pages: u32) -> Vec<String> {
    if max_pages == 0 {
        return vec![];
    }
    let mut pages = Vec::with_capacity(max_pages as usize);
    pages.push(first_url.to_owned());
    pages.extend((1..max_pages).map(|i| format!("{}?p={}", first_url, i)));
    pages
}

/// 用 gdtl 元素构造缩略图
fn parse_thumbnail(node: &Node) -> Result<Thumbnail> {
    let url = node
        .first_text("(descendant-or-self::a)[1]/@href")?
        .ok_or_else(|| Error::Markup("缩略图没有详情页链接".to_owned()))?;

    let img = node.first_elem("(descendant-or-self::img)[1]")?;
    let thumbnail_url = img.as_ref().and_then(|e| e.attr("src"));
    let (index, filename) = img
        .and_then(|e| e.attr("title"))
        .and_then(|title| parse_image_title(&title))
        .map_or((0, None), |(index, filename)| (index, Some(filename)));

    Ok(Thumbnail {
        index,
        url,
        filename,
        thumbnail_url,
    })
}

/// 解析形如 `Page 7: cover.png` 的标题
pub fn parse_image_title(title: &str) -> Option<(u32, String)> {
    let caps = TITLE_PATTERN.captures(title)?;
    let index = caps[1].parse().ok()?;
    Some((index, caps[2].to_owned()))
}

/// 解析图片详情页
pub fn parse_image_detail(root: &Node) -> Result<ImageDetail> {
    let title = root
        .first_elem(r#"(//*[@id="i1"]/h1)[1]"#)?
        .map(|e| e.own_text())
        .transpose()?;
    let preview_src = root
        .first_elem(r#"//*[@id="img"]"#)?
        .and_then(|e| e.attr("src"));
    let redirect_url = root
        .first_elem(r#"(//*[@id="i7"]/a)[1]"#)?
        .and_then(|e| e.attr("href"));

    Ok(ImageDetail {
        title,
        preview_src,
        redirect_url,
    })
}

/// 解析首页的图片配额，页面上没有配额信息时返回 None
pub fn parse_quota(root: &Node) -> Result<Option<ImageLimit>> {
    let values = root.xpath_elem(&format!("//*[{}]//strong", has_class("homebox")))?;
    if values.len() < 2 {
        debug!("找不到图片配额");
        return Ok(None);
    }
    let number = |node: &Node| -> Result<u32> {
        let text = node.xpath_text(".//text()")?.join("");
        let text = text.trim().replace(',', "");
        text.parse()
            .map_err(|_| Error::Markup(format!("图片配额不是数字: {}", text)))
    };
    Ok(Some(ImageLimit {
        current: number(&values[0])?,
        max: number(&values[1])?,
    }))
}

impl GalleryPage {
    pub fn from_html(html: &str) -> Result<Self> {
        parse_gallery_page(&parse_html(html)?)
    }
}

impl ImageDetail {
    pub fn from_html(html: &str) -> Result<Self> {
        parse_image_detail(&parse_html(html)?)
    }
}

impl ImageLimit {
    pub fn from_html(html: &str) -> Result<Option<Self>> {
        parse_quota(&parse_html(html)?)
    }
}
