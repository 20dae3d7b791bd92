//! 测试用的页面，结构与站点一致

pub const BASE: &str = "https://site.example/g/123456/abcdefghij/";

/// 第 n 页（从 1 开始）的地址
pub fn page_url(n: u32) -> String {
    if n == 1 {
        BASE.to_owned()
    } else {
        format!("{}?p={}", BASE, n - 1)
    }
}

/// 第 i 张图片的详情页
pub fn image_url(i: u32) -> String {
    format!("https://site.example/s/{:010}/123456-{}", i, i)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
}

/// 画廊的第 `page` 页，每页 `per_page` 张缩略图
pub fn gallery_html(page: u32, max_pages: u32, per_page: u32) -> String {
    let mut pager = format!(
        r#"<td onclick="document.location=this.firstChild.href"><a href="{}" onclick="return false">&lt;</a></td>"#,
        page_url(page.saturating_sub(1).max(1))
    );
    for n in 1..=max_pages {
        let class = if n == page { "ptds" } else { "ptb" };
        pager.push_str(&format!(
            r#"<td class="{}" onclick="document.location=this.firstChild.href"><a href="{}" onclick="return false">{}</a></td>"#,
            class,
            page_url(n),
            n
        ));
    }
    pager.push_str(&format!(
        r#"<td><a href="{}" onclick="return false">&gt;</a></td>"#,
        page_url((page + 1).min(max_pages))
    ));

    let mut thumbs = String::new();
    for i in (page - 1) * per_page + 1..=page * per_page {
        thumbs.push_str(&format!(
            r#"<div class="gdtl" style="height:320px"><a href="{}"><img alt="{:03}" title="Page {}: {:03}.jpg" src="https://thumb.example/{}.jpg" /></a></div>"#,
            image_url(i),
            i,
            i,
            i,
            i
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html><head><title>[Artist] Some Gallery - ExHentai.org</title></head>
<body>
<div class="gm">
  <div id="gd2"><h1 id="gn">[Artist] Some Gallery</h1><h1 id="gj">[作者] ギャラリー</h1></div>
</div>
<table class="ptt" style="margin:2px auto 0px"><tr>{pager}</tr></table>
<div id="gdt">{thumbs}<div class="c"></div></div>
<table class="ptb" style="margin:1px auto 2px"><tr>{pager}</tr></table>
</body></html>"#,
        pager = pager,
        thumbs = thumbs
    )
}

/// 图片详情页，`original` 为原图的跳转地址
pub fn image_html(preview: &str, original: Option<&str>) -> String {
    let original = original
        .map(|url| {
            format!(
                r#"<img src="https://site.example/img/mr.gif" /> <a href="{}">Download original 2400 x 3400 1.52 MB source</a>"#,
                escape(url)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html><body>
<div id="i1" class="sni">
  <h1>001.jpg</h1>
  <div id="i3"><a href="https://site.example/s/0000000002/123456-2"><img id="img" src="{}" style="height:1414px;width:1000px" /></a></div>
  <div id="i7" class="if">{}</div>
</div>
</body></html>"#,
        escape(preview),
        original
    )
}

/// 首页，`limit` 为图片配额
pub fn home_html(limit: Option<(u32, u32)>) -> String {
    let body = match limit {
        Some((current, max)) => format!(
            "<p>You are currently at <strong>{}</strong> towards a limit of <strong>{}</strong>.</p>",
            current, max
        ),
        None => "<p>Image limits are not available.</p>".to_owned(),
    };
    format!(
        r#"<!DOCTYPE html><html><body><div class="stuffbox"><div class="homebox">{}</div></div></body></html>"#,
        body
    )
}
