use serde::Serialize;

/// 配额用完后，预览图会被替换成这张图片
pub const QUOTA_EXCEEDED_IMAGE: &str = "/img/509.gif";

/// 画廊的图片详情页
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDetail {
    /// 标题
    pub title: Option<String>,
    /// 预览图地址
    pub preview_src: Option<String>,
    /// 原图的跳转地址
    pub redirect_url: Option<String>,
}

impl ImageDetail {
    pub fn has_original(&self) -> bool {
        self.redirect_url.is_some()
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.preview_src
            .as_deref()
            .map_or(false, |src| src.ends_with(QUOTA_EXCEEDED_IMAGE))
    }
}

/// 图片配额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageLimit {
    pub current: u32,
    pub max: u32,
}

impl ImageLimit {
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }
}
