use crate::ehentai::GalleryIdentity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// 请求超时
    #[error("请求超时: {0}")]
    Timeout(String),

    /// 其他网络错误
    #[error("请求失败: {url}: {message}")]
    Transport { url: String, message: String },

    /// 页面返回了非 2xx 的状态码
    #[error("状态码 {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("不是合法的画廊地址: {0}")]
    MalformedUrl(String),

    /// 找不到翻页组件，或者当前页无法解析
    #[error("找不到翻页组件")]
    MissingPager,

    #[error("页面解析失败: {0}")]
    Markup(String),

    #[error("画廊页不能为空")]
    EmptyGallery,

    #[error("画廊页不属于同一个画廊: {0} 与 {1}")]
    IdentityMismatch(GalleryIdentity, GalleryIdentity),

    /// 图片详情页既没有预览图也没有原图
    #[error("找不到图片: {0}")]
    MissingImage(String),

    #[error("重定向解析失败: {url} (状态码 {status})")]
    RedirectResolutionFailed { url: String, status: u16 },

    /// 重试次数耗尽后仍然缺少的请求
    #[error("{attempts} 轮请求后仍有 {} 个地址失败: {keys:?}", .keys.len())]
    Unresolved { attempts: u32, keys: Vec<String> },
}

impl Error {
    /// 网络层面的失败，可以在下一轮重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::Transport { .. } | Error::Status { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
