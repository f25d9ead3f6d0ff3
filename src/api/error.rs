//! API 错误分类
//!
//! 将 HTTP 状态码与传输层失败映射为一组有限的错误类型；上层（轮询、链式执行、命令层）只做透传，不做重试。

use thiserror::Error;

/// 远程 API 调用可能出现的错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// 本地没有可用的 API Token，请求未发出
    #[error("API token not found. Run 'devin configure' to set your API token.")]
    MissingToken,

    #[error("Invalid or expired API token (401). Run 'devin configure'.")]
    Unauthorized,

    #[error("Insufficient permissions (403).")]
    Forbidden,

    #[error("Resource not found (404).")]
    NotFound,

    #[error("Rate limit exceeded (429). Please try again later.")]
    RateLimited,

    #[error("Server error ({status}).")]
    Server { status: u16 },

    /// 其它非 2xx 状态
    #[error("HTTP Error {status}: {body}")]
    Http { status: u16, body: String },

    /// 连接失败、超时等传输层错误
    #[error("Network error: {0}")]
    Network(String),

    /// 响应体无法解析为期望的结构
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// 按状态码分类；仅对非 2xx 调用
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            429 => ApiError::RateLimited,
            s if s >= 500 => ApiError::Server { status: s },
            s => ApiError::Http {
                status: s,
                body: body.into(),
            },
        }
    }

    /// 对应的 HTTP 状态码（本地错误与网络错误返回 None）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::Server { status } | ApiError::Http { status, .. } => Some(*status),
            ApiError::MissingToken
            | ApiError::Network(_)
            | ApiError::Decode(_)
            | ApiError::Io(_) => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ApiError::from_status(status.as_u16(), e.to_string()),
            None if e.is_decode() => ApiError::Decode(e.to_string()),
            None => ApiError::Network(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
