//! 命令层错误
//!
//! 在 ApiError 之上补充本地校验、用户中断、等待超时等情况；命令层统一转为错误提示与非零退出码。

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum CliError {
    /// 本地输入不合法（缺少 prompt、文件不存在、工作流为空等）
    #[error("{0}")]
    Validation(String),

    #[error("No active session. Create one with create-session or use use-session.")]
    NoActiveSession,

    /// 用户中断（仅在调用方提供取消令牌时出现）
    #[error("Interrupted while waiting for session {session_id}")]
    Interrupted { session_id: String },

    #[error("Timed out waiting for session {session_id} (last status: {status})")]
    TimedOut { session_id: String, status: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Config error: {0}")]
    Config(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Settings(#[from] config::ConfigError),
}

impl CliError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CliError::Validation(msg.into())
    }

    /// 根因是否为 401（命令层据此追加 `devin configure` 提示）
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CliError::Api(ApiError::Unauthorized))
    }
}
