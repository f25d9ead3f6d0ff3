//! 会话 API 抽象
//!
//! 轮询器与链式执行器只依赖这三个操作；DevinClient 是线上实现，测试中用脚本化的 Mock 替代。

use async_trait::async_trait;

use crate::api::{ApiError, CreateSessionRequest, CreateSessionResponse, Session};

/// 核心流程需要的远程会话能力
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// 拉取会话当前状态
    async fn get_session(&self, session_id: &str) -> Result<Session, ApiError>;

    /// 创建新会话
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, ApiError>;

    /// 向会话发送一条消息
    async fn send_message(&self, session_id: &str, message: &str) -> Result<(), ApiError>;
}
