//! 脚本化的会话 API（用于测试，无需网络）
//!
//! 按顺序消费预置的 get_session 结果；脚本耗尽后返回 finished。所有调用记录在 calls 中，便于断言顺序。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{
    ApiError, CreateSessionRequest, CreateSessionResponse, Session, SessionApi, SessionStatus,
};

/// 一次被记录的调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Get {
        session_id: String,
        status: Option<String>,
    },
    Create {
        prompt: String,
        playbook_id: Option<String>,
    },
    Send {
        session_id: String,
        message: String,
    },
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Result<String, ApiError>>,
    calls: Vec<ApiCall>,
    created: usize,
    fail_create: Option<ApiError>,
    fail_send: Option<ApiError>,
}

/// Mock 实现：状态脚本 + 调用日志
#[derive(Debug, Default)]
pub struct MockSessionApi {
    state: Mutex<MockState>,
}

impl MockSessionApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次追加 get_session 返回的状态
    pub fn with_statuses<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut st) = self.state.lock() {
            st.script.extend(statuses.into_iter().map(|s| Ok(s.into())));
        }
        self
    }

    /// 追加一次失败的 get_session
    pub fn with_fetch_error(self, err: ApiError) -> Self {
        if let Ok(mut st) = self.state.lock() {
            st.script.push_back(Err(err));
        }
        self
    }

    pub fn with_create_error(self, err: ApiError) -> Self {
        if let Ok(mut st) = self.state.lock() {
            st.fail_create = Some(err);
        }
        self
    }

    pub fn with_send_error(self, err: ApiError) -> Self {
        if let Ok(mut st) = self.state.lock() {
            st.fail_send = Some(err);
        }
        self
    }

    /// 到目前为止的调用记录
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().map(|st| st.calls.clone()).unwrap_or_default()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::Get { .. }))
            .count()
    }
}

fn poisoned() -> ApiError {
    ApiError::Network("mock state poisoned".to_string())
}

#[async_trait]
impl SessionApi for MockSessionApi {
    async fn get_session(&self, session_id: &str) -> Result<Session, ApiError> {
        let mut st = self.state.lock().map_err(|_| poisoned())?;
        let next = st
            .script
            .pop_front()
            .unwrap_or_else(|| Ok("finished".to_string()));
        let status = next.as_ref().ok().cloned();
        st.calls.push(ApiCall::Get {
            session_id: session_id.to_string(),
            status: status.clone(),
        });
        let status = next?;
        Ok(Session {
            session_id: session_id.to_string(),
            status: Some(SessionStatus::from(status)),
            url: Some(format!("https://app.devin.ai/sessions/{session_id}")),
            ..Default::default()
        })
    }

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, ApiError> {
        let mut st = self.state.lock().map_err(|_| poisoned())?;
        st.calls.push(ApiCall::Create {
            prompt: request.prompt.clone(),
            playbook_id: request.playbook_id.clone(),
        });
        if let Some(err) = st.fail_create.take() {
            return Err(err);
        }
        st.created += 1;
        let session_id = format!("devin-mock-{}", st.created);
        Ok(CreateSessionResponse {
            url: Some(format!("https://app.devin.ai/sessions/{session_id}")),
            session_id,
            is_new_session: Some(true),
        })
    }

    async fn send_message(&self, session_id: &str, message: &str) -> Result<(), ApiError> {
        let mut st = self.state.lock().map_err(|_| poisoned())?;
        st.calls.push(ApiCall::Send {
            session_id: session_id.to_string(),
            message: message.to_string(),
        });
        match st.fail_send.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
