//! 会话接口：列表、创建、查询、发消息、打标签、终止

use async_trait::async_trait;
use serde_json::json;

use crate::api::client::decode;
use crate::api::{
    ApiError, CreateSessionRequest, CreateSessionResponse, DevinClient, Session, SessionApi,
    SessionList,
};

impl DevinClient {
    /// GET sessions；tags 以重复的 query 参数发送，响应结构不符时保留原文
    pub async fn list_sessions(
        &self,
        limit: u32,
        offset: u32,
        tags: &[String],
    ) -> Result<SessionList, ApiError> {
        let mut query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        query.extend(tags.iter().map(|t| ("tags", t.clone())));
        Ok(SessionList::from_value(self.get("sessions", &query).await?, "sessions"))
    }

    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, ApiError> {
        decode(self.post("sessions", request).await?)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, ApiError> {
        decode(self.get(&format!("sessions/{session_id}"), &[]).await?)
    }

    pub async fn send_message(&self, session_id: &str, message: &str) -> Result<(), ApiError> {
        self.post(
            &format!("sessions/{session_id}/message"),
            &json!({ "message": message }),
        )
        .await?;
        Ok(())
    }

    /// 覆盖式设置标签
    pub async fn update_session_tags(
        &self,
        session_id: &str,
        tags: &[String],
    ) -> Result<(), ApiError> {
        self.put(&format!("sessions/{session_id}/tags"), &json!({ "tags": tags }))
            .await?;
        Ok(())
    }

    pub async fn terminate_session(&self, session_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("sessions/{session_id}")).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionApi for DevinClient {
    async fn get_session(&self, session_id: &str) -> Result<Session, ApiError> {
        DevinClient::get_session(self, session_id).await
    }

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, ApiError> {
        DevinClient::create_session(self, request).await
    }

    async fn send_message(&self, session_id: &str, message: &str) -> Result<(), ApiError> {
        DevinClient::send_message(self, session_id, message).await
    }
}
