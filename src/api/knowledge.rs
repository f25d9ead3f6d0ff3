//! 知识库接口

use serde_json::Value;

use crate::api::{ApiError, CreateKnowledgeRequest, DevinClient, KnowledgeList, UpdateKnowledgeRequest};

impl DevinClient {
    pub async fn list_knowledge(&self) -> Result<KnowledgeList, ApiError> {
        Ok(KnowledgeList::from_value(self.get("knowledge", &[]).await?, "knowledge"))
    }

    /// 返回服务端原始响应（通常包含新条目的 id）
    pub async fn create_knowledge(&self, request: &CreateKnowledgeRequest) -> Result<Value, ApiError> {
        self.post("knowledge", request).await
    }

    pub async fn update_knowledge(
        &self,
        knowledge_id: &str,
        request: &UpdateKnowledgeRequest,
    ) -> Result<Value, ApiError> {
        self.put(&format!("knowledge/{knowledge_id}"), request).await
    }

    pub async fn delete_knowledge(&self, knowledge_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("knowledge/{knowledge_id}")).await?;
        Ok(())
    }
}
