//! 团队 Playbook 接口

use serde_json::Value;

use crate::api::client::decode;
use crate::api::{ApiError, DevinClient, Listing, Playbook, PlaybookRequest};

impl DevinClient {
    pub async fn list_playbooks(&self) -> Result<Listing<Playbook>, ApiError> {
        decode(self.get("playbooks", &[]).await?)
    }

    pub async fn get_playbook(&self, playbook_id: &str) -> Result<Playbook, ApiError> {
        decode(self.get(&format!("playbooks/{playbook_id}"), &[]).await?)
    }

    pub async fn create_playbook(
        &self,
        title: &str,
        body: &str,
        macro_name: Option<String>,
    ) -> Result<Value, ApiError> {
        let request = PlaybookRequest {
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            macro_name,
        };
        self.post("playbooks", &request).await
    }

    /// 只发送给出的字段
    pub async fn update_playbook(
        &self,
        playbook_id: &str,
        request: &PlaybookRequest,
    ) -> Result<Value, ApiError> {
        self.put(&format!("playbooks/{playbook_id}"), request).await
    }

    pub async fn delete_playbook(&self, playbook_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("playbooks/{playbook_id}")).await?;
        Ok(())
    }
}
