use crate::api::client::decode;
use crate::api::{ApiError, DevinClient, Listing, Secret};

impl DevinClient {
    pub async fn list_secrets(&self) -> Result<Listing<Secret>, ApiError> {
        decode(self.get("secrets", &[]).await?)
    }

    pub async fn delete_secret(&self, secret_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("secrets/{secret_id}")).await?;
        Ok(())
    }
}
