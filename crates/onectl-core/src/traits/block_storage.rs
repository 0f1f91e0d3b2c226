// # Block Storage API
//
// Provider calls for block storages. Every method is a single remote call;
// the reconciler decides which of them to issue and in what order.
//
// ## Usage
//
// ```rust,ignore
// use onectl_core::traits::{BlockStorageApi, CreateBlockStorage};
//
// let request = CreateBlockStorage::new("data", 40).with_datacenter("DC1");
// let storage = provider.create_block_storage(&request).await?;
// provider.attach_block_storage(&storage.id, "SERVER_ID").await?;
// ```

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::model::BlockStorage;

/// Payload for creating a block storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateBlockStorage {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter_id: Option<String>,
    /// Server to attach the new block storage to
    #[serde(rename = "server", skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
}

impl CreateBlockStorage {
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            size,
            datacenter_id: None,
            server_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_datacenter(mut self, datacenter_id: impl Into<String>) -> Self {
        self.datacenter_id = Some(datacenter_id.into());
        self
    }

    pub fn with_server(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }
}

/// Payload for renaming or re-describing a block storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModifyBlockStorage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModifyBlockStorage {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Block storage operations offered by a provider
#[async_trait]
pub trait BlockStorageApi: Send + Sync {
    /// List every block storage visible to the account
    async fn list_block_storages(&self) -> Result<Vec<BlockStorage>>;

    /// Fetch one block storage by id
    async fn get_block_storage(&self, id: &str) -> Result<BlockStorage>;

    async fn create_block_storage(&self, request: &CreateBlockStorage) -> Result<BlockStorage>;

    async fn modify_block_storage(
        &self,
        id: &str,
        request: &ModifyBlockStorage,
    ) -> Result<BlockStorage>;

    /// Delete a block storage, returning the provider's last view of it
    async fn delete_block_storage(&self, id: &str) -> Result<BlockStorage>;

    async fn attach_block_storage(&self, id: &str, server_id: &str) -> Result<BlockStorage>;

    /// Detach from whatever server the block storage is attached to
    async fn detach_block_storage(&self, id: &str) -> Result<BlockStorage>;
}
