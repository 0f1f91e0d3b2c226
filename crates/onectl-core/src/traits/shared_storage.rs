// # Shared Storage API
//
// Provider calls for shared storages. Unlike block storages a shared storage
// can be attached to many servers at once, each with its own access rights.

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::model::{AttachedServer, ServerAccess, SharedStorage};

/// Payload for creating a shared storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSharedStorage {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter_id: Option<String>,
}

/// Payload for modifying a shared storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModifySharedStorage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl ModifySharedStorage {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.size.is_none()
    }
}

/// Shared storage operations offered by a provider
#[async_trait]
pub trait SharedStorageApi: Send + Sync {
    async fn list_shared_storages(&self) -> Result<Vec<SharedStorage>>;

    async fn get_shared_storage(&self, id: &str) -> Result<SharedStorage>;

    async fn create_shared_storage(&self, request: &CreateSharedStorage) -> Result<SharedStorage>;

    async fn modify_shared_storage(
        &self,
        id: &str,
        request: &ModifySharedStorage,
    ) -> Result<SharedStorage>;

    async fn delete_shared_storage(&self, id: &str) -> Result<SharedStorage>;

    /// Servers currently attached to the shared storage
    async fn list_shared_storage_servers(&self, id: &str) -> Result<Vec<AttachedServer>>;

    /// Attach the given servers in one call
    async fn attach_shared_storage_servers(
        &self,
        id: &str,
        servers: &[ServerAccess],
    ) -> Result<SharedStorage>;

    async fn detach_shared_storage_server(
        &self,
        id: &str,
        server_id: &str,
    ) -> Result<SharedStorage>;

    /// Change the account-wide password used to mount shared storages
    async fn change_shared_storage_password(&self, password: &str) -> Result<()>;
}
