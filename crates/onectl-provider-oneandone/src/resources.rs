// Trait implementations: one CloudPanel request per method.

use async_trait::async_trait;
use onectl_core::Result;
use onectl_core::model::{
    AttachedServer, BlockStorage, Datacenter, Server, ServerAccess, SharedStorage, SshKey,
};
use onectl_core::traits::{
    BlockStorageApi, CreateBlockStorage, CreateSharedStorage, CreateSshKey, Directory,
    ModifyBlockStorage, ModifySharedStorage, ModifySshKey, SharedStorageApi, SshKeyApi,
};
use reqwest::Method;
use serde_json::{Value, json};

use crate::OneandoneProvider;

#[async_trait]
impl BlockStorageApi for OneandoneProvider {
    async fn list_block_storages(&self) -> Result<Vec<BlockStorage>> {
        self.list("/block_storages").await
    }

    async fn get_block_storage(&self, id: &str) -> Result<BlockStorage> {
        self.get(&format!("/block_storages/{}", id)).await
    }

    async fn create_block_storage(&self, request: &CreateBlockStorage) -> Result<BlockStorage> {
        tracing::info!("Creating block storage {} ({} GB)", request.name, request.size);
        self.send_json(Method::POST, "/block_storages", request).await
    }

    async fn modify_block_storage(
        &self,
        id: &str,
        request: &ModifyBlockStorage,
    ) -> Result<BlockStorage> {
        self.send_json(Method::PUT, &format!("/block_storages/{}", id), request)
            .await
    }

    async fn delete_block_storage(&self, id: &str) -> Result<BlockStorage> {
        self.delete(&format!("/block_storages/{}", id)).await
    }

    async fn attach_block_storage(&self, id: &str, server_id: &str) -> Result<BlockStorage> {
        self.send_json(
            Method::POST,
            &format!("/block_storages/{}/server", id),
            &json!({ "server": server_id }),
        )
        .await
    }

    async fn detach_block_storage(&self, id: &str) -> Result<BlockStorage> {
        self.delete(&format!("/block_storages/{}/server", id)).await
    }
}

#[async_trait]
impl SharedStorageApi for OneandoneProvider {
    async fn list_shared_storages(&self) -> Result<Vec<SharedStorage>> {
        self.list("/shared_storages").await
    }

    async fn get_shared_storage(&self, id: &str) -> Result<SharedStorage> {
        self.get(&format!("/shared_storages/{}", id)).await
    }

    async fn create_shared_storage(&self, request: &CreateSharedStorage) -> Result<SharedStorage> {
        tracing::info!("Creating shared storage {} ({} GB)", request.name, request.size);
        self.send_json(Method::POST, "/shared_storages", request).await
    }

    async fn modify_shared_storage(
        &self,
        id: &str,
        request: &ModifySharedStorage,
    ) -> Result<SharedStorage> {
        self.send_json(Method::PUT, &format!("/shared_storages/{}", id), request)
            .await
    }

    async fn delete_shared_storage(&self, id: &str) -> Result<SharedStorage> {
        self.delete(&format!("/shared_storages/{}", id)).await
    }

    async fn list_shared_storage_servers(&self, id: &str) -> Result<Vec<AttachedServer>> {
        self.get(&format!("/shared_storages/{}/servers", id)).await
    }

    async fn attach_shared_storage_servers(
        &self,
        id: &str,
        servers: &[ServerAccess],
    ) -> Result<SharedStorage> {
        self.send_json(
            Method::POST,
            &format!("/shared_storages/{}/servers", id),
            &json!({ "servers": servers }),
        )
        .await
    }

    async fn detach_shared_storage_server(
        &self,
        id: &str,
        server_id: &str,
    ) -> Result<SharedStorage> {
        self.delete(&format!("/shared_storages/{}/servers/{}", id, server_id))
            .await
    }

    async fn change_shared_storage_password(&self, password: &str) -> Result<()> {
        // Response echoes the access settings; nothing in it is needed
        let _: Value = self
            .send_json(
                Method::PUT,
                "/shared_storages/access",
                &json!({ "password": password }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SshKeyApi for OneandoneProvider {
    async fn list_ssh_keys(&self) -> Result<Vec<SshKey>> {
        self.list("/ssh_keys").await
    }

    async fn get_ssh_key(&self, id: &str) -> Result<SshKey> {
        self.get(&format!("/ssh_keys/{}", id)).await
    }

    async fn create_ssh_key(&self, request: &CreateSshKey) -> Result<SshKey> {
        tracing::info!("Creating SSH key {}", request.name);
        self.send_json(Method::POST, "/ssh_keys", request).await
    }

    async fn modify_ssh_key(&self, id: &str, request: &ModifySshKey) -> Result<SshKey> {
        self.send_json(Method::PUT, &format!("/ssh_keys/{}", id), request)
            .await
    }

    async fn delete_ssh_key(&self, id: &str) -> Result<SshKey> {
        self.delete(&format!("/ssh_keys/{}", id)).await
    }
}

#[async_trait]
impl Directory for OneandoneProvider {
    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.list("/servers").await
    }

    async fn list_datacenters(&self) -> Result<Vec<Datacenter>> {
        self.list("/datacenters").await
    }
}
