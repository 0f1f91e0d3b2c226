//! Test doubles and common utilities for reconciler contract tests
//!
//! [`MockCloud`] is an in-memory provider that records every call it
//! receives. Contract tests seed it, run a reconciler against it, then assert
//! on the recorded calls and the resulting in-memory state.

#![allow(dead_code)]

use onectl_core::config::WaitOptions;
use onectl_core::error::{Error, Result};
use onectl_core::model::{
    AttachedServer, BlockStorage, Datacenter, ResourceState, Server, ServerAccess, SharedStorage,
    SshKey,
};
use onectl_core::traits::{
    BlockStorageApi, CloudProvider, CreateBlockStorage, CreateSharedStorage, CreateSshKey,
    Directory, ModifyBlockStorage, ModifySharedStorage, ModifySshKey, SharedStorageApi, SshKeyApi,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider methods that change remote state
pub const MUTATING_CALLS: &[&str] = &[
    "create_block_storage",
    "modify_block_storage",
    "delete_block_storage",
    "attach_block_storage",
    "detach_block_storage",
    "create_shared_storage",
    "modify_shared_storage",
    "delete_shared_storage",
    "attach_shared_storage_servers",
    "detach_shared_storage_server",
    "change_shared_storage_password",
    "create_ssh_key",
    "modify_ssh_key",
    "delete_ssh_key",
];

/// A recording in-memory provider
pub struct MockCloud {
    block_storages: Mutex<Vec<BlockStorage>>,
    shared_storages: Mutex<Vec<SharedStorage>>,
    ssh_keys: Mutex<Vec<SshKey>>,
    servers: Mutex<Vec<Server>>,
    datacenters: Mutex<Vec<Datacenter>>,
    /// Method names in call order
    calls: Mutex<Vec<String>>,
    /// Method name -> error message to fail with
    failures: Mutex<HashMap<String, String>>,
    /// Servers passed to the last shared storage attach call
    last_attach: Mutex<Vec<ServerAccess>>,
    password: Mutex<Option<String>>,
    /// State given to newly created resources
    create_state: Mutex<String>,
    /// Polls left before a transitional resource turns ACTIVE (None = never)
    ready_after: Mutex<Option<usize>>,
    next_id: AtomicUsize,
}

impl MockCloud {
    pub fn new() -> Self {
        Self {
            block_storages: Mutex::new(Vec::new()),
            shared_storages: Mutex::new(Vec::new()),
            ssh_keys: Mutex::new(Vec::new()),
            servers: Mutex::new(Vec::new()),
            datacenters: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            last_attach: Mutex::new(Vec::new()),
            password: Mutex::new(None),
            create_state: Mutex::new("ACTIVE".to_string()),
            ready_after: Mutex::new(None),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn seed_block_storage(&self, storage: BlockStorage) {
        self.block_storages.lock().unwrap().push(storage);
    }

    pub fn seed_shared_storage(&self, storage: SharedStorage) {
        self.shared_storages.lock().unwrap().push(storage);
    }

    pub fn seed_ssh_key(&self, key: SshKey) {
        self.ssh_keys.lock().unwrap().push(key);
    }

    pub fn seed_server(&self, id: &str, name: &str) {
        self.servers.lock().unwrap().push(server(id, name));
    }

    pub fn seed_datacenter(&self, id: &str, country_code: &str) {
        self.datacenters.lock().unwrap().push(Datacenter {
            id: id.to_string(),
            country_code: country_code.to_string(),
            location: None,
        });
    }

    /// Make `method` fail with a remote error carrying `message`
    pub fn fail_on(&self, method: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method.to_string(), message.to_string());
    }

    /// Newly created resources start in `state`
    pub fn create_in_state(&self, state: &str) {
        *self.create_state.lock().unwrap() = state.to_string();
    }

    /// Transitional resources turn ACTIVE on the `polls`-th fetch
    pub fn ready_after(&self, polls: usize) {
        *self.ready_after.lock().unwrap() = Some(polls);
    }

    /// Every call received, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls to `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == method).count()
    }

    /// Calls that would have changed remote state
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| MUTATING_CALLS.contains(&c.as_str()))
            .collect()
    }

    pub fn last_attach(&self) -> Vec<ServerAccess> {
        self.last_attach.lock().unwrap().clone()
    }

    pub fn password(&self) -> Option<String> {
        self.password.lock().unwrap().clone()
    }

    pub fn block_storages(&self) -> Vec<BlockStorage> {
        self.block_storages.lock().unwrap().clone()
    }

    pub fn shared_storages(&self) -> Vec<SharedStorage> {
        self.shared_storages.lock().unwrap().clone()
    }

    pub fn ssh_keys(&self) -> Vec<SshKey> {
        self.ssh_keys.lock().unwrap().clone()
    }

    fn record(&self, method: &str) -> Result<()> {
        self.calls.lock().unwrap().push(method.to_string());
        match self.failures.lock().unwrap().get(method) {
            Some(message) => Err(Error::remote("mock", message.clone())),
            None => Ok(()),
        }
    }

    fn new_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn initial_state(&self) -> String {
        self.create_state.lock().unwrap().clone()
    }

    /// Advance a transitional state by one poll
    fn tick(&self, state: &mut Option<String>) {
        let transitional = state
            .as_deref()
            .is_some_and(|s| ResourceState::parse(s).is_transitional());
        if !transitional {
            return;
        }
        let mut left = self.ready_after.lock().unwrap();
        if let Some(n) = left.as_mut() {
            *n = n.saturating_sub(1);
            if *n == 0 {
                *state = Some("ACTIVE".to_string());
            }
        }
    }

    fn server_name(&self, id: &str) -> String {
        self.servers
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl BlockStorageApi for MockCloud {
    async fn list_block_storages(&self) -> Result<Vec<BlockStorage>> {
        self.record("list_block_storages")?;
        Ok(self.block_storages())
    }

    async fn get_block_storage(&self, id: &str) -> Result<BlockStorage> {
        self.record("get_block_storage")?;
        let mut all = self.block_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("block storage {}", id)))?;
        self.tick(&mut storage.state);
        Ok(storage.clone())
    }

    async fn create_block_storage(&self, request: &CreateBlockStorage) -> Result<BlockStorage> {
        self.record("create_block_storage")?;
        let mut storage = block_storage(&self.new_id("BS"), &request.name, request.size);
        storage.description = request.description.clone();
        storage.state = Some(self.initial_state());
        storage.server = request.server_id.as_ref().map(|id| AttachedServer {
            id: id.clone(),
            name: self.server_name(id),
            rights: None,
        });
        self.block_storages.lock().unwrap().push(storage.clone());
        Ok(storage)
    }

    async fn modify_block_storage(
        &self,
        id: &str,
        request: &ModifyBlockStorage,
    ) -> Result<BlockStorage> {
        self.record("modify_block_storage")?;
        let mut all = self.block_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("block storage {}", id)))?;
        if let Some(name) = &request.name {
            storage.name = name.clone();
        }
        if let Some(description) = &request.description {
            storage.description = Some(description.clone());
        }
        Ok(storage.clone())
    }

    async fn delete_block_storage(&self, id: &str) -> Result<BlockStorage> {
        self.record("delete_block_storage")?;
        let mut all = self.block_storages.lock().unwrap();
        let index = all
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("block storage {}", id)))?;
        Ok(all.remove(index))
    }

    async fn attach_block_storage(&self, id: &str, server_id: &str) -> Result<BlockStorage> {
        self.record("attach_block_storage")?;
        let name = self.server_name(server_id);
        let mut all = self.block_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("block storage {}", id)))?;
        storage.server = Some(AttachedServer {
            id: server_id.to_string(),
            name,
            rights: None,
        });
        Ok(storage.clone())
    }

    async fn detach_block_storage(&self, id: &str) -> Result<BlockStorage> {
        self.record("detach_block_storage")?;
        let mut all = self.block_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("block storage {}", id)))?;
        storage.server = None;
        Ok(storage.clone())
    }
}

#[async_trait::async_trait]
impl SharedStorageApi for MockCloud {
    async fn list_shared_storages(&self) -> Result<Vec<SharedStorage>> {
        self.record("list_shared_storages")?;
        Ok(self.shared_storages())
    }

    async fn get_shared_storage(&self, id: &str) -> Result<SharedStorage> {
        self.record("get_shared_storage")?;
        let mut all = self.shared_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("shared storage {}", id)))?;
        self.tick(&mut storage.state);
        Ok(storage.clone())
    }

    async fn create_shared_storage(&self, request: &CreateSharedStorage) -> Result<SharedStorage> {
        self.record("create_shared_storage")?;
        let mut storage = shared_storage(&self.new_id("SS"), &request.name, request.size);
        storage.description = request.description.clone();
        storage.state = Some(self.initial_state());
        self.shared_storages.lock().unwrap().push(storage.clone());
        Ok(storage)
    }

    async fn modify_shared_storage(
        &self,
        id: &str,
        request: &ModifySharedStorage,
    ) -> Result<SharedStorage> {
        self.record("modify_shared_storage")?;
        let mut all = self.shared_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("shared storage {}", id)))?;
        if let Some(name) = &request.name {
            storage.name = name.clone();
        }
        if let Some(description) = &request.description {
            storage.description = Some(description.clone());
        }
        if let Some(size) = request.size {
            storage.size = Some(size);
        }
        Ok(storage.clone())
    }

    async fn delete_shared_storage(&self, id: &str) -> Result<SharedStorage> {
        self.record("delete_shared_storage")?;
        let mut all = self.shared_storages.lock().unwrap();
        let index = all
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("shared storage {}", id)))?;
        Ok(all.remove(index))
    }

    async fn list_shared_storage_servers(&self, id: &str) -> Result<Vec<AttachedServer>> {
        self.record("list_shared_storage_servers")?;
        let all = self.shared_storages.lock().unwrap();
        let storage = all
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("shared storage {}", id)))?;
        Ok(storage.servers.clone())
    }

    async fn attach_shared_storage_servers(
        &self,
        id: &str,
        servers: &[ServerAccess],
    ) -> Result<SharedStorage> {
        self.record("attach_shared_storage_servers")?;
        *self.last_attach.lock().unwrap() = servers.to_vec();
        let names: Vec<String> = servers.iter().map(|s| self.server_name(&s.id)).collect();
        let mut all = self.shared_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("shared storage {}", id)))?;
        for (access, name) in servers.iter().zip(names) {
            storage.servers.retain(|s| s.id != access.id);
            storage.servers.push(AttachedServer {
                id: access.id.clone(),
                name,
                rights: Some(access.rights),
            });
        }
        Ok(storage.clone())
    }

    async fn detach_shared_storage_server(
        &self,
        id: &str,
        server_id: &str,
    ) -> Result<SharedStorage> {
        self.record("detach_shared_storage_server")?;
        let mut all = self.shared_storages.lock().unwrap();
        let storage = all
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found(format!("shared storage {}", id)))?;
        storage.servers.retain(|s| s.id != server_id);
        Ok(storage.clone())
    }

    async fn change_shared_storage_password(&self, password: &str) -> Result<()> {
        self.record("change_shared_storage_password")?;
        *self.password.lock().unwrap() = Some(password.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl SshKeyApi for MockCloud {
    async fn list_ssh_keys(&self) -> Result<Vec<SshKey>> {
        self.record("list_ssh_keys")?;
        Ok(self.ssh_keys())
    }

    async fn get_ssh_key(&self, id: &str) -> Result<SshKey> {
        self.record("get_ssh_key")?;
        let mut all = self.ssh_keys.lock().unwrap();
        let key = all
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| Error::not_found(format!("ssh key {}", id)))?;
        self.tick(&mut key.state);
        Ok(key.clone())
    }

    async fn create_ssh_key(&self, request: &CreateSshKey) -> Result<SshKey> {
        self.record("create_ssh_key")?;
        let mut key = ssh_key(&self.new_id("KEY"), &request.name);
        key.description = request.description.clone();
        key.public_key = request.public_key.clone();
        key.state = Some(self.initial_state());
        self.ssh_keys.lock().unwrap().push(key.clone());
        Ok(key)
    }

    async fn modify_ssh_key(&self, id: &str, request: &ModifySshKey) -> Result<SshKey> {
        self.record("modify_ssh_key")?;
        let mut all = self.ssh_keys.lock().unwrap();
        let key = all
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| Error::not_found(format!("ssh key {}", id)))?;
        if let Some(name) = &request.name {
            key.name = name.clone();
        }
        if let Some(description) = &request.description {
            key.description = Some(description.clone());
        }
        Ok(key.clone())
    }

    async fn delete_ssh_key(&self, id: &str) -> Result<SshKey> {
        self.record("delete_ssh_key")?;
        let mut all = self.ssh_keys.lock().unwrap();
        let index = all
            .iter()
            .position(|k| k.id == id)
            .ok_or_else(|| Error::not_found(format!("ssh key {}", id)))?;
        Ok(all.remove(index))
    }
}

#[async_trait::async_trait]
impl Directory for MockCloud {
    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.record("list_servers")?;
        Ok(self.servers.lock().unwrap().clone())
    }

    async fn list_datacenters(&self) -> Result<Vec<Datacenter>> {
        self.record("list_datacenters")?;
        Ok(self.datacenters.lock().unwrap().clone())
    }
}

impl CloudProvider for MockCloud {
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An ACTIVE block storage snapshot
pub fn block_storage(id: &str, name: &str, size: u32) -> BlockStorage {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "size": size,
        "state": "ACTIVE",
    }))
    .unwrap()
}

/// An ACTIVE shared storage snapshot with no servers attached
pub fn shared_storage(id: &str, name: &str, size: u32) -> SharedStorage {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "size": size,
        "state": "ACTIVE",
    }))
    .unwrap()
}

/// An ACTIVE SSH key snapshot
pub fn ssh_key(id: &str, name: &str) -> SshKey {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "state": "ACTIVE",
    }))
    .unwrap()
}

pub fn server(id: &str, name: &str) -> Server {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "status": { "state": "POWERED_ON" },
    }))
    .unwrap()
}

/// Wait options that skip waiting entirely
pub fn no_wait() -> WaitOptions {
    WaitOptions {
        wait: false,
        ..WaitOptions::default()
    }
}

/// Wait options with one-second polling
///
/// Meant for `#[tokio::test(start_paused = true)]`, where the sleeps
/// advance the paused clock instead of wall time.
pub fn quick_wait(timeout_secs: u64) -> WaitOptions {
    WaitOptions {
        wait: true,
        wait_timeout: timeout_secs,
        wait_interval: 1,
    }
}
