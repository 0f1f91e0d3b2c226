// # SSH Key API

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::model::SshKey;

/// Payload for creating an SSH key
///
/// When `public_key` is omitted the provider generates a key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSshKey {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Payload for renaming or re-describing an SSH key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModifySshKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModifySshKey {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// SSH key operations offered by a provider
#[async_trait]
pub trait SshKeyApi: Send + Sync {
    async fn list_ssh_keys(&self) -> Result<Vec<SshKey>>;

    async fn get_ssh_key(&self, id: &str) -> Result<SshKey>;

    async fn create_ssh_key(&self, request: &CreateSshKey) -> Result<SshKey>;

    async fn modify_ssh_key(&self, id: &str, request: &ModifySshKey) -> Result<SshKey>;

    async fn delete_ssh_key(&self, id: &str) -> Result<SshKey>;
}
