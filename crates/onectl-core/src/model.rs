//! Resource snapshots as returned by the provider
//!
//! The provider owns these objects; onectl only ever holds a transient view.
//! Fields the reconciler does not look at are kept in `extra` so the
//! snapshot printed back to the caller is the provider's full response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of resource a reconciler manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    BlockStorage,
    SharedStorage,
    SshKey,
    Server,
    Datacenter,
}

impl ResourceKind {
    /// Key under which a snapshot of this kind is reported
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::BlockStorage => "block_storage",
            ResourceKind::SharedStorage => "shared_storage",
            ResourceKind::SshKey => "ssh_key",
            ResourceKind::Server => "server",
            ResourceKind::Datacenter => "datacenter",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse lifecycle state reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Still being provisioned or changed
    Transitional(String),
    /// Usable
    Ready(String),
    /// Provisioning failed
    Failed,
    /// Anything the provider documents that we do not recognise
    Unknown(String),
}

impl ResourceState {
    /// Classify a provider status string (case-insensitive)
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CONFIGURING" | "DEPLOYING" | "CREATING" | "REMOVING" => Self::Transitional(upper),
            "ACTIVE" | "ENABLED" | "POWERED_ON" => Self::Ready(upper),
            "FAILED" => Self::Failed,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Transitional(_))
    }
}

/// Common view over every resource snapshot
pub trait Resource: Clone + Send + Sync + Serialize {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Raw status string, if the resource reports one
    fn state(&self) -> Option<&str>;
}

/// Datacenter reference embedded in storage snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Server reference embedded in storage and SSH key snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedServer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Access rights, only present on shared storage attachments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rights: Option<Rights>,
}

/// Shared storage access rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rights {
    #[serde(rename = "R")]
    Read,
    #[serde(rename = "RW")]
    ReadWrite,
}

impl std::str::FromStr for Rights {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "R" => Ok(Rights::Read),
            "RW" => Ok(Rights::ReadWrite),
            other => Err(crate::Error::validation(format!(
                "Invalid rights '{}': expected R or RW",
                other
            ))),
        }
    }
}

/// A server and the rights it should get on a shared storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAccess {
    pub id: String,
    pub rights: Rights,
}

impl ServerAccess {
    pub fn new(id: impl Into<String>, rights: Rights) -> Self {
        Self {
            id: id.into(),
            rights,
        }
    }
}

/// Block storage snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStorage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub datacenter: Option<DatacenterRef>,
    /// A block storage is attached to at most one server
    #[serde(default)]
    pub server: Option<AttachedServer>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared storage snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedStorage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub size_used: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub datacenter: Option<DatacenterRef>,
    #[serde(default)]
    pub servers: Vec<AttachedServer>,
    #[serde(default)]
    pub cifs_path: Option<String>,
    #[serde(default)]
    pub nfs_path: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// SSH key snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub servers: Vec<AttachedServer>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server status block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub state: String,
}

/// Server snapshot, only used to resolve attach targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<ServerStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Datacenter snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: String,
    pub country_code: String,
    #[serde(default)]
    pub location: Option<String>,
}

macro_rules! impl_resource {
    ($ty:ty, $kind:expr, |$s:ident| $state:expr) => {
        impl Resource for $ty {
            const KIND: ResourceKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn state(&self) -> Option<&str> {
                let $s = self;
                $state
            }
        }
    };
}

impl_resource!(BlockStorage, ResourceKind::BlockStorage, |s| s.state.as_deref());
impl_resource!(SharedStorage, ResourceKind::SharedStorage, |s| s.state.as_deref());
impl_resource!(SshKey, ResourceKind::SshKey, |s| s.state.as_deref());
impl_resource!(Server, ResourceKind::Server, |s| s
    .status
    .as_ref()
    .map(|status| status.state.as_str()));
