//! Core traits for onectl
//!
//! These are the seams between the reconciler and a concrete cloud API.
//!
//! - [`BlockStorageApi`], [`SharedStorageApi`], [`SshKeyApi`]: per-kind calls
//! - [`Directory`]: server and datacenter lookups
//! - [`CloudProvider`]: everything above, as one injectable client

pub mod block_storage;
pub mod provider;
pub mod shared_storage;
pub mod ssh_key;

pub use block_storage::{BlockStorageApi, CreateBlockStorage, ModifyBlockStorage};
pub use provider::{CloudProvider, CloudProviderFactory, Directory};
pub use shared_storage::{CreateSharedStorage, ModifySharedStorage, SharedStorageApi};
pub use ssh_key::{CreateSshKey, ModifySshKey, SshKeyApi};
