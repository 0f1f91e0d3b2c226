// # onectl-core
//
// Core library for reconciling 1&1 IaaS storage and SSH key resources.
//
// ## Architecture Overview
//
// This library provides the provider-independent half of onectl:
// - **CloudProvider**: Trait bundle for the block storage, shared storage,
//   SSH key and lookup calls a cloud API must offer
// - **Resolver**: Finds a resource by id or name, rejecting ambiguous names
// - **Reconciler**: Turns desired state into provider calls, honoring dry-run
// - **waiter**: Polls a resource until it leaves its transitional state
// - **ProviderRegistry**: Plugin-based registry for cloud providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic never speaks HTTP
// 2. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: Every reconciliation re-reads the provider before acting

pub mod config;
pub mod error;
pub mod model;
pub mod reconciler;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{
    BlockStorageParams, DesiredState, ProviderConfig, SharedStorageParams, SshKeyParams,
    WaitOptions, WaitPolicy,
};
pub use error::{Error, Result};
pub use model::{
    BlockStorage, Datacenter, Resource, ResourceKind, ResourceState, Rights, Server,
    ServerAccess, SharedStorage, SshKey,
};
pub use reconciler::{Action, Outcome, Reconciler, Resolver};
pub use registry::ProviderRegistry;
pub use traits::{CloudProvider, CloudProviderFactory};
