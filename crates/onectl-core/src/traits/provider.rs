// # Cloud Provider Trait
//
// Bundles the per-kind APIs into the single client a reconciler is handed.
//
// ## Implementations
//
// - 1&1 CloudPanel: `onectl-provider-oneandone` crate
// - Tests: recording in-memory providers under `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use onectl_core::{CloudProvider, Reconciler};
//
// let provider: Box<dyn CloudProvider> = registry.create_provider(&config)?;
// let reconciler = Reconciler::new(provider.as_ref(), false);
// let outcome = reconciler.reconcile_ssh_key(&params).await?;
// ```

use async_trait::async_trait;

use super::{BlockStorageApi, SharedStorageApi, SshKeyApi};
use crate::Result;
use crate::model::{Datacenter, Server};

/// Read-only lookups used to resolve attach targets and locations
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_servers(&self) -> Result<Vec<Server>>;

    async fn list_datacenters(&self) -> Result<Vec<Datacenter>>;
}

/// A complete provider client
///
/// # Trust Level: Untrusted
///
/// Providers translate one method call into one API request and nothing more.
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (waiting is owned by the reconciler's waiter)
/// - ❌ Decide whether a call is needed (owned by the reconciler)
/// - ❌ Honour dry-run themselves (the reconciler never calls a mutating
///   method in check mode)
/// - ❌ Cache anything beyond a single request
///
/// A provider that fails returns `Error::Remote` with the API's message
/// unchanged so the caller sees exactly what the provider said.
pub trait CloudProvider: BlockStorageApi + SharedStorageApi + SshKeyApi + Directory {
    /// Static name for logging (e.g., "oneandone")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing providers from configuration
pub trait CloudProviderFactory: Send + Sync {
    /// Create a provider from its configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn CloudProvider>>;
}
