//! Resource resolver
//!
//! Turns a caller-supplied identifier, which may be either an opaque id or a
//! human-readable name, into the provider's current snapshot. An exact id
//! match always wins; a name shared by several resources is an error rather
//! than a guess.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{AttachedServer, BlockStorage, Datacenter, Server, SharedStorage, SshKey};
use crate::traits::CloudProvider;

/// Anything the resolver can match an identifier against
pub trait Candidate {
    fn candidate_id(&self) -> &str;

    fn matches_name(&self, identifier: &str) -> bool;
}

macro_rules! named_candidate {
    ($($ty:ty),*) => {
        $(
            impl Candidate for $ty {
                fn candidate_id(&self) -> &str {
                    &self.id
                }

                fn matches_name(&self, identifier: &str) -> bool {
                    self.name == identifier
                }
            }
        )*
    };
}

named_candidate!(BlockStorage, SharedStorage, SshKey, Server, AttachedServer);

// Datacenters have no name; callers use the country code instead
impl Candidate for Datacenter {
    fn candidate_id(&self) -> &str {
        &self.id
    }

    fn matches_name(&self, identifier: &str) -> bool {
        self.country_code.eq_ignore_ascii_case(identifier)
    }
}

/// Pick the single candidate matching `identifier`
///
/// Returns `Ok(None)` when nothing matches and `Error::Ambiguous` when the
/// identifier is not an id and more than one candidate carries it as a name.
pub fn select<T: Candidate>(candidates: Vec<T>, identifier: &str, kind: &str) -> Result<Option<T>> {
    let mut by_name = Vec::new();

    for candidate in candidates {
        if candidate.candidate_id() == identifier {
            return Ok(Some(candidate));
        }
        if candidate.matches_name(identifier) {
            by_name.push(candidate);
        }
    }

    match by_name.len() {
        0 => Ok(None),
        1 => Ok(by_name.pop()),
        n => Err(Error::ambiguous(format!(
            "{} resources of kind {} are named '{}'; use the id instead",
            n, kind, identifier
        ))),
    }
}

/// Looks resources up through a provider
pub struct Resolver<'a> {
    provider: &'a dyn CloudProvider,
}

impl<'a> Resolver<'a> {
    pub fn new(provider: &'a dyn CloudProvider) -> Self {
        Self { provider }
    }

    pub async fn block_storage(&self, identifier: &str) -> Result<Option<BlockStorage>> {
        debug!("Resolving block storage '{}'", identifier);
        let all = self.provider.list_block_storages().await?;
        select(all, identifier, "block_storage")
    }

    pub async fn shared_storage(&self, identifier: &str) -> Result<Option<SharedStorage>> {
        debug!("Resolving shared storage '{}'", identifier);
        let all = self.provider.list_shared_storages().await?;
        select(all, identifier, "shared_storage")
    }

    pub async fn ssh_key(&self, identifier: &str) -> Result<Option<SshKey>> {
        debug!("Resolving SSH key '{}'", identifier);
        let all = self.provider.list_ssh_keys().await?;
        select(all, identifier, "ssh_key")
    }

    pub async fn server(&self, identifier: &str) -> Result<Option<Server>> {
        debug!("Resolving server '{}'", identifier);
        let all = self.provider.list_servers().await?;
        select(all, identifier, "server")
    }

    /// Resolve a datacenter by id or two-letter country code
    pub async fn datacenter(&self, identifier: &str) -> Result<Option<Datacenter>> {
        debug!("Resolving datacenter '{}'", identifier);
        let all = self.provider.list_datacenters().await?;
        select(all, identifier, "datacenter")
    }

    /// Find a server among those attached to a shared storage
    pub async fn shared_storage_server(
        &self,
        shared_storage_id: &str,
        identifier: &str,
    ) -> Result<Option<AttachedServer>> {
        let attached = self
            .provider
            .list_shared_storage_servers(shared_storage_id)
            .await?;
        select(attached, identifier, "server")
    }

    /// Like [`Resolver::server`], but a missing server is an error
    pub async fn require_server(&self, identifier: &str) -> Result<Server> {
        self.server(identifier)
            .await?
            .ok_or_else(|| Error::not_found(format!("Server {} not found.", identifier)))
    }

    /// Like [`Resolver::datacenter`], but a missing datacenter is an error
    pub async fn require_datacenter(&self, identifier: &str) -> Result<Datacenter> {
        self.datacenter(identifier)
            .await?
            .ok_or_else(|| Error::not_found(format!("Datacenter {} not found.", identifier)))
    }
}
