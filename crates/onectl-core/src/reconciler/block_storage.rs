//! Block storage reconciliation

use tracing::{debug, info};

use super::{Action, Outcome, Reconciler, UpdateRun, diff};
use crate::config::{BlockStorageParams, DesiredState, WaitPolicy};
use crate::error::{Error, Result};
use crate::model::BlockStorage;
use crate::traits::{CreateBlockStorage, ModifyBlockStorage};

impl Reconciler<'_> {
    /// Bring a block storage to the state requested by `params`
    pub async fn reconcile_block_storage(
        &self,
        params: &BlockStorageParams,
    ) -> Result<Outcome<BlockStorage>> {
        params.validate()?;
        let wait = params.wait.policy()?;

        match params.state {
            DesiredState::Present => self.ensure_block_storage(params, &wait).await,
            DesiredState::Absent => self.remove_block_storage(params).await,
            DesiredState::Update => self.update_block_storage(params, &wait).await,
        }
    }

    async fn ensure_block_storage(
        &self,
        params: &BlockStorageParams,
        wait: &WaitPolicy,
    ) -> Result<Outcome<BlockStorage>> {
        let name = params.name.as_deref().unwrap_or_default();
        let size = params
            .size
            .ok_or_else(|| Error::validation("size parameter is required for a new block storage."))?;
        let resolver = self.resolver();

        if let Some(existing) = resolver.block_storage(name).await? {
            debug!("Block storage {} already exists as {}", name, existing.id);
            return Ok(Outcome::unchanged(Some(existing), self.dry_run));
        }

        let mut request = CreateBlockStorage::new(name, size);
        request.description = params.description.clone();
        if let Some(dc) = params.datacenter_id.as_deref() {
            request.datacenter_id = Some(resolver.require_datacenter(dc).await?.id);
        }
        if let Some(server) = params.server_id.as_deref() {
            request.server_id = Some(resolver.require_server(server).await?.id);
        }

        if self.dry_run {
            info!("[DRY-RUN] Would create block storage {} ({} GB)", name, size);
            return Ok(Outcome::planned(None, vec![Action::Create]));
        }

        info!("Creating block storage {} ({} GB)", name, size);
        let created = self.provider.create_block_storage(&request).await?;
        let id = created.id.clone();
        let provider = self.provider;
        let ready = self
            .wait_if(wait, created, || provider.get_block_storage(&id))
            .await?;

        Ok(Outcome::applied(ready, vec![Action::Create]))
    }

    async fn remove_block_storage(
        &self,
        params: &BlockStorageParams,
    ) -> Result<Outcome<BlockStorage>> {
        let identifier = params.name.as_deref().unwrap_or_default();

        let Some(existing) = self.resolver().block_storage(identifier).await? else {
            debug!("Block storage {} not found, nothing to delete", identifier);
            return Ok(Outcome::unchanged(None, self.dry_run));
        };

        if self.dry_run {
            info!("[DRY-RUN] Would delete block storage {}", existing.id);
            return Ok(Outcome::planned(Some(existing), vec![Action::Delete]));
        }

        info!("Deleting block storage {} ({})", existing.name, existing.id);
        let deleted = self.provider.delete_block_storage(&existing.id).await?;
        Ok(Outcome::applied(deleted, vec![Action::Delete]))
    }

    async fn update_block_storage(
        &self,
        params: &BlockStorageParams,
        wait: &WaitPolicy,
    ) -> Result<Outcome<BlockStorage>> {
        let identifier = params.block_storage.as_deref().unwrap_or_default();
        let resolver = self.resolver();

        let current = resolver
            .block_storage(identifier)
            .await?
            .ok_or_else(|| Error::not_found(format!("Block storage {} not found.", identifier)))?;

        let modify = ModifyBlockStorage {
            name: diff(params.name.as_ref(), Some(&current.name)),
            description: diff(params.description.as_ref(), current.description.as_ref()),
        };

        let attach_to = if params.attach {
            let server_ident = params.server_id.as_deref().unwrap_or_default();
            let server = resolver.require_server(server_ident).await?;
            let attached_here = current.server.as_ref().is_some_and(|s| s.id == server.id);
            (!attached_here).then_some(server.id)
        } else {
            None
        };

        let detach = params.detach && current.server.is_some();

        let mut plan = Vec::new();
        if !modify.is_empty() {
            plan.push(Action::Modify);
        }
        if attach_to.is_some() {
            plan.push(Action::Attach);
        }
        if detach {
            plan.push(Action::Detach);
        }

        if plan.is_empty() {
            debug!("Block storage {} already up to date", current.id);
            return Ok(Outcome::unchanged(Some(current), self.dry_run));
        }

        if self.dry_run {
            info!("[DRY-RUN] Would apply {:?} to block storage {}", plan, current.id);
            return Ok(Outcome::planned(Some(current), plan));
        }

        let id = current.id.clone();
        let mut run = UpdateRun::new(&id);
        let mut latest = current;

        if !modify.is_empty() {
            info!("Modifying block storage {}", id);
            latest = run
                .step(Action::Modify, self.provider.modify_block_storage(&id, &modify))
                .await?;
        }

        if let Some(server_id) = attach_to {
            info!("Attaching block storage {} to server {}", id, server_id);
            latest = run
                .step(Action::Attach, self.provider.attach_block_storage(&id, &server_id))
                .await?;
        }

        if detach {
            info!("Detaching block storage {}", id);
            latest = run
                .step(Action::Detach, self.provider.detach_block_storage(&id))
                .await?;
        }

        let provider = self.provider;
        let ready = self
            .wait_if(wait, latest, || provider.get_block_storage(&id))
            .await?;

        Ok(Outcome::applied(ready, run.applied))
    }
}
