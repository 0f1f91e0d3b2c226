//! Shared storage reconciliation

use tracing::{debug, info};

use super::{Action, Outcome, Reconciler, UpdateRun, diff};
use crate::config::{DesiredState, SharedStorageParams, WaitPolicy};
use crate::error::{Error, Result};
use crate::model::{ServerAccess, SharedStorage};
use crate::traits::{CreateSharedStorage, ModifySharedStorage};

impl Reconciler<'_> {
    /// Bring a shared storage to the state requested by `params`
    pub async fn reconcile_shared_storage(
        &self,
        params: &SharedStorageParams,
    ) -> Result<Outcome<SharedStorage>> {
        params.validate()?;
        let wait = params.wait.policy()?;

        match params.state {
            DesiredState::Present => self.ensure_shared_storage(params, &wait).await,
            DesiredState::Absent => self.remove_shared_storage(params).await,
            DesiredState::Update => self.update_shared_storage(params, &wait).await,
        }
    }

    async fn ensure_shared_storage(
        &self,
        params: &SharedStorageParams,
        wait: &WaitPolicy,
    ) -> Result<Outcome<SharedStorage>> {
        let name = params.name.as_deref().unwrap_or_default();
        let size = params.size.ok_or_else(|| {
            Error::validation("size parameter is required for a new shared storage.")
        })?;
        let resolver = self.resolver();

        if let Some(existing) = resolver.shared_storage(name).await? {
            debug!("Shared storage {} already exists as {}", name, existing.id);
            return Ok(Outcome::unchanged(Some(existing), self.dry_run));
        }

        let datacenter_id = match params.datacenter_id.as_deref() {
            Some(dc) => Some(resolver.require_datacenter(dc).await?.id),
            None => None,
        };
        let request = CreateSharedStorage {
            name: name.to_string(),
            description: params.description.clone(),
            size,
            datacenter_id,
        };

        if self.dry_run {
            info!("[DRY-RUN] Would create shared storage {} ({} GB)", name, size);
            return Ok(Outcome::planned(None, vec![Action::Create]));
        }

        info!("Creating shared storage {} ({} GB)", name, size);
        let created = self.provider.create_shared_storage(&request).await?;
        let id = created.id.clone();
        let provider = self.provider;
        let ready = self
            .wait_if(wait, created, || provider.get_shared_storage(&id))
            .await?;

        Ok(Outcome::applied(ready, vec![Action::Create]))
    }

    async fn remove_shared_storage(
        &self,
        params: &SharedStorageParams,
    ) -> Result<Outcome<SharedStorage>> {
        let identifier = params.name.as_deref().unwrap_or_default();

        let Some(existing) = self.resolver().shared_storage(identifier).await? else {
            debug!("Shared storage {} not found, nothing to delete", identifier);
            return Ok(Outcome::unchanged(None, self.dry_run));
        };

        if self.dry_run {
            info!("[DRY-RUN] Would delete shared storage {}", existing.id);
            return Ok(Outcome::planned(Some(existing), vec![Action::Delete]));
        }

        info!("Deleting shared storage {} ({})", existing.name, existing.id);
        let deleted = self.provider.delete_shared_storage(&existing.id).await?;
        Ok(Outcome::applied(deleted, vec![Action::Delete]))
    }

    async fn update_shared_storage(
        &self,
        params: &SharedStorageParams,
        wait: &WaitPolicy,
    ) -> Result<Outcome<SharedStorage>> {
        let identifier = params.shared_storage.as_deref().unwrap_or_default();
        let resolver = self.resolver();

        let current = resolver
            .shared_storage(identifier)
            .await?
            .ok_or_else(|| Error::not_found(format!("Shared storage {} not found.", identifier)))?;

        let modify = ModifySharedStorage {
            name: diff(params.name.as_ref(), Some(&current.name)),
            description: diff(params.description.as_ref(), current.description.as_ref()),
            size: diff(params.size.as_ref(), current.size.as_ref()),
        };

        // Servers given by name are resolved to ids; ones already attached
        // with the same rights are left out of the attach call.
        let mut to_attach = Vec::new();
        if params.attach {
            for wanted in &params.servers {
                let server = resolver.require_server(&wanted.id).await?;
                let already = current
                    .servers
                    .iter()
                    .any(|s| s.id == server.id && s.rights == Some(wanted.rights));
                if !already {
                    to_attach.push(ServerAccess::new(server.id, wanted.rights));
                }
            }
        }

        let detach_id = if params.detach {
            let server_ident = params.server_id.as_deref().unwrap_or_default();
            resolver
                .shared_storage_server(&current.id, server_ident)
                .await?
                .map(|s| s.id)
        } else {
            None
        };

        let mut plan = Vec::new();
        if !modify.is_empty() {
            plan.push(Action::Modify);
        }
        if params.password.is_some() {
            plan.push(Action::ChangePassword);
        }
        if !to_attach.is_empty() {
            plan.push(Action::Attach);
        }
        if detach_id.is_some() {
            plan.push(Action::Detach);
        }

        if plan.is_empty() {
            debug!("Shared storage {} already up to date", current.id);
            return Ok(Outcome::unchanged(Some(current), self.dry_run));
        }

        if self.dry_run {
            info!("[DRY-RUN] Would apply {:?} to shared storage {}", plan, current.id);
            return Ok(Outcome::planned(Some(current), plan));
        }

        let id = current.id.clone();
        let mut run = UpdateRun::new(&id);
        let mut latest = current;

        if !modify.is_empty() {
            info!("Modifying shared storage {}", id);
            latest = run
                .step(Action::Modify, self.provider.modify_shared_storage(&id, &modify))
                .await?;
        }

        if let Some(password) = params.password.as_deref() {
            info!("Changing shared storage access password");
            run.step(
                Action::ChangePassword,
                self.provider.change_shared_storage_password(password),
            )
            .await?;
        }

        if !to_attach.is_empty() {
            info!("Attaching {} server(s) to shared storage {}", to_attach.len(), id);
            latest = run
                .step(
                    Action::Attach,
                    self.provider.attach_shared_storage_servers(&id, &to_attach),
                )
                .await?;
        }

        if let Some(server_id) = detach_id {
            info!("Detaching server {} from shared storage {}", server_id, id);
            latest = run
                .step(
                    Action::Detach,
                    self.provider.detach_shared_storage_server(&id, &server_id),
                )
                .await?;
        }

        let provider = self.provider;
        let ready = self
            .wait_if(wait, latest, || provider.get_shared_storage(&id))
            .await?;

        Ok(Outcome::applied(ready, run.applied))
    }
}
