//! SSH key reconciliation
//!
//! Keys are targeted by `ssh_key_id` (an id or a name) for `update` and
//! `absent`. An explicit `ssh_key_id` that matches nothing is an error;
//! deleting by `name` alone is a no-op when the key does not exist.

use tracing::{debug, info};

use super::{Action, Outcome, Reconciler, diff};
use crate::config::{DesiredState, SshKeyParams, WaitPolicy};
use crate::error::{Error, Result};
use crate::model::SshKey;
use crate::traits::{CreateSshKey, ModifySshKey};

impl Reconciler<'_> {
    /// Bring an SSH key to the state requested by `params`
    pub async fn reconcile_ssh_key(&self, params: &SshKeyParams) -> Result<Outcome<SshKey>> {
        params.validate()?;
        let wait = params.wait.policy()?;

        match params.state {
            DesiredState::Present => self.ensure_ssh_key(params, &wait).await,
            DesiredState::Absent => self.remove_ssh_key(params).await,
            DesiredState::Update => self.update_ssh_key(params, &wait).await,
        }
    }

    async fn ensure_ssh_key(
        &self,
        params: &SshKeyParams,
        wait: &WaitPolicy,
    ) -> Result<Outcome<SshKey>> {
        let name = params.name.as_deref().unwrap_or_default();

        if let Some(existing) = self.resolver().ssh_key(name).await? {
            debug!("SSH key {} already exists as {}", name, existing.id);
            return Ok(Outcome::unchanged(Some(existing), self.dry_run));
        }

        if self.dry_run {
            info!("[DRY-RUN] Would create SSH key {}", name);
            return Ok(Outcome::planned(None, vec![Action::Create]));
        }

        let request = CreateSshKey {
            name: name.to_string(),
            description: params.description.clone(),
            public_key: params.public_key.clone(),
        };

        info!("Creating SSH key {}", name);
        let created = self.provider.create_ssh_key(&request).await?;
        let id = created.id.clone();
        let provider = self.provider;
        let ready = self
            .wait_if(wait, created, || provider.get_ssh_key(&id))
            .await?;

        Ok(Outcome::applied(ready, vec![Action::Create]))
    }

    async fn remove_ssh_key(&self, params: &SshKeyParams) -> Result<Outcome<SshKey>> {
        let explicit_id = params
            .ssh_key_id
            .as_deref()
            .filter(|key_id| !key_id.trim().is_empty());
        let existing = match explicit_id {
            Some(key_id) => Some(self.require_ssh_key(key_id).await?),
            None => {
                let name = params.name.as_deref().unwrap_or_default();
                self.resolver().ssh_key(name).await?
            }
        };

        let Some(existing) = existing else {
            debug!("SSH key not found, nothing to delete");
            return Ok(Outcome::unchanged(None, self.dry_run));
        };

        if self.dry_run {
            info!("[DRY-RUN] Would delete SSH key {}", existing.id);
            return Ok(Outcome::planned(Some(existing), vec![Action::Delete]));
        }

        info!("Deleting SSH key {} ({})", existing.name, existing.id);
        let deleted = self.provider.delete_ssh_key(&existing.id).await?;
        Ok(Outcome::applied(deleted, vec![Action::Delete]))
    }

    async fn update_ssh_key(
        &self,
        params: &SshKeyParams,
        wait: &WaitPolicy,
    ) -> Result<Outcome<SshKey>> {
        let key_id = params.ssh_key_id.as_deref().unwrap_or_default();
        let current = self.require_ssh_key(key_id).await?;

        let modify = ModifySshKey {
            name: diff(params.name.as_ref(), Some(&current.name)),
            description: diff(params.description.as_ref(), current.description.as_ref()),
        };

        if modify.is_empty() {
            debug!("SSH key {} already up to date", current.id);
            return Ok(Outcome::unchanged(Some(current), self.dry_run));
        }

        if self.dry_run {
            info!("[DRY-RUN] Would modify SSH key {}", current.id);
            return Ok(Outcome::planned(Some(current), vec![Action::Modify]));
        }

        info!("Modifying SSH key {}", current.id);
        let modified = self.provider.modify_ssh_key(&current.id, &modify).await?;
        let id = modified.id.clone();
        let provider = self.provider;
        let ready = self
            .wait_if(wait, modified, || provider.get_ssh_key(&id))
            .await?;

        Ok(Outcome::applied(ready, vec![Action::Modify]))
    }

    async fn require_ssh_key(&self, identifier: &str) -> Result<SshKey> {
        self.resolver()
            .ssh_key(identifier)
            .await?
            .ok_or_else(|| Error::not_found(format!("SSH key {} not found.", identifier)))
    }
}
