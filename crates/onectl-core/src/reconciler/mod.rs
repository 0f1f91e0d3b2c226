//! Resource reconciler
//!
//! The reconciler turns a validated parameter set into the provider calls
//! that bring one resource to the requested state.
//!
//! ## Flow
//!
//! ```text
//!  params ──validate──▶ Resolver ──current snapshot──▶ dispatcher
//!                                                        │
//!                        dry-run? ◀──would change?───────┤
//!                                                        ▼
//!                                                  CloudProvider
//!                                                        │
//!                                        wait? ──▶ waiter::wait_for
//!                                                        │
//!                                                        ▼
//!                                               Outcome { changed, resource }
//! ```
//!
//! ## Dry-run
//!
//! In check mode every decision point still resolves the current state
//! (read-only calls are made) but records the action it would take instead
//! of calling the provider. Later decision points are evaluated against the
//! *current* snapshot, not a simulated post-mutation one.
//!
//! ## Partial updates
//!
//! An `update` runs its sub-actions in a fixed order. There is no rollback:
//! if a later sub-action fails after earlier ones took effect, the error is
//! [`Error::PartialUpdate`] and lists what was already applied.

mod block_storage;
pub mod resolver;
mod shared_storage;
mod ssh_key;
pub mod waiter;

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use tracing::warn;

use crate::config::WaitPolicy;
use crate::error::{Error, Result};
use crate::model::Resource;
use crate::traits::CloudProvider;

pub use resolver::Resolver;

/// A single provider mutation the reconciler can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Modify,
    ChangePassword,
    Attach,
    Detach,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Create => "create",
            Action::Modify => "modify",
            Action::ChangePassword => "change_password",
            Action::Attach => "attach",
            Action::Detach => "detach",
            Action::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<R> {
    /// Whether the resource was (or, in check mode, would be) changed
    pub changed: bool,
    /// Latest snapshot, if the resource exists
    pub resource: Option<R>,
    /// Actions taken, or planned in check mode
    pub actions: Vec<Action>,
    /// True when the reconciler ran in check mode
    pub check_mode: bool,
}

impl<R: Resource> Outcome<R> {
    fn unchanged(resource: Option<R>, check_mode: bool) -> Self {
        Self {
            changed: false,
            resource,
            actions: Vec::new(),
            check_mode,
        }
    }

    fn applied(resource: R, actions: Vec<Action>) -> Self {
        Self {
            changed: !actions.is_empty(),
            resource: Some(resource),
            actions,
            check_mode: false,
        }
    }

    fn planned(resource: Option<R>, actions: Vec<Action>) -> Self {
        Self {
            changed: !actions.is_empty(),
            resource,
            actions,
            check_mode: true,
        }
    }

    /// Render as `{"changed": .., "<kind>": {..}, "actions": [..]}`
    pub fn to_json(&self) -> Result<Value> {
        let mut out = Map::new();
        out.insert("changed".to_string(), Value::Bool(self.changed));
        let resource = match &self.resource {
            Some(resource) => serde_json::to_value(resource)?,
            None => Value::Null,
        };
        out.insert(R::KIND.as_str().to_string(), resource);
        out.insert("actions".to_string(), serde_json::to_value(&self.actions)?);
        if self.check_mode {
            out.insert("check_mode".to_string(), Value::Bool(true));
        }
        Ok(Value::Object(out))
    }
}

/// Reconciles resources through one injected provider
///
/// One reconciler is built per invocation. It holds no state of its own
/// between calls: every call re-reads the provider.
pub struct Reconciler<'a> {
    provider: &'a dyn CloudProvider,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: client every call goes through
    /// - `dry_run`: when true, no mutating provider method is ever called
    pub fn new(provider: &'a dyn CloudProvider, dry_run: bool) -> Self {
        Self { provider, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.provider)
    }

    fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    async fn wait_if<R, F, Fut>(&self, policy: &WaitPolicy, resource: R, fetch: F) -> Result<R>
    where
        R: Resource,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        if !policy.enabled() {
            return Ok(resource);
        }
        let id = resource.id().to_string();
        waiter::wait_for(self.provider_name(), &id, policy, fetch).await
    }
}

/// Bookkeeping for the sub-actions of one `update`
struct UpdateRun {
    target: String,
    applied: Vec<Action>,
}

impl UpdateRun {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            applied: Vec::new(),
        }
    }

    /// Run one sub-action, recording it on success
    async fn step<T, Fut>(&mut self, action: Action, call: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match call.await {
            Ok(value) => {
                self.applied.push(action);
                Ok(value)
            }
            Err(e) => Err(self.fail(action, e)),
        }
    }

    /// Wrap a failure so the caller learns what already took effect
    fn fail(&self, action: Action, error: Error) -> Error {
        if self.applied.is_empty() {
            return error;
        }
        warn!(
            "Update of {} stopped at {} after applying {:?}",
            self.target, action, self.applied
        );
        Error::PartialUpdate {
            resource: self.target.clone(),
            applied: self.applied.iter().map(ToString::to_string).collect(),
            failed: action.to_string(),
            source: Box::new(error),
        }
    }
}

/// `desired`, but only when it is given and differs from `current`
fn diff<T: PartialEq + Clone>(desired: Option<&T>, current: Option<&T>) -> Option<T> {
    match desired {
        Some(value) if current != Some(value) => Some(value.clone()),
        _ => None,
    }
}
