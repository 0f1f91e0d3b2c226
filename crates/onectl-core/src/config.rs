//! Configuration and parameter types for onectl
//!
//! Parameters arrive untyped (CLI flags, environment, a JSON params file) and
//! are validated once here, before the reconciler makes any remote call.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::ServerAccess;

/// Environment variable holding the API token
pub const AUTH_TOKEN_ENV: &str = "ONEANDONE_AUTH_TOKEN";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "ONEANDONE_API_URL";

/// Name limit shared by every resource kind
pub const MAX_NAME_LEN: usize = 128;

/// Description limit shared by every resource kind
pub const MAX_DESCRIPTION_LEN: usize = 256;

/// Provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// 1&1 CloudPanel REST API
    Oneandone {
        /// API token
        auth_token: String,
        /// Base URL override (defaults to the public endpoint)
        #[serde(default)]
        api_url: Option<String>,
    },
}

// Hand-written so the token never ends up in logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Oneandone { api_url, .. } => f
                .debug_struct("Oneandone")
                .field("auth_token", &"<REDACTED>")
                .field("api_url", api_url)
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Build a 1&1 configuration, falling back to the environment for
    /// anything not given explicitly
    pub fn oneandone_from_env(auth_token: Option<String>, api_url: Option<String>) -> Self {
        let auth_token = auth_token
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(AUTH_TOKEN_ENV).ok())
            .unwrap_or_default();
        let api_url = api_url
            .filter(|u| !u.is_empty())
            .or_else(|| std::env::var(API_URL_ENV).ok().filter(|u| !u.is_empty()));

        ProviderConfig::Oneandone {
            auth_token,
            api_url,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Oneandone {
                auth_token,
                api_url,
            } => {
                if auth_token.is_empty() {
                    return Err(Error::config(format!(
                        "auth_token parameter is required (or set {})",
                        AUTH_TOKEN_ENV
                    )));
                }
                if let Some(url) = api_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(Error::config(format!(
                        "api_url must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Oneandone { .. } => "oneandone",
        }
    }
}

/// Target condition requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// Create if missing, otherwise leave alone
    #[default]
    Present,
    /// Delete if present, otherwise leave alone
    Absent,
    /// Mutate, attach or detach an existing resource
    Update,
}

impl std::str::FromStr for DesiredState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "present" => Ok(DesiredState::Present),
            "absent" => Ok(DesiredState::Absent),
            "update" => Ok(DesiredState::Update),
            other => Err(Error::validation(format!(
                "state '{}' is not valid. Valid states: present, absent, update",
                other
            ))),
        }
    }
}

/// How long to wait for a resource to finish provisioning
///
/// Built through [`WaitPolicy::new`], which rejects an interval longer than
/// the timeout: such a policy could never observe a second poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    enabled: bool,
    timeout: Duration,
    interval: Duration,
}

impl WaitPolicy {
    /// Create a validated wait policy
    pub fn new(enabled: bool, timeout: Duration, interval: Duration) -> Result<Self> {
        if enabled {
            if interval.is_zero() {
                return Err(Error::validation("wait_interval must be > 0"));
            }
            if interval > timeout {
                return Err(Error::validation(format!(
                    "wait_interval ({}s) must not exceed wait_timeout ({}s)",
                    interval.as_secs_f64(),
                    timeout.as_secs_f64()
                )));
            }
        }

        Ok(Self {
            enabled,
            timeout,
            interval,
        })
    }

    /// A policy that never waits
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            timeout: Duration::from_secs(default_wait_timeout()),
            interval: Duration::from_secs(default_wait_interval()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(default_wait_timeout()),
            interval: Duration::from_secs(default_wait_interval()),
        }
    }
}

/// Wait parameters as they appear in a parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Wait for the resource to become ready
    #[serde(default = "default_wait")]
    pub wait: bool,

    /// Give up after this many seconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: u64,

    /// Seconds between status polls
    #[serde(default = "default_wait_interval")]
    pub wait_interval: u64,
}

impl WaitOptions {
    pub fn policy(&self) -> Result<WaitPolicy> {
        WaitPolicy::new(
            self.wait,
            Duration::from_secs(self.wait_timeout),
            Duration::from_secs(self.wait_interval),
        )
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            wait: default_wait(),
            wait_timeout: default_wait_timeout(),
            wait_interval: default_wait_interval(),
        }
    }
}

fn default_wait() -> bool {
    true
}

fn default_wait_timeout() -> u64 {
    600
}

fn default_wait_interval() -> u64 {
    5
}

/// Parameters for the block storage reconciler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStorageParams {
    #[serde(default)]
    pub state: DesiredState,

    /// New name for `present`/`update`; id or name of the target for `absent`
    #[serde(default)]
    pub name: Option<String>,

    /// Id or name of the block storage to update
    #[serde(default)]
    pub block_storage: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Size in GB: 20–500, multiple of 10
    #[serde(default)]
    pub size: Option<u32>,

    /// Datacenter id or country code
    #[serde(default)]
    pub datacenter_id: Option<String>,

    /// Server id or name to attach to
    #[serde(default)]
    pub server_id: Option<String>,

    #[serde(default)]
    pub attach: bool,

    #[serde(default)]
    pub detach: bool,

    #[serde(flatten)]
    pub wait: WaitOptions,
}

impl BlockStorageParams {
    /// Validate the parameter set for its state
    pub fn validate(&self) -> Result<()> {
        check_attach_detach(self.attach, self.detach)?;
        if self.attach && is_blank(&self.server_id) {
            return Err(Error::validation(
                "'server_id' is required when 'attach' is set",
            ));
        }
        check_text_limits(self.name.as_deref(), self.description.as_deref())?;
        if let Some(size) = self.size {
            check_size("block storage", size, 20, 500, 10)?;
        }

        match self.state {
            DesiredState::Absent => {
                require(&self.name, "'name' parameter is required to delete a block storage.")?
            }
            DesiredState::Update => {
                require(
                    &self.block_storage,
                    "'block_storage' parameter is required to update a block storage.",
                )?;
                if self.size.is_some() {
                    return Err(Error::validation(
                        "size cannot be changed on a block storage.",
                    ));
                }
            }
            DesiredState::Present => {
                require(&self.name, "name parameter is required for a new block storage.")?;
                if self.size.is_none() {
                    return Err(Error::validation(
                        "size parameter is required for a new block storage.",
                    ));
                }
            }
        }

        self.wait.policy().map(|_| ())
    }
}

/// Parameters for the shared storage reconciler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedStorageParams {
    #[serde(default)]
    pub state: DesiredState,

    #[serde(default)]
    pub name: Option<String>,

    /// Id or name of the shared storage to update
    #[serde(default)]
    pub shared_storage: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Size in GB: 50–2000, multiple of 50
    #[serde(default)]
    pub size: Option<u32>,

    #[serde(default)]
    pub datacenter_id: Option<String>,

    /// Servers to attach, with their access rights
    #[serde(default)]
    pub servers: Vec<ServerAccess>,

    /// Server id or name to detach
    #[serde(default)]
    pub server_id: Option<String>,

    /// New account-wide access password
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub attach: bool,

    #[serde(default)]
    pub detach: bool,

    #[serde(flatten)]
    pub wait: WaitOptions,
}

impl SharedStorageParams {
    /// Validate the parameter set for its state
    pub fn validate(&self) -> Result<()> {
        check_attach_detach(self.attach, self.detach)?;
        if self.attach && self.servers.is_empty() {
            return Err(Error::validation(
                "'servers' is required when 'attach' is set",
            ));
        }
        if self.detach && is_blank(&self.server_id) {
            return Err(Error::validation(
                "'server_id' is required when 'detach' is set",
            ));
        }
        if self.servers.iter().any(|s| s.id.trim().is_empty()) {
            return Err(Error::validation("every entry in 'servers' needs an id"));
        }
        check_text_limits(self.name.as_deref(), self.description.as_deref())?;
        if let Some(size) = self.size {
            check_size("shared storage", size, 50, 2000, 50)?;
        }
        if matches!(self.password.as_deref(), Some(p) if p.is_empty()) {
            return Err(Error::validation("'password' cannot be empty"));
        }

        match self.state {
            DesiredState::Absent => require(
                &self.name,
                "'name' parameter is required to delete a shared storage.",
            )?,
            DesiredState::Update => require(
                &self.shared_storage,
                "'shared_storage' parameter is required to update a shared storage.",
            )?,
            DesiredState::Present => {
                require(&self.name, "name parameter is required for a new shared storage.")?;
                if self.size.is_none() {
                    return Err(Error::validation(
                        "size parameter is required for a new shared storage.",
                    ));
                }
            }
        }

        self.wait.policy().map(|_| ())
    }
}

/// Parameters for the SSH key reconciler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyParams {
    #[serde(default)]
    pub state: DesiredState,

    #[serde(default)]
    pub name: Option<String>,

    /// Id or name of the key to update or delete
    #[serde(default)]
    pub ssh_key_id: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// OpenSSH public key; generated by the provider when absent
    #[serde(default)]
    pub public_key: Option<String>,

    #[serde(flatten)]
    pub wait: WaitOptions,
}

impl SshKeyParams {
    /// Validate the parameter set for its state
    pub fn validate(&self) -> Result<()> {
        check_text_limits(self.name.as_deref(), self.description.as_deref())?;
        if matches!(self.public_key.as_deref(), Some(k) if k.trim().is_empty()) {
            return Err(Error::validation("'public_key' cannot be empty"));
        }

        match self.state {
            DesiredState::Absent => {
                if is_blank(&self.ssh_key_id) && is_blank(&self.name) {
                    return Err(Error::validation(
                        "'ssh_key_id' parameter is required to delete a SSH key.",
                    ));
                }
            }
            DesiredState::Update => require(
                &self.ssh_key_id,
                "'ssh_key_id' parameter is required to update a SSH key.",
            )?,
            DesiredState::Present => {
                require(&self.name, "name parameter is required for a new SSH key.")?
            }
        }

        self.wait.policy().map(|_| ())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn require(value: &Option<String>, msg: &str) -> Result<()> {
    if is_blank(value) {
        return Err(Error::validation(msg));
    }
    Ok(())
}

fn check_attach_detach(attach: bool, detach: bool) -> Result<()> {
    if attach && detach {
        return Err(Error::validation(
            "parameters are mutually exclusive: attach|detach",
        ));
    }
    Ok(())
}

fn check_text_limits(name: Option<&str>, description: Option<&str>) -> Result<()> {
    if let Some(name) = name
        && name.chars().count() > MAX_NAME_LEN
    {
        return Err(Error::validation(format!(
            "name is too long: {} chars (max {})",
            name.chars().count(),
            MAX_NAME_LEN
        )));
    }
    if let Some(description) = description
        && description.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(Error::validation(format!(
            "description is too long: {} chars (max {})",
            description.chars().count(),
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

fn check_size(kind: &str, size: u32, min: u32, max: u32, step: u32) -> Result<()> {
    if !(min..=max).contains(&size) || size % step != 0 {
        return Err(Error::validation(format!(
            "{} size must be between {} and {} GB in steps of {}. Got: {}",
            kind, min, max, step, size
        )));
    }
    Ok(())
}
