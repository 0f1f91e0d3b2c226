//! Command-line surface
//!
//! Flags map one-to-one onto the core parameter structs. A `--params` JSON
//! document can supply the same keys; flags given on the command line win
//! over values from the document.

use clap::{Args, Parser, Subcommand};
use onectl_core::config::{
    BlockStorageParams, DesiredState, ProviderConfig, SharedStorageParams, SshKeyParams,
    WaitOptions,
};
use onectl_core::model::{Rights, ServerAccess};
use onectl_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "onectl", version)]
#[command(about = "Reconcile 1&1 block storage, shared storage and SSH keys", long_about = None)]
pub struct Cli {
    /// API token
    #[arg(long, env = "ONEANDONE_AUTH_TOKEN", hide_env_values = true, global = true)]
    pub auth_token: Option<String>,

    /// API base URL
    #[arg(long, env = "ONEANDONE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Report what would change without changing anything
    #[arg(long, global = true)]
    pub check: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage a block storage
    BlockStorage(BlockStorageArgs),
    /// Manage a shared storage
    SharedStorage(SharedStorageArgs),
    /// Manage an SSH key
    SshKey(SshKeyArgs),
}

/// Flags shared by every resource kind
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// JSON document with the parameters
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// present, absent or update
    #[arg(long)]
    pub state: Option<DesiredState>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Wait until the resource is ready (default)
    #[arg(long, overrides_with = "no_wait")]
    pub wait: bool,

    /// Return as soon as the provider accepted the request
    #[arg(long, overrides_with = "wait")]
    pub no_wait: bool,

    /// Seconds to wait before giving up
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Seconds between status polls
    #[arg(long, value_name = "SECS")]
    pub wait_interval: Option<u64>,
}

impl WaitArgs {
    fn apply(&self, options: &mut WaitOptions) {
        if self.wait {
            options.wait = true;
        }
        if self.no_wait {
            options.wait = false;
        }
        if let Some(timeout) = self.wait_timeout {
            options.wait_timeout = timeout;
        }
        if let Some(interval) = self.wait_interval {
            options.wait_interval = interval;
        }
    }
}

#[derive(Args, Debug)]
pub struct BlockStorageArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Id or name of the block storage to update
    #[arg(long)]
    pub block_storage: Option<String>,

    /// Size in GB, only when creating
    #[arg(long)]
    pub size: Option<u32>,

    /// Datacenter id or country code
    #[arg(long)]
    pub datacenter_id: Option<String>,

    /// Server id or name
    #[arg(long)]
    pub server_id: Option<String>,

    #[arg(long, conflicts_with = "detach")]
    pub attach: bool,

    #[arg(long)]
    pub detach: bool,
}

#[derive(Args, Debug)]
pub struct SharedStorageArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Id or name of the shared storage to update
    #[arg(long)]
    pub shared_storage: Option<String>,

    /// Size in GB
    #[arg(long)]
    pub size: Option<u32>,

    /// Datacenter id or country code
    #[arg(long)]
    pub datacenter_id: Option<String>,

    /// Server to attach, as ID:RIGHTS (R or RW); repeatable
    #[arg(long = "server", value_name = "ID:RIGHTS", value_parser = parse_server_access)]
    pub servers: Vec<ServerAccess>,

    /// Server id or name to detach
    #[arg(long)]
    pub server_id: Option<String>,

    /// New storage access password. The current one cannot be read back,
    /// so an update that sets it always reports a change
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long, conflicts_with = "detach")]
    pub attach: bool,

    #[arg(long)]
    pub detach: bool,
}

#[derive(Args, Debug)]
pub struct SshKeyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Id or name of the key to update or delete
    #[arg(long)]
    pub ssh_key_id: Option<String>,

    /// OpenSSH public key; generated by the provider when omitted
    #[arg(long)]
    pub public_key: Option<String>,
}

/// Parameters for one reconciliation
#[derive(Debug)]
pub enum Request {
    BlockStorage(BlockStorageParams),
    SharedStorage(SharedStorageParams),
    SshKey(SshKeyParams),
}

/// Everything `main` needs to run one reconciliation
#[derive(Debug)]
pub struct Invocation {
    pub provider: ProviderConfig,
    pub request: Request,
    pub check: bool,
}

/// Connection settings a params document may carry
#[derive(Debug, Default, Deserialize)]
struct ConnectionParams {
    #[serde(default)]
    auth_token: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
}

impl Cli {
    /// Merge flags, params document and environment into an [`Invocation`]
    pub fn into_invocation(self) -> Result<Invocation> {
        let document = match self.command.params_path() {
            Some(path) => Some(read_params(path)?),
            None => None,
        };

        let connection: ConnectionParams = match &document {
            Some(value) => from_document(value.clone())?,
            None => ConnectionParams::default(),
        };
        let provider = ProviderConfig::oneandone_from_env(
            self.auth_token.or(connection.auth_token),
            self.api_url.or(connection.api_url),
        );

        let request = match self.command {
            Command::BlockStorage(args) => Request::BlockStorage(args.into_params(document)?),
            Command::SharedStorage(args) => Request::SharedStorage(args.into_params(document)?),
            Command::SshKey(args) => Request::SshKey(args.into_params(document)?),
        };

        Ok(Invocation {
            provider,
            request,
            check: self.check,
        })
    }
}

impl Command {
    fn params_path(&self) -> Option<&Path> {
        let common = match self {
            Command::BlockStorage(args) => &args.common,
            Command::SharedStorage(args) => &args.common,
            Command::SshKey(args) => &args.common,
        };
        common.params.as_deref()
    }
}

impl CommonArgs {
    fn apply(
        self,
        state: &mut DesiredState,
        name: &mut Option<String>,
        description: &mut Option<String>,
        wait: &mut WaitOptions,
    ) {
        if let Some(requested) = self.state {
            *state = requested;
        }
        set(name, self.name);
        set(description, self.description);
        self.wait.apply(wait);
    }
}

impl BlockStorageArgs {
    fn into_params(self, document: Option<Value>) -> Result<BlockStorageParams> {
        let mut params: BlockStorageParams = match document {
            Some(value) => from_document(value)?,
            None => BlockStorageParams::default(),
        };

        self.common.apply(
            &mut params.state,
            &mut params.name,
            &mut params.description,
            &mut params.wait,
        );
        set(&mut params.block_storage, self.block_storage);
        set(&mut params.size, self.size);
        set(&mut params.datacenter_id, self.datacenter_id);
        set(&mut params.server_id, self.server_id);
        params.attach |= self.attach;
        params.detach |= self.detach;

        Ok(params)
    }
}

impl SharedStorageArgs {
    fn into_params(self, document: Option<Value>) -> Result<SharedStorageParams> {
        let mut params: SharedStorageParams = match document {
            Some(value) => from_document(value)?,
            None => SharedStorageParams::default(),
        };

        self.common.apply(
            &mut params.state,
            &mut params.name,
            &mut params.description,
            &mut params.wait,
        );
        set(&mut params.shared_storage, self.shared_storage);
        set(&mut params.size, self.size);
        set(&mut params.datacenter_id, self.datacenter_id);
        set(&mut params.server_id, self.server_id);
        set(&mut params.password, self.password);
        if !self.servers.is_empty() {
            params.servers = self.servers;
        }
        params.attach |= self.attach;
        params.detach |= self.detach;

        Ok(params)
    }
}

impl SshKeyArgs {
    fn into_params(self, document: Option<Value>) -> Result<SshKeyParams> {
        let mut params: SshKeyParams = match document {
            Some(value) => from_document(value)?,
            None => SshKeyParams::default(),
        };

        self.common.apply(
            &mut params.state,
            &mut params.name,
            &mut params.description,
            &mut params.wait,
        );
        set(&mut params.ssh_key_id, self.ssh_key_id);
        set(&mut params.public_key, self.public_key);

        Ok(params)
    }
}

/// Overwrite `slot` only when the flag was given
fn set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn read_params(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Cannot read params file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::config(format!("Params file {} is not valid JSON: {}", path.display(), e))
    })
}

fn from_document<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::validation(format!("Invalid parameters: {}", e)))
}

/// Parse `ID:RIGHTS`, e.g. `4F2B...:RW`
fn parse_server_access(raw: &str) -> std::result::Result<ServerAccess, String> {
    let (id, rights) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected ID:RIGHTS, got '{}'", raw))?;
    if id.is_empty() {
        return Err(format!("missing server id in '{}'", raw));
    }
    let rights: Rights = rights.parse().map_err(|e: Error| e.to_string())?;
    Ok(ServerAccess::new(id, rights))
}
