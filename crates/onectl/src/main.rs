// # onectl - 1&1 resource reconciler
//
// This binary is a THIN integration layer:
// 1. Parse parameters (flags, environment, `--params` JSON document)
// 2. Initialize logging and the runtime
// 3. Register providers and build one from configuration
// 4. Run a single reconciliation and print its result as JSON
//
// All reconciliation logic lives in onectl-core.
//
// ## Configuration
//
// - `ONEANDONE_AUTH_TOKEN`: API token (or `--auth-token`)
// - `ONEANDONE_API_URL`: API base URL override (or `--api-url`)
// - `ONECTL_LOG_LEVEL`: trace, debug, info, warn (default) or error
//
// Logs go to stderr; stdout carries only the JSON result.
//
// ## Example
//
// ```bash
// export ONEANDONE_AUTH_TOKEN=your_token
//
// onectl block-storage --name data --size 40 --datacenter-id DE
// onectl shared-storage --state update --shared-storage data \
//     --attach --server web:RW --check
// onectl ssh-key --state absent --ssh-key-id deploy
// ```

mod cli;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use serde_json::{Value, json};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Invocation, Request};
use onectl_core::{ProviderRegistry, Reconciler};

/// Environment variable selecting the log level
const LOG_LEVEL_ENV: &str = "ONECTL_LOG_LEVEL";

/// Exit codes for the possible outcomes of one invocation
///
/// - 0: Reconciled (changed or not)
/// - 1: Invalid parameters or configuration, nothing was attempted
/// - 2: Runtime failure (remote error, timeout, partial update)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnectlExitCode {
    /// Reconciliation finished
    Success = 0,
    /// Validation or configuration error
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<OnectlExitCode> for ExitCode {
    fn from(code: OnectlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl OnectlExitCode {
    /// Classify a failure
    fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<onectl_core::Error>() {
            Some(e) if e.is_validation() => OnectlExitCode::ConfigError,
            _ => OnectlExitCode::RuntimeError,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = e.print();
                return OnectlExitCode::Success.into();
            }
            let _ = e.print();
            print_failure(first_line(&e.to_string()));
            return OnectlExitCode::ConfigError.into();
        }
    };

    let log_level = match parse_log_level(env::var(LOG_LEVEL_ENV).ok().as_deref()) {
        Ok(level) => level,
        Err(e) => {
            print_failure(&e.to_string());
            return OnectlExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        print_failure(&format!("Failed to set tracing subscriber: {}", e));
        return OnectlExitCode::ConfigError.into();
    }

    let invocation = match cli.into_invocation() {
        Ok(invocation) => invocation,
        Err(e) => {
            error!("Invalid parameters: {}", e);
            print_failure(&e.to_string());
            return OnectlExitCode::ConfigError.into();
        }
    };

    // One invocation, one resource: calls are sequential anyway
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            print_failure(&format!("Failed to create tokio runtime: {}", e));
            return OnectlExitCode::RuntimeError.into();
        }
    };

    match rt.block_on(run(invocation)) {
        Ok(output) => {
            println!("{}", output);
            OnectlExitCode::Success.into()
        }
        Err(e) => {
            error!("Reconciliation failed: {:#}", e);
            print_failure(&format!("{:#}", e));
            OnectlExitCode::for_error(&e).into()
        }
    }
}

/// Build the provider and run one reconciliation
async fn run(invocation: Invocation) -> Result<Value> {
    let registry = ProviderRegistry::new();
    register_providers(&registry)?;
    debug!("Registered providers: {:?}", registry.list_providers());

    let provider = registry.create_provider(&invocation.provider)?;
    let reconciler = Reconciler::new(provider.as_ref(), invocation.check);
    if reconciler.is_dry_run() {
        info!("Check mode: no changes will be made");
    }

    let output = match &invocation.request {
        Request::BlockStorage(params) => {
            reconciler.reconcile_block_storage(params).await?.to_json()?
        }
        Request::SharedStorage(params) => {
            reconciler.reconcile_shared_storage(params).await?.to_json()?
        }
        Request::SshKey(params) => reconciler.reconcile_ssh_key(params).await?.to_json()?,
    };

    Ok(output)
}

/// Register the providers compiled into this binary
fn register_providers(registry: &ProviderRegistry) -> Result<()> {
    #[cfg(feature = "oneandone")]
    {
        debug!("Registering 1&1 provider");
        onectl_provider_oneandone::register(registry)?;
    }

    #[cfg(not(feature = "oneandone"))]
    let _ = registry;

    Ok(())
}

fn parse_log_level(raw: Option<&str>) -> Result<Level> {
    match raw.map(str::to_lowercase).as_deref() {
        None | Some("") | Some("warn") => Ok(Level::WARN),
        Some("trace") => Ok(Level::TRACE),
        Some("debug") => Ok(Level::DEBUG),
        Some("info") => Ok(Level::INFO),
        Some("error") => Ok(Level::ERROR),
        Some(other) => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_ENV,
            other
        ),
    }
}

fn failure_json(msg: &str) -> Value {
    json!({ "failed": true, "msg": msg })
}

fn print_failure(msg: &str) {
    println!("{}", failure_json(msg));
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}
