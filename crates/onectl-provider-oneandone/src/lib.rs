// # 1&1 CloudPanel Provider
//
// This crate provides the 1&1 Cloud Server (CloudPanel API v1) implementation
// of the onectl provider traits.
//
// ## Implementation Status
//
// - ✅ One HTTP request per trait method call
// - ✅ Full error propagation to the reconciler (no retries here)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Provider error messages passed through verbatim
// - ❌ NO retry logic (waiting is owned by the reconciler's waiter)
// - ❌ NO dry-run handling (the reconciler never calls a mutating method in check mode)
// - ❌ NO caching (every reconciliation re-reads the API)
//
// ## Trust Level: Untrusted (Cloud Provider)
//
// **Forbidden Capabilities** (enforced by code review):
// - ❌ Spawn tasks or threads
// - ❌ Implement retry or backoff
// - ❌ Decide whether a call is needed
// - ❌ Cache state beyond a single request
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - API token comes from the CLI flag or `ONEANDONE_AUTH_TOKEN`
// - Provider MUST fail fast if the token is empty
//
// ## API Reference
//
// - Base URL: https://cloudpanel-api.1and1.com/v1
// - Authentication: `X-TOKEN: <token>` header
// - Block storages: `/block_storages`, `/block_storages/:id/server`
// - Shared storages: `/shared_storages`, `/shared_storages/:id/servers`,
//   `/shared_storages/access`
// - SSH keys: `/ssh_keys`
// - Lookups: `/servers`, `/datacenters`

mod resources;

use onectl_core::config::ProviderConfig;
use onectl_core::traits::{CloudProvider, CloudProviderFactory};
use onectl_core::{Error, ProviderRegistry, Result};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// CloudPanel API base URL
pub const ONEANDONE_API_BASE: &str = "https://cloudpanel-api.1and1.com/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for list calls, large enough to fetch an account in one page
const LIST_PAGE_SIZE: u32 = 1000;

const PROVIDER_NAME: &str = "oneandone";

/// 1&1 CloudPanel provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. Whether a call is
/// needed, in which order, and whether to wait afterwards is decided by the
/// reconciler in `onectl-core`.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct OneandoneProvider {
    /// CloudPanel API token
    /// ⚠️ NEVER log this value
    auth_token: String,

    /// Base URL without a trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for OneandoneProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneandoneProvider")
            .field("auth_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OneandoneProvider {
    /// Create a new CloudPanel provider
    ///
    /// # Parameters
    ///
    /// - `auth_token`: CloudPanel API token
    /// - `api_url`: Base URL override, mainly for tests and staging endpoints
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty, `Error::Http` if the HTTP
    /// client cannot be built.
    pub fn new(auth_token: impl Into<String>, api_url: Option<String>) -> Result<Self> {
        let auth_token = auth_token.into();
        if auth_token.is_empty() {
            return Err(Error::config("1&1 API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = api_url
            .unwrap_or_else(|| ONEANDONE_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            auth_token,
            base_url,
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET every item of a collection
    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let request = self
            .client
            .get(self.url(path))
            .query(&[("per_page", LIST_PAGE_SIZE)]);
        self.execute(request, &Method::GET, path).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path));
        self.execute(request, &Method::GET, path).await
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.client.request(method.clone(), self.url(path)).json(body);
        self.execute(request, &method, path).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.delete(self.url(path));
        self.execute(request, &Method::DELETE, path).await
    }

    /// Send one request and decode the response
    ///
    /// Non-2xx responses are mapped through [`map_status`]; the provider's
    /// own message is kept verbatim.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<T> {
        tracing::debug!("{} {}", method, path);

        let response = request
            .header("X-TOKEN", &self.auth_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(map_status(status, method, path, &error_text));
        }

        response.json::<T>().await.map_err(|e| {
            Error::remote(
                PROVIDER_NAME,
                format!("Failed to parse response to {} {}: {}", method, path, e),
            )
        })
    }
}

/// Pull the human-readable message out of a CloudPanel error body
///
/// Error bodies look like `{"type": "...", "message": "...", "errors": ...}`.
/// Anything else is returned as-is.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        status.to_string()
    } else {
        message
    }
}

/// Map an HTTP failure onto the core error taxonomy
fn map_status(status: StatusCode, method: &Method, path: &str, body: &str) -> Error {
    let message = error_message(status, body);

    match status.as_u16() {
        401 | 403 => {
            tracing::error!("Authentication failed for {} {}: {}", method, path, status);
            Error::auth(message)
        }
        404 => Error::not_found(message),
        409 => {
            tracing::warn!("Conflict on {} {}: resource is busy", method, path);
            Error::remote(PROVIDER_NAME, message)
        }
        429 => {
            tracing::warn!("Rate limit exceeded on {} {}", method, path);
            Error::remote(PROVIDER_NAME, message)
        }
        500..=599 => {
            tracing::warn!("CloudPanel server error on {} {}: {}", method, path, status);
            Error::remote(PROVIDER_NAME, message)
        }
        _ => Error::remote(PROVIDER_NAME, message),
    }
}

impl CloudProvider for OneandoneProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating CloudPanel providers
pub struct OneandoneFactory;

impl CloudProviderFactory for OneandoneFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn CloudProvider>> {
        let ProviderConfig::Oneandone {
            auth_token,
            api_url,
        } = config;
        if api_url.is_some() {
            tracing::info!("Using custom 1&1 API endpoint");
        }
        Ok(Box::new(OneandoneProvider::new(
            auth_token.clone(),
            api_url.clone(),
        )?))
    }
}

/// Register the CloudPanel provider with a registry
///
/// # Example
///
/// ```rust
/// use onectl_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// onectl_provider_oneandone::register(&registry).unwrap();
/// assert!(registry.has_provider("oneandone"));
/// ```
pub fn register(registry: &ProviderRegistry) -> Result<()> {
    registry.register_provider(PROVIDER_NAME, Box::new(OneandoneFactory))
}
