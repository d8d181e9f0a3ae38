// # Linode DNS Provider
//
// This crate provides a Linode DNS Manager implementation of
// `SlaveZoneProvider`, so Linode's nameservers act as secondaries for zones
// mastered elsewhere.
//
// ## Behaviour
//
// - One HTTP request per trait call; no retries, no caching
// - Embedded `ERRORARRAY` entries are returned as `ProviderResponse` errors
// - Non-2xx statuses and unparsable bodies are returned as `Err`
// - HTTP timeout of 30 seconds
// - Dry-run mode: listings are fetched, mutations are only logged
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - API key travels in the form body, never in the URL
// - Provider construction fails if the key is empty
//
// ## API Reference
//
// All actions are form-encoded POSTs to the API root with `api_key` and
// `api_action`:
//
// - `domain.list`
// - `domain.create`: `Domain`, `Type`, `master_ips`
// - `domain.update`: `DomainID`, `master_ips`
// - `domain.delete`: `DomainID`
//
// Responses look like:
//
// ```json
// {"ERRORARRAY": [], "ACTION": "domain.list", "DATA": [...]}
// ```
//
// Slave zones must allow zone transfers (xfer) to Linode's nameservers on the
// master side; this crate does not manage that.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use soa_sync_core::config::ProviderConfig;
use soa_sync_core::traits::{
    ApiError, CreateSlaveZone, ProviderResponse, SlaveProviderFactory, SlaveZoneProvider,
    UpdateSlaveZone,
};
use soa_sync_core::zone::{RemoteZoneRecord, RemoteZoneType};
use soa_sync_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Linode API endpoint
const LINODE_API_BASE: &str = "https://api.linode.com/";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider name used in logs and errors
const PROVIDER_NAME: &str = "linode";

/// Linode DNS Manager provider
///
/// Stateless and single-shot: the reconciler builds one per event.
pub struct LinodeProvider {
    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API endpoint
    api_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list zones but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for LinodeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinodeProvider")
            .field("api_key", &"<REDACTED>")
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl LinodeProvider {
    /// Create a new Linode provider
    ///
    /// # Returns
    ///
    /// - `Ok(LinodeProvider)`: ready to use
    /// - `Err(Error::Config)`: if the API key is empty
    /// - `Err(Error::Http)`: if the HTTP client cannot be built
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(Error::config("Linode API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.to_string(),
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| LINODE_API_BASE.to_string()),
            client,
            dry_run: config.dry_run,
        })
    }

    /// Perform one API action
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /
    /// Content-Type: application/x-www-form-urlencoded
    ///
    /// api_key=<key>&api_action=<action>&...
    /// ```
    async fn call(&self, action: &str, params: &[(&str, String)]) -> Result<Envelope> {
        tracing::debug!("Calling Linode API action {}", action);

        let mut form: Vec<(&str, &str)> =
            vec![("api_key", self.api_key.as_str()), ("api_action", action)];
        form.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return match status.as_u16() {
                401 | 403 => Err(Error::provider(
                    PROVIDER_NAME,
                    format!("Authentication failed: Invalid API key or insufficient permissions. Status: {}", status),
                )),
                429 => Err(Error::provider(
                    PROVIDER_NAME,
                    format!("Rate limit exceeded. Status: {}", status),
                )),
                500..=599 => Err(Error::provider(
                    PROVIDER_NAME,
                    format!("Linode server error: {} - {}", status, error_text),
                )),
                _ => Err(Error::provider(
                    PROVIDER_NAME,
                    format!("{} failed: {} - {}", action, status, error_text),
                )),
            };
        }

        response.json::<Envelope>().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })
    }

    /// Log a mutation instead of sending it
    fn dry_run_response(&self, action: &str, params: &[(&str, String)]) -> ProviderResponse<String> {
        let payload = dry_run_payload(params);
        tracing::info!("[DRY-RUN] Would call {} with payload: {}", action, payload);
        ProviderResponse::ok(String::new())
    }

    async fn mutate(&self, action: &str, params: &[(&str, String)]) -> Result<ProviderResponse<String>> {
        if self.dry_run {
            return Ok(self.dry_run_response(action, params));
        }

        let response = self.call(action, params).await?.into_response::<DomainIdData>()?;
        Ok(response.map(|d| d.id))
    }
}

#[async_trait]
impl SlaveZoneProvider for LinodeProvider {
    async fn list_domains(&self) -> Result<ProviderResponse<Vec<RemoteZoneRecord>>> {
        let response = self
            .call("domain.list", &[])
            .await?
            .into_response::<Vec<LinodeDomain>>()?;

        Ok(response.map(|domains| domains.into_iter().map(RemoteZoneRecord::from).collect()))
    }

    async fn create_domain(&self, request: &CreateSlaveZone) -> Result<ProviderResponse<String>> {
        tracing::info!(
            "Creating Linode {} zone {} [mode: {}]",
            request.zone_type.as_str(),
            request.domain,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        self.mutate("domain.create", &create_params(request)).await
    }

    async fn update_domain(&self, request: &UpdateSlaveZone) -> Result<ProviderResponse<String>> {
        tracing::info!(
            "Repointing Linode zone {} to {} [mode: {}]",
            request.remote_id,
            format_master_ips(&request.master_ips),
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        self.mutate("domain.update", &update_params(request)).await
    }

    async fn delete_domain(&self, remote_id: &str) -> Result<ProviderResponse<String>> {
        tracing::info!(
            "Deleting Linode zone {} [mode: {}]",
            remote_id,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let params = [("DomainID", remote_id.to_string())];
        self.mutate("domain.delete", &params).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Response envelope shared by all actions
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "ERRORARRAY", default)]
    errors: Vec<LinodeError>,

    #[serde(rename = "DATA", default)]
    data: Value,
}

impl Envelope {
    /// Split the envelope into payload and embedded errors
    ///
    /// When errors are present the payload is not parsed: Linode returns an
    /// empty object as `DATA` on failure.
    fn into_response<T: DeserializeOwned>(self) -> Result<ProviderResponse<T>> {
        if !self.errors.is_empty() {
            return Ok(ProviderResponse::failed(
                self.errors.into_iter().map(ApiError::from).collect(),
            ));
        }

        let data = serde_json::from_value(self.data).map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Unexpected DATA in response: {}", e))
        })?;
        Ok(ProviderResponse::ok(data))
    }
}

#[derive(Debug, Deserialize)]
struct LinodeError {
    #[serde(rename = "ERRORCODE", default)]
    code: i64,

    #[serde(rename = "ERRORMESSAGE", default)]
    message: String,
}

impl From<LinodeError> for ApiError {
    fn from(e: LinodeError) -> Self {
        ApiError::new(e.code, e.message)
    }
}

#[derive(Debug, Deserialize)]
struct LinodeDomain {
    #[serde(rename = "DOMAINID", deserialize_with = "de_id")]
    id: String,

    #[serde(rename = "DOMAIN")]
    domain: String,

    #[serde(rename = "TYPE", default)]
    zone_type: String,

    #[serde(rename = "MASTER_IPS", default)]
    master_ips: String,
}

impl From<LinodeDomain> for RemoteZoneRecord {
    fn from(d: LinodeDomain) -> Self {
        let zone_type = match d.zone_type.to_ascii_lowercase().as_str() {
            "master" => Some(RemoteZoneType::Master),
            "slave" => Some(RemoteZoneType::Slave),
            _ => None,
        };

        RemoteZoneRecord {
            remote_id: d.id,
            domain_name: d.domain,
            master_ips: parse_master_ips(&d.master_ips),
            zone_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DomainIdData {
    #[serde(rename = "DomainID", alias = "DOMAINID", deserialize_with = "de_id")]
    id: String,
}

fn create_params(request: &CreateSlaveZone) -> [(&'static str, String); 3] {
    [
        ("Domain", request.domain.clone()),
        ("Type", request.zone_type.as_str().to_string()),
        ("master_ips", format_master_ips(&request.master_ips)),
    ]
}

fn update_params(request: &UpdateSlaveZone) -> [(&'static str, String); 2] {
    [
        ("DomainID", request.remote_id.clone()),
        ("master_ips", format_master_ips(&request.master_ips)),
    ]
}

/// Render mutation parameters as JSON for the dry-run log
fn dry_run_payload(params: &[(&str, String)]) -> String {
    let payload: serde_json::Map<String, Value> = params
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
        .collect();
    Value::Object(payload).to_string()
}

/// Linode separates master addresses with semicolons
fn format_master_ips(ips: &[IpAddr]) -> String {
    ips.iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_master_ips(raw: &str) -> Vec<String> {
    raw.split(|c| c == ';' || c == ',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn de_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!(
            "invalid domain id: {}",
            other
        ))),
    }
}

/// Factory for creating Linode providers
pub struct LinodeFactory;

impl SlaveProviderFactory for LinodeFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn SlaveZoneProvider>> {
        if config.dry_run {
            tracing::warn!("Linode provider running in DRY-RUN mode - no changes will be made");
        }
        Ok(Box::new(LinodeProvider::new(config)?))
    }
}

/// Register the Linode provider with a registry
///
/// # Example
///
/// ```rust
/// use soa_sync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// soa_sync_provider_linode::register(&registry);
/// assert!(registry.has_provider("linode"));
/// ```
pub fn register(registry: &soa_sync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(LinodeFactory));
}
