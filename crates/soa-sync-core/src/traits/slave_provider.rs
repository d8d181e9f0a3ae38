// # Slave Zone Provider Trait
//
// Defines the interface to a third-party DNS provider that hosts secondary
// (slave) zones.
//
// ## Implementations
//
// - Linode DNS Manager: `soa-sync-provider-linode` crate
//
// ## Usage
//
// ```rust,ignore
// use soa_sync_core::traits::{CreateSlaveZone, SlaveZoneProvider};
//
// let provider = /* SlaveZoneProvider implementation */;
//
// let listing = provider.list_domains().await?;
// if listing.has_errors() {
//     // the call went through, but the provider refused it
// }
//
// provider.create_domain(&CreateSlaveZone::new(
//     "example.com",
//     vec!["192.0.2.1".parse()?],
// )).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::zone::{RemoteZoneRecord, RemoteZoneType};

/// One error embedded in a provider response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Provider error code
    pub code: i64,
    /// Human readable message
    pub message: String,
}

impl ApiError {
    /// Create an API error
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.code, self.message)
    }
}

/// A response that reached us, possibly carrying embedded errors
///
/// Transport failures never produce a `ProviderResponse`; they are returned
/// as `Err` from the provider call instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse<T> {
    /// Payload, if the provider returned one
    pub data: Option<T>,
    /// Errors the provider embedded in the response
    pub errors: Vec<ApiError>,
}

impl<T> ProviderResponse<T> {
    /// Successful response
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Failed response
    pub fn failed(errors: Vec<ApiError>) -> Self {
        Self { data: None, errors }
    }

    /// Whether the provider reported any error
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Convert the payload, keeping the embedded errors
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderResponse<U> {
        ProviderResponse {
            data: self.data.map(f),
            errors: self.errors,
        }
    }
}

/// Request to create a slave zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSlaveZone {
    /// Normalized zone name
    pub domain: String,
    /// Zone type, always `Slave` for this system
    pub zone_type: RemoteZoneType,
    /// Masters the provider should transfer from
    pub master_ips: Vec<IpAddr>,
}

impl CreateSlaveZone {
    /// Create a slave zone request
    pub fn new(domain: impl Into<String>, master_ips: Vec<IpAddr>) -> Self {
        Self {
            domain: domain.into(),
            zone_type: RemoteZoneType::Slave,
            master_ips,
        }
    }
}

/// Request to repoint an existing slave zone at new masters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSlaveZone {
    /// Provider handle of the zone
    pub remote_id: String,
    /// New masters
    pub master_ips: Vec<IpAddr>,
}

/// Trait for slave-zone provider implementations
///
/// Each method performs exactly one API call. Providers do not retry, do not
/// cache listings and do not decide what needs to change; that is the job of
/// the `SoaReconciler`.
///
/// # Return Values
///
/// - `Err(Error)`: the request could not be completed (network, HTTP status,
///   unparsable body)
/// - `Ok(response)` with `has_errors()`: the provider rejected the request
/// - `Ok(response)` without errors: success
#[async_trait]
pub trait SlaveZoneProvider: Send + Sync {
    /// List all zones held by the provider
    async fn list_domains(
        &self,
    ) -> Result<ProviderResponse<Vec<RemoteZoneRecord>>, crate::Error>;

    /// Create a slave zone
    ///
    /// Returns the provider handle of the new zone.
    async fn create_domain(
        &self,
        request: &CreateSlaveZone,
    ) -> Result<ProviderResponse<String>, crate::Error>;

    /// Replace the masters of an existing zone
    async fn update_domain(
        &self,
        request: &UpdateSlaveZone,
    ) -> Result<ProviderResponse<String>, crate::Error>;

    /// Delete a zone by provider handle
    async fn delete_domain(
        &self,
        remote_id: &str,
    ) -> Result<ProviderResponse<String>, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing providers from a credential
///
/// The reconciler builds a fresh client for every event, so factories must be
/// cheap to call.
pub trait SlaveProviderFactory: Send + Sync {
    /// Create a provider client
    ///
    /// # Parameters
    ///
    /// - `config`: credential and endpoint settings
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn SlaveZoneProvider>, crate::Error>;
}
