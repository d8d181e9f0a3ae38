//! SOA reconciler
//!
//! The SoaReconciler maps one zone change onto the provider calls that bring
//! the provider's slave zone in line with it:
//! - Resolving the master nameserver via MasterResolver
//! - Listing the provider's zones via SlaveZoneProvider
//! - Creating, repointing or deleting the matching slave zone
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ZoneEventHandler │─── ZoneChangeEvent ───┐
//! └──────────────────┘                       │
//!                                            ▼
//!                                   ┌───────────────┐
//!                                   │ SoaReconciler │
//!                                   └───────────────┘
//!                                            │
//!                  ┌─────────────────────────┼─────────────────────────┐
//!                  │                         │                         │
//!                  ▼                         ▼                         ▼
//!         ┌────────────────┐      ┌──────────────────┐       ┌─────────────────┐
//!         │ MasterResolver │      │ SlaveZoneProvider│       │     tracing     │
//!         │ (ns -> ip)     │      │ (list/mutate)    │       │ (report)        │
//!         └────────────────┘      └──────────────────┘       └─────────────────┘
//! ```
//!
//! ## Upsert Flow
//!
//! 1. Skip unless the new snapshot carries data
//! 2. Resolve the master; abort on missing domain, nameserver or address
//! 3. List the provider's zones; abort if the listing reports errors
//! 4. Active zone: repoint on a nameserver change, otherwise create
//! 5. Renamed or inactive zone: delete the old slave, reusing the listing
//!
//! Every failure ends in a log line. Neither entry point returns an error to
//! the event source.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::traits::{
    CreateSlaveZone, MasterResolver, ProviderResponse, SlaveProviderFactory, SlaveZoneProvider,
    UpdateSlaveZone, ZoneEventHandler,
};
use crate::zone::{find_remote, RemoteZoneRecord, ZoneChangeEvent, ZoneSnapshot};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Reconciles control-panel SOA changes with a provider's slave zones
///
/// ## Statelessness
///
/// Nothing is carried from one event to the next. A provider client is
/// built from the configured credential for every event, and the remote
/// listing is fetched fresh (once per event).
///
/// ## Concurrency
///
/// Calls are awaited one after another. Two events for the same domain that
/// run at the same time are not serialized against each other.
pub struct SoaReconciler {
    /// Credential and provider settings
    config: SyncConfig,

    /// Builds a provider client per event
    factory: Arc<dyn SlaveProviderFactory>,

    /// Resolves master nameservers
    resolver: Box<dyn MasterResolver>,
}

impl SoaReconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `config`: sync configuration (API key may be absent)
    /// - `factory`: provider factory, usually from the `ProviderRegistry`
    /// - `resolver`: master nameserver resolver
    pub fn new(
        config: SyncConfig,
        factory: Arc<dyn SlaveProviderFactory>,
        resolver: Box<dyn MasterResolver>,
    ) -> Self {
        Self {
            config,
            factory,
            resolver,
        }
    }

    /// Create or update the slave zone for `event.current`
    ///
    /// Also deletes the slave of `event.previous` when the zone was renamed
    /// or deactivated.
    pub async fn upsert(&self, event: &ZoneChangeEvent) {
        let Some(zone) = event.current_zone() else {
            debug!("No current zone data, nothing to create or update");
            return;
        };

        if let Err(e) = self.try_upsert(event, zone).await {
            report_failure(
                &format!("Could not update/create dns slave for {}", zone.domain()),
                &e,
            );
        }
    }

    /// Delete the slave zone for `event.previous`
    ///
    /// # Parameters
    ///
    /// - `event`: the change whose old snapshot names the zone to remove
    /// - `remote_records`: an already fetched listing, if any
    pub async fn delete(
        &self,
        event: &ZoneChangeEvent,
        remote_records: Option<&[RemoteZoneRecord]>,
    ) {
        self.run_delete(event, None, remote_records).await;
    }

    async fn try_upsert(&self, event: &ZoneChangeEvent, zone: &ZoneSnapshot) -> Result<()> {
        let domain = zone.domain();
        let ns = zone.nameserver.trim();

        if domain.is_empty() || ns.is_empty() {
            return Err(Error::invalid_input(
                "Failed to update dns slave due to missing data",
            ));
        }

        let master_ip = self.resolver.lookup(ns).await.ok_or_else(|| {
            Error::invalid_input(format!(
                "Failed to update dns slave due to missing data: no address for {}",
                ns
            ))
        })?;

        let provider = self.connect()?;
        let listing = provider.list_domains().await?;
        let remote = check_response("domain.list", listing)?;

        let previous = event.previous.as_ref();

        if zone.active {
            let ns_changed =
                previous.is_some_and(|p| nameserver_changed(&p.nameserver, &zone.nameserver));

            if ns_changed {
                if let Some(record) = find_remote(&remote, &domain) {
                    let request = UpdateSlaveZone {
                        remote_id: record.remote_id.clone(),
                        master_ips: vec![master_ip],
                    };
                    let response = provider.update_domain(&request).await?;
                    match check_response("domain.update", response) {
                        Ok(_) => debug!("Updated the dns slave record for {}", domain),
                        Err(_) => warn!("Failed to update the dns slave record for {}", domain),
                    }
                } else {
                    debug!("No dns slave record to update for {}", domain);
                }
            } else {
                // No existence check here: a repeated insert creates a duplicate
                let request = CreateSlaveZone::new(domain.as_str(), vec![master_ip]);
                let response = provider.create_domain(&request).await?;
                match check_response("domain.create", response) {
                    Ok(_) => debug!("Created a new dns slave record for {}", domain),
                    Err(_) => warn!("Failed to create a new dns slave record for {}", domain),
                }
            }
        } else {
            debug!("Zone {} is not active", domain);
        }

        let renamed = previous.is_some_and(|p| {
            let old = p.domain();
            !old.is_empty() && old != domain
        });

        if renamed || !zone.active {
            self.run_delete(event, Some(provider.as_ref()), Some(remote.as_slice()))
                .await;
        }

        Ok(())
    }

    async fn run_delete(
        &self,
        event: &ZoneChangeEvent,
        provider: Option<&dyn SlaveZoneProvider>,
        remote_records: Option<&[RemoteZoneRecord]>,
    ) {
        if let Err(e) = self.try_delete(event, provider, remote_records).await {
            let context = match event.previous_zone() {
                Some(zone) => format!("Could not delete dns slave for {}", zone.domain()),
                None => "Could not delete dns slave".to_string(),
            };
            report_failure(&context, &e);
        }
    }

    async fn try_delete(
        &self,
        event: &ZoneChangeEvent,
        provider: Option<&dyn SlaveZoneProvider>,
        remote_records: Option<&[RemoteZoneRecord]>,
    ) -> Result<()> {
        let zone = event
            .previous_zone()
            .ok_or_else(|| Error::invalid_input("No passed data"))?;

        let domain = zone.domain();
        if domain.is_empty() {
            return Err(Error::invalid_input(
                "Failed to delete dns slave due to missing data",
            ));
        }

        let connected: Box<dyn SlaveZoneProvider>;
        let provider = match provider {
            Some(provider) => provider,
            None => {
                connected = self.connect()?;
                connected.as_ref()
            }
        };

        let fetched: Vec<RemoteZoneRecord>;
        let records = match remote_records {
            Some(records) => records,
            None => {
                let listing = provider.list_domains().await?;
                fetched = check_response("domain.list", listing)?;
                fetched.as_slice()
            }
        };

        let Some(record) = find_remote(records, &domain) else {
            debug!("No dns slave found for {}", domain);
            return Ok(());
        };

        let response = provider.delete_domain(&record.remote_id).await?;
        match check_response("domain.delete", response) {
            Ok(_) => debug!("Deleted dns slave for {}", domain),
            Err(_) => warn!("Failed to delete dns slave for {}", domain),
        }

        Ok(())
    }

    /// Build a provider client from the configured credential
    fn connect(&self) -> Result<Box<dyn SlaveZoneProvider>> {
        let provider_config = self.config.provider_config()?;
        self.factory.create(&provider_config)
    }
}

#[async_trait]
impl ZoneEventHandler for SoaReconciler {
    async fn on_zone_created(&self, event: &ZoneChangeEvent) {
        self.upsert(event).await;
    }

    async fn on_zone_updated(&self, event: &ZoneChangeEvent) {
        self.upsert(event).await;
    }

    async fn on_zone_deleted(&self, event: &ZoneChangeEvent) {
        self.delete(event, None).await;
    }
}

/// Classify a provider response
///
/// Each embedded error is logged on its own; the caller logs the summary.
fn check_response<T: Default>(action: &str, response: ProviderResponse<T>) -> Result<T> {
    if response.has_errors() {
        for e in &response.errors {
            error!("api error {} - {}", e.code, e.message);
        }
        return Err(Error::api(action, response.errors));
    }

    Ok(response.data.unwrap_or_default())
}

fn report_failure(context: &str, err: &Error) {
    if err.is_transport() {
        error!("{}. {}", context, err);
    } else {
        warn!("{}. {}", context, err);
    }
}

/// Nameservers are compared as the control panel stores them
fn nameserver_changed(previous: &str, current: &str) -> bool {
    !previous.is_empty() && previous != current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ApiError;

    #[test]
    fn test_check_response_passes_data_through() {
        let records = vec![RemoteZoneRecord::slave("1", "example.com", vec![])];
        let result = check_response("domain.list", ProviderResponse::ok(records.clone()));
        assert_eq!(result.unwrap(), records);
    }

    #[test]
    fn test_check_response_missing_data_defaults() {
        let response: ProviderResponse<String> = ProviderResponse {
            data: None,
            errors: Vec::new(),
        };
        assert_eq!(check_response("domain.delete", response).unwrap(), "");
    }

    #[test]
    fn test_check_response_embedded_errors() {
        let response: ProviderResponse<Vec<RemoteZoneRecord>> =
            ProviderResponse::failed(vec![ApiError::new(4, "Authentication failed")]);

        match check_response("domain.list", response) {
            Err(Error::Api { action, errors }) => {
                assert_eq!(action, "domain.list");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_nameserver_change_is_literal() {
        assert!(nameserver_changed("ns1.example.com", "ns2.example.com"));
        assert!(nameserver_changed("ns1.example.com.", "ns1.example.com"));
        assert!(!nameserver_changed("ns1.example.com", "ns1.example.com"));
        assert!(!nameserver_changed("", "ns1.example.com"));
    }
}
