//! Test doubles and common utilities for reconciler contract tests
//!
//! The mock provider behaves like a tiny in-memory provider: creates add a
//! zone, updates repoint it, deletes remove it. Every call is recorded so
//! tests can assert the exact sequence of API calls.

#![allow(dead_code)]

use soa_sync_core::config::{ProviderConfig, SyncConfig};
use soa_sync_core::error::{Error, Result};
use soa_sync_core::traits::{
    ApiError, CreateSlaveZone, MasterResolver, ProviderResponse, SlaveProviderFactory,
    SlaveZoneProvider, UpdateSlaveZone,
};
use soa_sync_core::{RemoteZoneRecord, SoaReconciler, ZoneSnapshot};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const LIST: &str = "domain.list";
pub const CREATE: &str = "domain.create";
pub const UPDATE: &str = "domain.update";
pub const DELETE: &str = "domain.delete";

/// A provider call as seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    List,
    Create(CreateSlaveZone),
    Update(UpdateSlaveZone),
    Delete(String),
}

impl ProviderCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ProviderCall::List)
    }
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<ProviderCall>>,
    zones: Mutex<Vec<RemoteZoneRecord>>,
    api_errors: Mutex<HashMap<&'static str, Vec<ApiError>>>,
    transport_failures: Mutex<HashSet<&'static str>>,
    next_id: AtomicUsize,
}

/// A mock SlaveZoneProvider that tracks calls
pub struct MockSlaveProvider {
    state: Arc<MockState>,
}

impl MockSlaveProvider {
    pub fn new() -> Self {
        let state = MockState {
            next_id: AtomicUsize::new(100),
            ..Default::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Start with the given zones already on the provider
    pub fn with_zones(zones: Vec<RemoteZoneRecord>) -> Self {
        let provider = Self::new();
        *provider.state.zones.lock().unwrap() = zones;
        provider
    }

    /// Create a new MockSlaveProvider that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
        }
    }

    /// Make `action` answer with embedded errors
    pub fn reject(&self, action: &'static str, errors: Vec<ApiError>) {
        self.state.api_errors.lock().unwrap().insert(action, errors);
    }

    /// Make `action` fail before a response is received
    pub fn break_transport(&self, action: &'static str) {
        self.state.transport_failures.lock().unwrap().insert(action);
    }

    /// All calls, in order
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Calls other than listings
    pub fn mutation_calls(&self) -> Vec<ProviderCall> {
        self.calls().into_iter().filter(|c| c.is_mutation()).collect()
    }

    /// Number of listing calls
    pub fn list_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ProviderCall::List))
            .count()
    }

    /// Zones currently held
    pub fn zones(&self) -> Vec<RemoteZoneRecord> {
        self.state.zones.lock().unwrap().clone()
    }

    fn record(&self, call: ProviderCall) {
        self.state.calls.lock().unwrap().push(call);
    }

    /// Outcome of `action` before any side effect is applied
    fn outcome(&self, action: &'static str) -> Result<Option<Vec<ApiError>>> {
        if self.state.transport_failures.lock().unwrap().contains(action) {
            return Err(Error::http(format!("{} timed out", action)));
        }
        Ok(self.state.api_errors.lock().unwrap().get(action).cloned())
    }
}

#[async_trait::async_trait]
impl SlaveZoneProvider for MockSlaveProvider {
    async fn list_domains(&self) -> Result<ProviderResponse<Vec<RemoteZoneRecord>>> {
        self.record(ProviderCall::List);
        if let Some(errors) = self.outcome(LIST)? {
            return Ok(ProviderResponse::failed(errors));
        }
        Ok(ProviderResponse::ok(self.zones()))
    }

    async fn create_domain(&self, request: &CreateSlaveZone) -> Result<ProviderResponse<String>> {
        self.record(ProviderCall::Create(request.clone()));
        if let Some(errors) = self.outcome(CREATE)? {
            return Ok(ProviderResponse::failed(errors));
        }

        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.state.zones.lock().unwrap().push(RemoteZoneRecord::slave(
            id.clone(),
            request.domain.clone(),
            request.master_ips.iter().map(|ip| ip.to_string()).collect(),
        ));
        Ok(ProviderResponse::ok(id))
    }

    async fn update_domain(&self, request: &UpdateSlaveZone) -> Result<ProviderResponse<String>> {
        self.record(ProviderCall::Update(request.clone()));
        if let Some(errors) = self.outcome(UPDATE)? {
            return Ok(ProviderResponse::failed(errors));
        }

        let mut zones = self.state.zones.lock().unwrap();
        match zones.iter_mut().find(|z| z.remote_id == request.remote_id) {
            Some(zone) => {
                zone.master_ips = request.master_ips.iter().map(|ip| ip.to_string()).collect();
                Ok(ProviderResponse::ok(request.remote_id.clone()))
            }
            None => Ok(ProviderResponse::failed(vec![ApiError::new(
                5,
                "Object not found",
            )])),
        }
    }

    async fn delete_domain(&self, remote_id: &str) -> Result<ProviderResponse<String>> {
        self.record(ProviderCall::Delete(remote_id.to_string()));
        if let Some(errors) = self.outcome(DELETE)? {
            return Ok(ProviderResponse::failed(errors));
        }

        self.state
            .zones
            .lock()
            .unwrap()
            .retain(|z| z.remote_id != remote_id);
        Ok(ProviderResponse::ok(remote_id.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out providers that share one MockState
pub struct MockProviderFactory {
    template: MockSlaveProvider,
    configs: Arc<Mutex<Vec<ProviderConfig>>>,
}

impl MockProviderFactory {
    pub fn new(provider: &MockSlaveProvider) -> Self {
        Self {
            template: MockSlaveProvider::sharing_state_with(provider),
            configs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Settings of every client built so far
    pub fn configs(&self) -> Vec<ProviderConfig> {
        self.configs.lock().unwrap().clone()
    }
}

impl SlaveProviderFactory for MockProviderFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn SlaveZoneProvider>> {
        self.configs.lock().unwrap().push(config.clone());
        Ok(Box::new(MockSlaveProvider::sharing_state_with(&self.template)))
    }
}

/// A resolver with fixed answers that counts lookups
pub struct StaticResolver {
    answers: HashMap<String, IpAddr>,
    lookups: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new(answers: &[(&str, [u8; 4])]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(host, ip)| (host.to_string(), IpAddr::from(*ip)))
                .collect(),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The usual two nameservers of example.com
    pub fn example() -> Self {
        Self::new(&[
            ("ns1.example.com", [10, 0, 0, 1]),
            ("ns2.example.com", [10, 0, 0, 2]),
        ])
    }

    /// Shared handle on the lookup counter
    pub fn lookup_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.lookups)
    }
}

#[async_trait::async_trait]
impl MasterResolver for StaticResolver {
    async fn lookup(&self, hostname: &str) -> Option<IpAddr> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(hostname.trim().trim_end_matches('.'))
            .copied()
    }
}

/// Configuration with a test API key
pub fn test_config() -> SyncConfig {
    SyncConfig::new().with_enabled(true).with_api_key("test-api-key")
}

/// Reconciler wired to `provider` and the example resolver
pub fn reconciler(provider: &MockSlaveProvider) -> SoaReconciler {
    reconciler_with(test_config(), provider, StaticResolver::example())
}

/// Reconciler with explicit configuration and resolver
pub fn reconciler_with(
    config: SyncConfig,
    provider: &MockSlaveProvider,
    resolver: StaticResolver,
) -> SoaReconciler {
    SoaReconciler::new(
        config,
        Arc::new(MockProviderFactory::new(provider)),
        Box::new(resolver),
    )
}

/// Reconciler built around a factory the test keeps a handle on
pub fn reconciler_with_factory(
    config: SyncConfig,
    factory: Arc<MockProviderFactory>,
    resolver: StaticResolver,
) -> SoaReconciler {
    SoaReconciler::new(config, factory, Box::new(resolver))
}

/// Shorthand for a snapshot
pub fn zone(id: &str, origin: &str, ns: &str, active: bool) -> ZoneSnapshot {
    ZoneSnapshot::new(id, origin, ns, active)
}

/// Shorthand for an IPv4 address
pub fn ip(octets: [u8; 4]) -> IpAddr {
    IpAddr::from(octets)
}
