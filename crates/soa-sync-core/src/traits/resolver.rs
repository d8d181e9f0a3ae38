// # Master Resolver Trait
//
// Resolves the hostname of a zone's master nameserver to the address the
// provider should transfer the zone from.
//
// ## Implementations
//
// - System resolver: `soa_sync_core::resolver::SystemResolver`

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for master address lookups
///
/// Lookups never fail loudly: an unresolvable name is logged by the
/// implementation and reported as `None`.
#[async_trait]
pub trait MasterResolver: Send + Sync {
    /// Resolve `hostname` to its first usable address
    async fn lookup(&self, hostname: &str) -> Option<IpAddr>;
}
