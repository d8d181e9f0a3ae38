// # soa-sync-core
//
// Core library for mirroring a control panel's SOA zones into a DNS
// provider's slave zones, so the provider serves as a secondary nameserver.
//
// ## Architecture Overview
//
// - **SlaveZoneProvider**: Trait for listing and mutating the provider's zones
// - **MasterResolver**: Trait for resolving the master nameserver's address
// - **ZoneEventHandler**: Entry points for the control panel's SOA events
// - **SoaReconciler**: Maps a before/after zone snapshot onto provider calls
// - **ProviderRegistry**: Plugin-based registry for provider factories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic is separate from provider clients
// 2. **Event-Driven**: One event in, a short sequence of API calls out
// 3. **Plugin-Based**: Providers are registered by name
// 4. **Library-First**: The daemon is a thin shell around this crate
// 5. **Fail Quietly**: A sync failure is logged, never propagated to the event source

pub mod traits;
pub mod reconciler;
pub mod registry;
pub mod config;
pub mod error;
pub mod resolver;
pub mod zone;

// Re-export core types for convenience
pub use traits::{MasterResolver, SlaveProviderFactory, SlaveZoneProvider, ZoneEventHandler};
pub use reconciler::SoaReconciler;
pub use registry::ProviderRegistry;
pub use config::{ProviderConfig, SyncConfig};
pub use error::{Error, Result};
pub use resolver::SystemResolver;
pub use zone::{RemoteZoneRecord, ZoneChangeEvent, ZoneEventKind, ZoneSnapshot};
