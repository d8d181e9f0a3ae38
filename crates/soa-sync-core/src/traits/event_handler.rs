// # Zone Event Handler Trait
//
// The control panel notifies its plugins by event name. This trait gives
// those notifications a typed entry point per event.

use async_trait::async_trait;

use crate::zone::{ZoneChangeEvent, ZoneEventKind};

/// Receiver of SOA lifecycle events
///
/// Handlers always return normally; failures are logged by the handler.
#[async_trait]
pub trait ZoneEventHandler: Send + Sync {
    /// A zone was inserted
    async fn on_zone_created(&self, event: &ZoneChangeEvent);

    /// A zone was updated
    async fn on_zone_updated(&self, event: &ZoneChangeEvent);

    /// A zone was deleted
    async fn on_zone_deleted(&self, event: &ZoneChangeEvent);

    /// Route an event to the matching callback
    async fn dispatch(&self, kind: ZoneEventKind, event: &ZoneChangeEvent) {
        match kind {
            ZoneEventKind::Inserted => self.on_zone_created(event).await,
            ZoneEventKind::Updated => self.on_zone_updated(event).await,
            ZoneEventKind::Deleted => self.on_zone_deleted(event).await,
        }
    }
}
