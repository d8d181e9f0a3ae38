//! Core traits for the SOA sync system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`SlaveZoneProvider`]: Manage slave zones via provider APIs
//! - [`MasterResolver`]: Resolve the master nameserver's address
//! - [`ZoneEventHandler`]: Receive control-panel zone events

pub mod slave_provider;
pub mod resolver;
pub mod event_handler;

pub use slave_provider::{
    ApiError, CreateSlaveZone, ProviderResponse, SlaveProviderFactory, SlaveZoneProvider,
    UpdateSlaveZone,
};
pub use resolver::MasterResolver;
pub use event_handler::ZoneEventHandler;
