//! Master resolver implementations
//!
//! - [`SystemResolver`]: operating-system name service

pub mod system;

pub use system::SystemResolver;
