//! Capability descriptors for remote versions and role sets
//!
//! A capability descriptor is what the console may show and do for a given
//! remote version and role set. Descriptors are cached for the life of the
//! process and shared by identity across sessions.

pub mod cache;
pub mod keys;
pub mod versions;

pub use cache::{
    CacheStatsSnapshot, CapabilityCache, CapabilityDescriptor, DescriptorFactory, Payload, RoleSummary,
    RoleSummaryFactory,
};
pub use keys::CapabilityKey;
pub use versions::{SupportedVersions, VersionRegistry, DEFAULT_SUPPORTED_VERSIONS};
