//! Process-lifetime cache of capability descriptors.
//!
//! Descriptors are expensive to build and are shared by identity: every
//! session presenting the same normalized key gets the same `Arc`. Building is
//! single-flight per key. Concurrent first callers for one key wait for a
//! single build, while different keys build in parallel.
//!
//! There is no eviction. The key space is bounded by supported versions, the
//! security-warnings flag and realistic role combinations.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use super::keys::CapabilityKey;
use crate::auth::{can_edit, RoleSet};

/// Opaque payload produced by a descriptor factory
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Builds the payload of a descriptor (the schema-construction collaborator)
pub trait DescriptorFactory: Send + Sync {
    fn build(&self, key: &CapabilityKey) -> Payload;
}

impl<F> DescriptorFactory for F
where
    F: Fn(&CapabilityKey) -> Payload + Send + Sync,
{
    fn build(&self, key: &CapabilityKey) -> Payload {
        self(key)
    }
}

/// The manageable surface available for one version + role set
pub struct CapabilityDescriptor {
    key: CapabilityKey,
    payload: Payload,
}

impl CapabilityDescriptor {
    pub fn key(&self) -> &CapabilityKey {
        &self.key
    }

    pub fn version(&self) -> &str {
        &self.key.version
    }

    pub fn security_warnings(&self) -> bool {
        self.key.security_warnings
    }

    pub fn roles(&self) -> &RoleSet {
        &self.key.roles
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Downcast the payload to the factory's concrete type
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Default factory
// =============================================================================

/// Payload of [`RoleSummaryFactory`]: what a role set may do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub version: String,
    pub roles: Vec<String>,
    /// Admins and deployers may edit the configuration
    pub can_edit: bool,
    pub security_warnings: bool,
}

/// Factory used when no schema collaborator is plugged in
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleSummaryFactory;

impl DescriptorFactory for RoleSummaryFactory {
    fn build(&self, key: &CapabilityKey) -> Payload {
        Arc::new(RoleSummary {
            version: key.version.clone(),
            roles: key.roles.iter().cloned().collect(),
            can_edit: can_edit(&key.roles),
            security_warnings: key.security_warnings,
        })
    }
}

// =============================================================================
// Cache Statistics
// =============================================================================

/// Statistics for the capability cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups answered by an already built descriptor
    pub hits: AtomicU64,

    /// Descriptors built
    pub builds: AtomicU64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_build(&self) {
        self.builds.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub builds: u64,
}

// =============================================================================
// Capability Cache
// =============================================================================

type Slot = Arc<OnceLock<Arc<CapabilityDescriptor>>>;

/// Compute-if-absent cache of capability descriptors
pub struct CapabilityCache {
    /// One slot per normalized key; the slot is filled exactly once
    entries: DashMap<CapabilityKey, Slot>,

    factory: Arc<dyn DescriptorFactory>,

    stats: CacheStats,
}

impl CapabilityCache {
    /// Create a cache that builds payloads with `factory`
    pub fn new(factory: Arc<dyn DescriptorFactory>) -> Self {
        Self {
            entries: DashMap::new(),
            factory,
            stats: CacheStats::default(),
        }
    }

    /// Get the descriptor for a version, flag and role set, building it on
    /// first demand.
    pub fn get<I, S>(&self, version: &str, security_warnings: bool, roles: I) -> Arc<CapabilityDescriptor>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.get_key(CapabilityKey::new(version, security_warnings, roles))
    }

    /// Get the descriptor for an already normalized key.
    ///
    /// The factory may run for a while; async callers should invoke this from
    /// a blocking-friendly context.
    pub fn get_key(&self, key: CapabilityKey) -> Arc<CapabilityDescriptor> {
        // Clone the slot out so the shard lock is released before building
        let slot: Slot = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .value()
            .clone();

        let mut built = false;
        let descriptor = slot.get_or_init(|| {
            built = true;
            debug!(key = %key, "Building capability descriptor");
            let payload = self.factory.build(&key);
            Arc::new(CapabilityDescriptor {
                key: key.clone(),
                payload,
            })
        });

        if built {
            self.stats.record_build();
        } else {
            self.stats.record_hit();
            debug!(key = %key, "Capability descriptor cache hit");
        }

        Arc::clone(descriptor)
    }

    /// Number of keys seen so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for CapabilityCache {
    fn default() -> Self {
        Self::new(Arc::new(RoleSummaryFactory))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn counting_cache(delay: Duration) -> (Arc<CapabilityCache>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factory = move |key: &CapabilityKey| -> Payload {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(delay);
            Arc::new(key.to_storage_key())
        };
        (Arc::new(CapabilityCache::new(Arc::new(factory))), calls)
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        const CALLERS: usize = 16;
        let (cache, calls) = counting_cache(Duration::from_millis(50));
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get("14.1.1.0.0", true, ["Operator", "Monitor"])
                })
            })
            .collect();

        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for descriptor in &descriptors[1..] {
            assert!(Arc::ptr_eq(&descriptors[0], descriptor));
        }

        let stats = cache.stats();
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.hits, (CALLERS - 1) as u64);
    }

    #[test]
    fn test_equivalent_role_sets_share_instance() {
        let (cache, calls) = counting_cache(Duration::ZERO);

        let admin_operator = cache.get("14.1.1.0.0", false, ["Admin", "Operator"]);
        let admin = cache.get("14.1.1.0.0", false, ["Admin"]);
        assert!(Arc::ptr_eq(&admin_operator, &admin));

        let a = cache.get("14.1.1.0.0", false, ["Operator", "Deployer"]);
        let b = cache.get("14.1.1.0.0", false, ["Deployer", "Operator"]);
        assert!(Arc::ptr_eq(&a, &b));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_different_privileges_never_share() {
        let (cache, _) = counting_cache(Duration::ZERO);

        let admin = cache.get("14.1.1.0.0", false, ["Admin"]);
        let monitor = cache.get("14.1.1.0.0", false, ["Monitor"]);
        let other_version = cache.get("12.2.1.4.0", false, ["Admin"]);

        assert!(!Arc::ptr_eq(&admin, &monitor));
        assert!(!Arc::ptr_eq(&admin, &other_version));
        assert_eq!(monitor.payload_as::<String>().map(String::as_str), Some("14.1.1.0.0_false_Monitor"));
    }

    #[test]
    fn test_role_names_containing_separator_never_share() {
        let (cache, calls) = counting_cache(Duration::ZERO);

        let two_roles = cache.get("14.1.1.0.0", false, ["Deployer", "Operator"]);
        let one_role = cache.get("14.1.1.0.0", false, ["Deployer_Operator"]);

        assert!(!Arc::ptr_eq(&two_roles, &one_role));
        assert_eq!(one_role.roles().len(), 1);
        assert!(one_role.roles().contains("Deployer_Operator"));
        assert_eq!(two_roles.roles().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_distinct_keys_build_in_parallel() {
        let (cache, calls) = counting_cache(Duration::from_millis(200));
        let barrier = Arc::new(Barrier::new(4));
        let started = std::time::Instant::now();

        let handles: Vec<_> = ["Admin", "Deployer", "Operator", "Monitor"]
            .into_iter()
            .map(|role| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get("14.1.1.0.0", false, [role])
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Serial builds would take at least 800ms
        assert!(started.elapsed() < Duration::from_millis(700));
    }

    #[test]
    fn test_role_summary_factory() {
        let cache = CapabilityCache::default();

        let deployer = cache.get("14.1.1.0.0", true, ["Monitor", "Deployer"]);
        let summary = deployer.payload_as::<RoleSummary>().unwrap();
        assert!(summary.can_edit);
        assert!(summary.security_warnings);
        assert_eq!(summary.roles, vec!["Deployer".to_string(), "Monitor".to_string()]);

        let monitor = cache.get("14.1.1.0.0", true, ["Monitor"]);
        assert!(!monitor.payload_as::<RoleSummary>().unwrap().can_edit);
        assert!(monitor.payload_as::<String>().is_none());
    }
}
