//! Supported remote versions
//!
//! The console only manages remote domains whose version it has a schema
//! for. The registry answers "is this version supported" during the
//! handshake and which versions report security warnings.

use tracing::debug;

/// Versions the console ships schemas for, oldest first
pub const DEFAULT_SUPPORTED_VERSIONS: [&str; 3] = ["12.2.1.3.0", "12.2.1.4.0", "14.1.1.0.0"];

/// First version that reports security warnings
const SECURITY_WARNINGS_SINCE: [u32; 3] = [14, 1, 1];

/// Lookup of supported remote versions
pub trait VersionRegistry: Send + Sync {
    /// Whether the console can manage a domain of this version
    fn is_supported(&self, version: &str) -> bool;

    /// The newest supported version
    fn current_version(&self) -> &str;

    /// Whether domains of this version report security warnings
    fn supports_security_warnings(&self, version: &str) -> bool;
}

/// Registry backed by an explicit version list
#[derive(Debug, Clone)]
pub struct SupportedVersions {
    versions: Vec<String>,
    current: String,
}

impl SupportedVersions {
    /// Create a registry from a list of exact version strings
    pub fn new(versions: Vec<String>) -> Self {
        let current = versions
            .iter()
            .max_by_key(|v| version_components(v))
            .cloned()
            .unwrap_or_default();

        debug!(versions = ?versions, current = %current, "Supported versions loaded");

        Self { versions, current }
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }
}

impl Default for SupportedVersions {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect())
    }
}

impl VersionRegistry for SupportedVersions {
    fn is_supported(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    fn current_version(&self) -> &str {
        &self.current
    }

    fn supports_security_warnings(&self, version: &str) -> bool {
        version_components(version).as_slice() >= SECURITY_WARNINGS_SINCE.as_slice()
    }
}

/// Leading numeric components of a dotted version, e.g. "14.1.1.0.0" -> [14, 1, 1, 0, 0]
fn version_components(version: &str) -> Vec<u32> {
    version
        .split('.')
        .map_while(|part| part.trim().parse::<u32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_versions() {
        let registry = SupportedVersions::default();
        assert!(registry.is_supported("14.1.1.0.0"));
        assert!(registry.is_supported("12.2.1.4.0"));
        assert!(!registry.is_supported("10.3.6.0"));
        assert!(!registry.is_supported("14.1.1"));
        assert_eq!(registry.current_version(), "14.1.1.0.0");
    }

    #[test]
    fn test_current_is_highest_not_last() {
        let registry = SupportedVersions::new(vec![
            "14.1.1.0.0".to_string(),
            "12.2.1.4.0".to_string(),
        ]);
        assert_eq!(registry.current_version(), "14.1.1.0.0");
        assert!(SupportedVersions::new(Vec::new()).current_version().is_empty());
    }

    #[test]
    fn test_security_warnings_by_version() {
        let registry = SupportedVersions::default();
        assert!(registry.supports_security_warnings("14.1.1.0.0"));
        assert!(registry.supports_security_warnings("15.1.0.0.0"));
        assert!(!registry.supports_security_warnings("12.2.1.4.0"));
        assert!(!registry.supports_security_warnings("garbage"));
    }

    #[test]
    fn test_version_components() {
        assert_eq!(version_components("12.2.1.4.0"), vec![12, 2, 1, 4, 0]);
        assert_eq!(version_components("14.1.1-SNAPSHOT"), vec![14, 1]);
        assert!(version_components("").is_empty());
    }
}
