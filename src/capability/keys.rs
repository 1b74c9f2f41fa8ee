//! Capability cache keys
//!
//! A key is the remote version, the security-warnings flag and the role set.
//! Role sets are normalized so that equivalent users share one descriptor.

use std::fmt;

use crate::auth::{admin_roles, RoleSet, ADMIN};

/// Normalized key for a capability descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityKey {
    /// Remote domain version, e.g. "14.1.1.0.0"
    pub version: String,
    /// Whether the remote version reports security warnings
    pub security_warnings: bool,
    /// Normalized role set
    pub roles: RoleSet,
}

impl CapabilityKey {
    /// Create a key, normalizing the role set.
    ///
    /// Any set containing `Admin` collapses to the canonical administrator
    /// set. Other sets are kept sorted so their input order never matters.
    pub fn new<I, S>(version: &str, security_warnings: bool, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: RoleSet = roles.into_iter().map(Into::into).collect();
        let roles = if roles.contains(ADMIN) { admin_roles() } else { roles };

        Self {
            version: version.to_string(),
            security_warnings,
            roles,
        }
    }

    /// Flatten to a single string for logs and labels
    /// Format: version_flag_role1_role2...
    ///
    /// Not injective: a role name containing `_` can collide with a pair of
    /// roles. Lookups use the key itself.
    pub fn to_storage_key(&self) -> String {
        let mut key = format!("{}_{}", self.version, self.security_warnings);
        for role in &self.roles {
            key.push('_');
            key.push_str(role);
        }
        key
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<&str> = self.roles.iter().map(String::as_str).collect();
        write!(f, "{}[{}]", self.version, roles.join(","))?;
        if self.security_warnings {
            write!(f, "+warnings")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_collapses_other_roles() {
        let admin_operator = CapabilityKey::new("14.1.1.0.0", true, ["Admin", "Operator"]);
        let admin = CapabilityKey::new("14.1.1.0.0", true, ["Admin"]);
        assert_eq!(admin_operator, admin);
        assert_eq!(admin_operator.to_storage_key(), "14.1.1.0.0_true_Admin");
    }

    #[test]
    fn test_role_order_is_irrelevant() {
        let a = CapabilityKey::new("12.2.1.4.0", false, ["Operator", "Deployer"]);
        let b = CapabilityKey::new("12.2.1.4.0", false, ["Deployer", "Operator"]);
        assert_eq!(a.to_storage_key(), b.to_storage_key());
        assert_eq!(a.to_storage_key(), "12.2.1.4.0_false_Deployer_Operator");
    }

    #[test]
    fn test_version_and_flag_separate_keys() {
        let base = CapabilityKey::new("14.1.1.0.0", false, ["Monitor"]);
        let flagged = CapabilityKey::new("14.1.1.0.0", true, ["Monitor"]);
        let older = CapabilityKey::new("12.2.1.4.0", false, ["Monitor"]);
        assert_ne!(base.to_storage_key(), flagged.to_storage_key());
        assert_ne!(base.to_storage_key(), older.to_storage_key());
    }

    #[test]
    fn test_empty_roles() {
        let key = CapabilityKey::new("14.1.1.0.0", false, Vec::<String>::new());
        assert_eq!(key.to_storage_key(), "14.1.1.0.0_false");
    }

    #[test]
    fn test_display() {
        let key = CapabilityKey::new("14.1.1.0.0", true, ["Operator", "Monitor"]);
        assert_eq!(format!("{}", key), "14.1.1.0.0[Monitor,Operator]+warnings");
    }
}
