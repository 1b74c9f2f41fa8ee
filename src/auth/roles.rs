//! Remote security roles
//!
//! The remote endpoint grants its users a subset of these roles. The role set
//! decides which management operations the console exposes.

use std::collections::BTreeSet;

/// Ordered set of role names
pub type RoleSet = BTreeSet<String>;

pub const ADMIN: &str = "Admin";
pub const DEPLOYER: &str = "Deployer";
pub const OPERATOR: &str = "Operator";
pub const MONITOR: &str = "Monitor";
pub const TESTER: &str = "Tester";

/// Every role the console knows how to check for
pub const ALL_ROLES: [&str; 5] = [ADMIN, DEPLOYER, OPERATOR, MONITOR, TESTER];

/// The canonical role set of a full administrator.
///
/// An administrator may do anything, so their other roles never change what
/// the console offers them.
pub fn admin_roles() -> RoleSet {
    BTreeSet::from([ADMIN.to_string()])
}

/// Admins and deployers are allowed to edit the configuration
pub fn can_edit(roles: &RoleSet) -> bool {
    roles.contains(ADMIN) || roles.contains(DEPLOYER)
}
