//! Credential handling for outbound connections
//!
//! Provides:
//! - Principal extraction from HTTP Basic authorization headers
//! - Basic header construction for username/password logins
//! - Remote role names and the role sets derived from them

pub mod basic;
pub mod roles;

pub use basic::{basic_header, username_from_header, UNKNOWN_USERNAME};
pub use roles::{admin_roles, can_edit, RoleSet, ADMIN, ALL_ROLES, DEPLOYER, MONITOR, OPERATOR, TESTER};
