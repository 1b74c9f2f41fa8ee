//! Gatehouse - connection layer for a remote server-management console
//!
//! Gatehouse terminates console user credentials, opens authenticated
//! sessions against a remote management REST endpoint and negotiates what
//! that endpoint's version and the user's roles allow.
//!
//! ## Components
//!
//! - **Auth**: principal extraction from HTTP Basic headers, remote roles
//! - **REST**: request descriptors, outbound clients, the call boundary
//! - **Capability**: supported versions and the shared descriptor cache
//! - **Connection**: the handshake, sessions and the session registry

pub mod auth;
pub mod capability;
pub mod config;
pub mod connection;
pub mod messages;
pub mod rest;
pub mod types;

pub use config::{Args, ConnectionConfig};
pub use connection::{ConnectionManager, ConnectionOutcome, Session, SessionRegistry};
pub use types::{GatehouseError, Result};
