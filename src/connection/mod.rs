//! Sessions and the handshake that creates them
//!
//! - `session`: one authenticated relationship to a remote endpoint
//! - `registry`: the process-wide store of live sessions
//! - `outcome`: the result handed back for a connection attempt
//! - `manager`: the handshake plus the inbound connection interface

pub mod manager;
pub mod outcome;
pub mod registry;
pub mod session;

pub use manager::ConnectionManager;
pub use outcome::ConnectionOutcome;
pub use registry::{RegistryStats, SessionRegistry};
pub use session::{ConnectionArtifact, Session, SessionInfo};
