//! REST plumbing for the remote management endpoint
//!
//! - `outbound`: per-handshake HTTP clients with timeouts and credentials
//! - `request`: immutable request descriptors and their builder
//! - `client`: the call boundary that issues descriptors and classifies failures

pub mod client;
pub mod outbound;
pub mod request;

pub use client::{RestClient, RestResponse};
pub use outbound::{ClientFactory, Credentials, OutboundClient};
pub use request::{RequestBuilder, RequestDescriptor};
