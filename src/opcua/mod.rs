//! OPC-UA client module
//!
//! Connection management, node browsing, certificate handling, method
//! calls and subscription sinks on top of async-opcua.

pub mod browser;
pub mod certificates;
pub mod client;
pub mod session;
pub mod status_codes;
pub mod subscription;

pub use browser::{BrowsedNode, NodeClass};
pub use client::{ClientConfig, OpcUaClient, OpcUaConnector};
pub use session::{GatewaySession, MethodOutcome, SessionConnector};
