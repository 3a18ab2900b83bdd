//! Session seam between the exerciser and the OPC-UA stack
//!
//! The exerciser only ever talks to a [`GatewaySession`]; the real
//! implementation wraps an async-opcua session, tests plug in doubles.

use anyhow::Result;
use async_trait::async_trait;

use opcua::types::{NodeId, StatusCode, Variant};

use crate::opcua::browser::BrowsedNode;
use crate::opcua::client::ClientConfig;
use crate::opcua::status_codes::translate_status_code;
use crate::opcua::subscription::format_variant;

/// What the server answered to one method call
#[derive(Debug, Clone, PartialEq)]
pub struct MethodOutcome {
    pub status: StatusCode,
    /// Per-argument result codes, only populated by the server on argument errors
    pub input_argument_results: Vec<StatusCode>,
    pub output_arguments: Vec<Variant>,
}

impl MethodOutcome {
    pub fn good(output_arguments: Vec<Variant>) -> Self {
        Self {
            status: StatusCode::Good,
            input_argument_results: Vec::new(),
            output_arguments,
        }
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            input_argument_results: Vec::new(),
            output_arguments: Vec::new(),
        }
    }

    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }

    pub fn status_text(&self) -> String {
        translate_status_code(self.status)
    }

    pub fn formatted_outputs(&self) -> Vec<String> {
        self.output_arguments.iter().map(format_variant).collect()
    }

    /// Bad input-argument codes as `arg<index>: <description>`
    pub fn argument_errors(&self) -> Vec<String> {
        self.input_argument_results
            .iter()
            .enumerate()
            .filter(|(_, code)| !code.is_good())
            .map(|(i, code)| format!("arg{}: {}", i, translate_status_code(*code)))
            .collect()
    }
}

/// An open session to the OPC-UA server
#[async_trait]
pub trait GatewaySession: Send + Sync {
    /// Hierarchical children of `parent`
    async fn browse_children(&self, parent: &NodeId) -> Result<Vec<BrowsedNode>>;

    /// Invoke `method` on `object` with positional string arguments
    async fn call_method(&self, object: &NodeId, method: &NodeId, arguments: &[String]) -> Result<MethodOutcome>;

    /// Close the session. Errors are logged, never returned.
    async fn disconnect(&self);
}

/// Opens sessions; the exerciser calls this exactly once per run
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self, config: &ClientConfig) -> Result<Box<dyn GatewaySession>>;
}
