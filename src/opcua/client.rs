//! OPC-UA Client builder and session management
//!
//! Builds an async-opcua client from the resolved configuration, opens a
//! session with its event loop, and exposes it through [`GatewaySession`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use opcua::client::{Client, ClientBuilder, IdentityToken, Session};
use opcua::types::{
    CallMethodRequest, EndpointDescription, MessageSecurityMode, NodeId, StatusCode, UAString,
    UserTokenPolicy, Variant,
};

use crate::config::{SecurityMaterial, SecurityMode, Settings};
use crate::opcua::browser::{browse_node, BrowsedNode};
use crate::opcua::certificates::CertificateManager;
use crate::opcua::session::{GatewaySession, MethodOutcome, SessionConnector};
use crate::opcua::status_codes::translate_status_code;

/// Configuration for OPC-UA client connection
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Endpoint URL (opc.tcp://...)
    pub endpoint_url: String,
    /// Certificate material; `None` selects an unsecured channel
    pub security: Option<SecurityMaterial>,
    /// PKI directory used by the client stack
    pub pki_dir: PathBuf,
    /// Requested session timeout in milliseconds
    pub session_timeout_ms: u32,
}

impl ClientConfig {
    pub fn new(settings: &Settings, security: Option<SecurityMaterial>) -> Self {
        Self {
            endpoint_url: settings.server_endpoint.clone(),
            security,
            pki_dir: settings.pki_dir.clone(),
            session_timeout_ms: 30000,
        }
    }

    pub fn security_mode(&self) -> SecurityMode {
        if self.security.is_some() {
            SecurityMode::Tls
        } else {
            SecurityMode::None
        }
    }

    /// Get the security policy string for endpoint matching
    pub fn security_policy_string(&self) -> &'static str {
        self.security_mode().policy_name()
    }

    /// Convert to the opcua crate's message security mode
    pub fn opcua_message_security_mode(&self) -> MessageSecurityMode {
        match self.security_mode() {
            SecurityMode::None => MessageSecurityMode::None,
            SecurityMode::Tls => MessageSecurityMode::SignAndEncrypt,
        }
    }
}

/// OPC-UA client wrapper with session management
pub struct OpcUaClient {
    /// The underlying OPC-UA client
    #[allow(dead_code)]
    client: Client,
    /// The active session
    session: Arc<Session>,
    /// Event loop handle
    event_loop_handle: JoinHandle<StatusCode>,
}

impl OpcUaClient {
    /// Create and connect a new OPC-UA client
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        tracing::info!("Connecting to OPC-UA server: {}", config.endpoint_url);

        let cert_manager = CertificateManager::new(&config.pki_dir);
        cert_manager.ensure_pki_structure()?;

        let mut builder = ClientBuilder::new()
            .application_name("Modbus Gateway Exerciser")
            .application_uri("urn:DengInks:ModbusGatewayExerciser")
            .product_uri("urn:DengInks:ModbusGatewayExerciser")
            .pki_dir(cert_manager.pki_directory())
            .session_retry_limit(0)
            .session_timeout(config.session_timeout_ms);

        builder = match &config.security {
            Some(material) => {
                cert_manager.trust_server_certificate(&material.server_cert)?;
                builder
                    .certificate_path(&material.own_cert)
                    .private_key_path(&material.private_key)
                    .create_sample_keypair(false)
                    .trust_server_certs(false)
            }
            None => builder.create_sample_keypair(true).trust_server_certs(true),
        };

        let mut client = builder
            .client()
            .map_err(|e| anyhow::anyhow!("Failed to build client: {:?}", e))?;

        let endpoint: EndpointDescription = (
            config.endpoint_url.as_str(),
            config.security_policy_string(),
            config.opcua_message_security_mode(),
            UserTokenPolicy::anonymous(),
        )
            .into();

        tracing::info!(
            "Connecting to endpoint: {:?} (policy {})",
            endpoint.endpoint_url,
            config.security_policy_string()
        );

        let (session, event_loop) = client
            .connect_to_matching_endpoint(endpoint, IdentityToken::Anonymous)
            .await
            .context("Failed to connect to endpoint")?;

        let event_loop_handle = event_loop.spawn();

        // The secure channel and session are only opened by the event loop
        if !session.wait_for_connection().await {
            event_loop_handle.abort();
            anyhow::bail!("Session could not be established with {}", config.endpoint_url);
        }

        tracing::info!("OPC-UA session established successfully");

        Ok(Self {
            client,
            session,
            event_loop_handle,
        })
    }
}

#[async_trait]
impl GatewaySession for OpcUaClient {
    async fn browse_children(&self, parent: &NodeId) -> Result<Vec<BrowsedNode>> {
        browse_node(&self.session, parent).await
    }

    async fn call_method(&self, object: &NodeId, method: &NodeId, arguments: &[String]) -> Result<MethodOutcome> {
        let request = CallMethodRequest {
            object_id: object.clone(),
            method_id: method.clone(),
            input_arguments: Some(
                arguments
                    .iter()
                    .map(|arg| Variant::String(UAString::from(arg.as_str())))
                    .collect(),
            ),
        };

        let result = self
            .session
            .call_one(request)
            .await
            .map_err(|status| anyhow::anyhow!("Call service failed: {}", translate_status_code(status)))?;

        Ok(MethodOutcome {
            status: result.status_code,
            input_argument_results: result.input_argument_results.unwrap_or_default(),
            output_arguments: result.output_arguments.unwrap_or_default(),
        })
    }

    /// Disconnect from the server
    async fn disconnect(&self) {
        tracing::info!("Disconnecting from OPC-UA server...");
        match self.session.disconnect().await {
            Ok(()) => tracing::info!("Disconnected successfully"),
            Err(status) => tracing::warn!("Disconnect reported {}", translate_status_code(status)),
        }
        self.event_loop_handle.abort();
    }
}

/// Connector backed by the real OPC-UA stack
#[derive(Debug, Default, Clone, Copy)]
pub struct OpcUaConnector;

#[async_trait]
impl SessionConnector for OpcUaConnector {
    async fn connect(&self, config: &ClientConfig) -> Result<Box<dyn GatewaySession>> {
        let client = OpcUaClient::connect(config).await?;
        Ok(Box::new(client))
    }
}
