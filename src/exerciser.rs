//! Gateway exerciser
//!
//! Connects to the OPC-UA server, locates the Modbus gateway object, runs
//! the fixed method battery against one device and always closes the
//! session afterwards.

use std::time::Instant;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::{ExerciserError, ResolutionError};
use crate::gateway::{resolve_gateway, GatewayCommand, MethodDirectory};
use crate::network::precheck::{tcp_precheck, PRECHECK_TIMEOUT};
use crate::opcua::browser::objects_folder_id;
use crate::opcua::{BrowsedNode, ClientConfig, GatewaySession, SessionConnector};
use crate::report::{CallRecord, GatewayInfo, RunReport, Verdict};

/// Result of a whole run: the report is kept even when the run failed
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub result: Result<(), ExerciserError>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match &self.result {
            Ok(()) => 0,
            Err(e) => e.exit_code(),
        }
    }
}

pub struct GatewayExerciser<C> {
    connector: C,
    settings: Settings,
    commands: Vec<GatewayCommand>,
    cancel: CancellationToken,
}

impl<C: SessionConnector> GatewayExerciser<C> {
    pub fn new(connector: C, settings: Settings) -> Self {
        Self {
            connector,
            settings,
            commands: GatewayCommand::standard_battery().to_vec(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the standard battery
    pub fn with_commands(mut self, commands: Vec<GatewayCommand>) -> Self {
        self.commands = commands;
        self
    }

    /// Token that stops the battery before its next call
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn run(&self) -> RunOutcome {
        let mut report = RunReport::new(&self.settings.server_endpoint, &self.settings.device_address);
        let result = self.run_inner(&mut report).await;

        report.verdict = match &result {
            Ok(()) => Verdict::Passed,
            Err(ExerciserError::CallsFailed { .. }) => Verdict::CallsFailed,
            Err(_) => Verdict::Aborted,
        };
        if let Err(e) = &result {
            tracing::error!("{}", e);
            report.error = Some(e.to_string());
        }

        RunOutcome { report, result }
    }

    async fn run_inner(&self, report: &mut RunReport) -> Result<(), ExerciserError> {
        // Everything up to the connect must fail without touching the network
        self.settings.validate()?;
        let security = self.settings.security.resolve()?;

        if self.settings.precheck {
            tcp_precheck(&self.settings.server_endpoint, PRECHECK_TIMEOUT)
                .await
                .map_err(ExerciserError::Connection)?;
        }

        let config = ClientConfig::new(&self.settings, security);
        let session = self
            .connector
            .connect(&config)
            .await
            .map_err(|e| ExerciserError::Connection(format!("{:#}", e)))?;

        let result = self.exercise(session.as_ref(), report).await;

        session.disconnect().await;

        result
    }

    async fn exercise(&self, session: &dyn GatewaySession, report: &mut RunReport) -> Result<(), ExerciserError> {
        let objects = objects_folder_id();
        let children = session
            .browse_children(&objects)
            .await
            .map_err(|e| browse_error(&objects.to_string(), e))?;
        tracing::debug!("Children of objects are: {:?}", children.iter().map(|c| &c.display_name).collect::<Vec<_>>());

        let gateway = resolve_gateway(&children, &self.settings.gateway_marker)?.clone();
        let methods = self.load_methods(session, &gateway).await?;

        report.gateway = Some(GatewayInfo {
            node_id: gateway.node_id.to_string(),
            display_name: gateway.display_name.clone(),
            methods: methods.len(),
        });
        tracing::info!("Using gateway {} [{}]", gateway.display_name, gateway.node_id);

        for command in &self.commands {
            let method_id = command.method_id(self.settings.method_namespace);
            if self.cancel.is_cancelled() {
                return Err(ExerciserError::Cancelled { next: method_id });
            }

            let record = self.invoke(session, &gateway, &methods, command).await;
            let failure = record.error.clone();
            report.calls.push(record);

            if let Some(message) = failure {
                if self.settings.stop_on_failure {
                    return Err(ExerciserError::RemoteCall { method: method_id, message });
                }
            }
        }

        match report.failed_calls() {
            0 => Ok(()),
            failed => Err(ExerciserError::CallsFailed {
                failed,
                total: report.calls.len(),
            }),
        }
    }

    async fn load_methods(&self, session: &dyn GatewaySession, gateway: &BrowsedNode) -> Result<MethodDirectory, ExerciserError> {
        let children = session
            .browse_children(&gateway.node_id)
            .await
            .map_err(|e| browse_error(&gateway.node_id.to_string(), e))?;
        tracing::debug!(
            "Gateway children: {:?}",
            children.iter().map(|c| c.qualified_name()).collect::<Vec<_>>()
        );
        let methods = MethodDirectory::from_children(&children);
        if methods.is_empty() {
            tracing::warn!("Gateway {} exposes no methods", gateway.display_name);
        }
        Ok(methods)
    }

    async fn invoke(
        &self,
        session: &dyn GatewaySession,
        gateway: &BrowsedNode,
        methods: &MethodDirectory,
        command: &GatewayCommand,
    ) -> CallRecord {
        let namespace = self.settings.method_namespace;
        let arguments = command.arguments(&self.settings.device_address);
        let mut record = CallRecord {
            command: *command,
            method_id: command.method_id(namespace),
            arguments,
            status: None,
            outputs: Vec::new(),
            duration_ms: 0,
            error: None,
        };

        tracing::info!("test {} {}", command, self.settings.device_address);

        let Some(method_node) = methods.lookup(namespace, command.method_name()) else {
            let message = format!("gateway has no method {}", record.method_id);
            tracing::error!("{}", message);
            record.error = Some(message);
            return record;
        };

        let started = Instant::now();
        let call = session.call_method(&gateway.node_id, method_node, &record.arguments);
        let answer = timeout(self.settings.call_timeout(), call).await;
        record.duration_ms = started.elapsed().as_millis() as u64;

        match answer {
            Err(_) => {
                record.error = Some(format!("no reply within {:?}", self.settings.call_timeout()));
            }
            Ok(Err(e)) => {
                record.error = Some(format!("{:#}", e));
            }
            Ok(Ok(outcome)) => {
                record.status = Some(outcome.status_text());
                record.outputs = outcome.formatted_outputs();
                if !outcome.is_good() {
                    let mut message = outcome.status_text();
                    let arg_errors = outcome.argument_errors();
                    if !arg_errors.is_empty() {
                        message = format!("{} ({})", message, arg_errors.join(", "));
                    }
                    record.error = Some(message);
                }
            }
        }

        match &record.error {
            None => tracing::info!(
                "method result is: {} [{}]",
                record.status.as_deref().unwrap_or("-"),
                record.outputs.join(", ")
            ),
            Some(e) => tracing::error!("method {} failed: {}", record.method_id, e),
        }

        record
    }
}

fn browse_error(node: &str, e: anyhow::Error) -> ExerciserError {
    ResolutionError::Browse {
        node: node.to_string(),
        message: format!("{:#}", e),
    }
    .into()
}
