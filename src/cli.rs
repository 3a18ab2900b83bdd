//! Command-line interface
//!
//! Every flag is optional and overrides the corresponding field of the
//! settings file (or the built-in defaults when no file is given).

use std::path::PathBuf;

use clap::Parser;

use crate::config::{SecurityMode, Settings};

/// Exercise a Modbus gateway plugin through its OPC-UA methods
#[derive(Parser, Debug, Default)]
#[command(name = "modbus-gateway-exerciser", version, about, long_about = None)]
pub struct Cli {
    /// JSON settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// OPC-UA server endpoint, opc.tcp://<host>:<port>
    #[arg(short, long, env = "EXERCISER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Modbus device behind the gateway, <ip>:<port>
    #[arg(short, long, env = "EXERCISER_DEVICE")]
    pub device: Option<String>,

    /// Channel security (none, tls)
    #[arg(long, env = "EXERCISER_SECURITY")]
    pub security: Option<SecurityMode>,

    /// Server certificate (required with tls)
    #[arg(long)]
    pub server_cert: Option<PathBuf>,

    /// Client certificate (defaults to the server certificate)
    #[arg(long)]
    pub client_cert: Option<PathBuf>,

    /// Private key (required with tls)
    #[arg(long)]
    pub private_key: Option<PathBuf>,

    /// Display-name substring of the gateway object
    #[arg(long)]
    pub marker: Option<String>,

    /// Namespace index of the gateway methods
    #[arg(long)]
    pub namespace: Option<u16>,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Keep calling after a failed method instead of aborting
    #[arg(long)]
    pub keep_going: bool,

    /// Skip the TCP reachability check before connecting
    #[arg(long)]
    pub no_precheck: bool,

    /// Write the run report here (.csv or .json)
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Also log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Load the settings file if one was given, then apply flag overrides
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        self.apply_to(&mut settings);
        Ok(settings)
    }

    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.server_endpoint = endpoint.clone();
        }
        if let Some(device) = &self.device {
            settings.device_address = device.clone();
        }
        if let Some(mode) = self.security {
            settings.security.mode = mode;
        }
        if let Some(path) = &self.server_cert {
            settings.security.server_cert_path = Some(path.clone());
        }
        if let Some(path) = &self.client_cert {
            settings.security.client_cert_path = Some(path.clone());
        }
        if let Some(path) = &self.private_key {
            settings.security.private_key_path = Some(path.clone());
        }
        if let Some(marker) = &self.marker {
            settings.gateway_marker = marker.clone();
        }
        if let Some(ns) = self.namespace {
            settings.method_namespace = ns;
        }
        if let Some(ms) = self.timeout_ms {
            settings.call_timeout_ms = ms;
        }
        if self.keep_going {
            settings.stop_on_failure = false;
        }
        if self.no_precheck {
            settings.precheck = false;
        }
    }
}
