use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::security::SecurityConfig;
use crate::error::ExerciserError;
use crate::network::precheck::{parse_device_address, parse_endpoint_url};


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {

    pub server_endpoint: String,

    /// Modbus target behind the gateway, `<ip>:<port>`
    pub device_address: String,

    /// Substring identifying the gateway object's display name
    pub gateway_marker: String,

    pub method_namespace: u16,

    pub security: SecurityConfig,

    pub call_timeout_ms: u64,

    pub stop_on_failure: bool,

    pub precheck: bool,

    pub pki_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_endpoint: "opc.tcp://localhost:4840".to_string(),
            device_address: "172.0.0.2:502".to_string(),
            gateway_marker: "ModbusPlugin-TCP".to_string(),
            method_namespace: 2,
            security: SecurityConfig::default(),
            call_timeout_ms: 10_000,
            stop_on_failure: true,
            precheck: true,
            pki_dir: PathBuf::from("pki"),
        }
    }
}

impl Settings {

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Reject anything that would only fail later on the wire
    pub fn validate(&self) -> Result<(), ExerciserError> {
        parse_endpoint_url(&self.server_endpoint).map_err(ExerciserError::Configuration)?;
        parse_device_address(&self.device_address).map_err(ExerciserError::Configuration)?;

        if self.gateway_marker.trim().is_empty() {
            return Err(ExerciserError::Configuration("gateway marker cannot be empty".to_string()));
        }
        if self.call_timeout_ms == 0 {
            return Err(ExerciserError::Configuration("call timeout must be positive".to_string()));
        }
        Ok(())
    }
}
