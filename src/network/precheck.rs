//! Network pre-check functionality
//!
//! Address parsing for the OPC-UA endpoint and the Modbus device, plus a
//! plain TCP reachability probe run before the OPC-UA handshake.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default OPC-UA port when the endpoint URL omits one
pub const OPCUA_DEFAULT_PORT: u16 = 4840;

/// How long the TCP probe waits before declaring the endpoint unreachable
pub const PRECHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Parse an OPC-UA endpoint URL to extract host and port
///
/// Supports URLs like:
/// - opc.tcp://localhost:4840
/// - opc.tcp://192.168.1.100:4840/path
pub fn parse_endpoint_url(url: &str) -> Result<(String, u16), String> {
    let without_scheme = url
        .strip_prefix("opc.tcp://")
        .ok_or_else(|| format!("endpoint \"{}\" must start with opc.tcp://", url))?;

    let host_port = without_scheme
        .split('/')
        .next()
        .ok_or_else(|| "Invalid URL format".to_string())?;

    split_host_port(host_port, Some(OPCUA_DEFAULT_PORT))
}

/// Parse a Modbus device address of the form `<host>:<port>`
///
/// The port is mandatory: the gateway forwards the string verbatim and has
/// no default of its own.
pub fn parse_device_address(address: &str) -> Result<(String, u16), String> {
    if address.contains("://") {
        return Err(format!("device address \"{}\" must be <ip>:<port>, not a URL", address));
    }
    split_host_port(address, None)
}

fn split_host_port(host_port: &str, default_port: Option<u16>) -> Result<(String, u16), String> {
    let parts: Vec<&str> = host_port.rsplitn(2, ':').collect();

    match parts.len() {
        2 => {
            let port = parts[0]
                .parse::<u16>()
                .map_err(|_| format!("Invalid port: {}", parts[0]))?;
            let host = parts[1].to_string();
            if host.is_empty() {
                return Err("Host cannot be empty".to_string());
            }
            Ok((host, port))
        }
        1 => {
            let host = parts[0].to_string();
            if host.is_empty() {
                return Err("Host cannot be empty".to_string());
            }
            match default_port {
                Some(port) => Ok((host, port)),
                None => Err(format!("missing port in \"{}\"", host_port)),
            }
        }
        _ => Err("Invalid host:port format".to_string()),
    }
}

/// Check that something is listening on the endpoint's TCP port
pub async fn tcp_precheck(endpoint_url: &str, wait: Duration) -> Result<(), String> {
    let (host, port) = parse_endpoint_url(endpoint_url)?;
    let addr = format!("{}:{}", host, port);

    tracing::debug!("Probing {} before OPC-UA connect", addr);

    match timeout(wait, TcpStream::connect(&addr)).await {
        Ok(Ok(_)) => {
            tracing::debug!("{} accepted a TCP connection", addr);
            Ok(())
        }
        Ok(Err(e)) => Err(format!("{} is not accepting connections: {}", addr, e)),
        Err(_) => Err(format!("{} did not answer within {:?}", addr, wait)),
    }
}
