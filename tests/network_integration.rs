use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::net::TcpListener;

use modbus_gateway_exerciser::config::Settings;
use modbus_gateway_exerciser::network::precheck::tcp_precheck;
use modbus_gateway_exerciser::opcua::{ClientConfig, GatewaySession, OpcUaConnector, SessionConnector};
use modbus_gateway_exerciser::{ExerciserError, GatewayExerciser};

#[tokio::test]
async fn test_precheck_success() {
    // 1. Start a dummy TCP listener
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let port = listener.local_addr().expect("Failed to get addr").port();

    tokio::spawn(async move {
        let _ = listener.accept().await;
    });

    // 2. Probe it
    let endpoint = format!("opc.tcp://127.0.0.1:{}", port);
    let result = tcp_precheck(&endpoint, Duration::from_secs(2)).await;

    // 3. Verify
    assert!(result.is_ok(), "{:?}", result);
}

#[tokio::test]
async fn test_precheck_fail() {
    // Bind, note the port, drop the listener so the port is closed
    let port;
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        port = listener.local_addr().expect("Failed to get addr").port();
    }

    let endpoint = format!("opc.tcp://127.0.0.1:{}", port);
    let err = tcp_precheck(&endpoint, Duration::from_secs(2)).await.unwrap_err();
    assert!(err.contains(&port.to_string()));
}

struct CountingConnector(Arc<AtomicUsize>);

#[async_trait]
impl SessionConnector for CountingConnector {
    async fn connect(&self, _config: &ClientConfig) -> Result<Box<dyn GatewaySession>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("not reachable in this test")
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_aborts_before_opcua_connect() {
    let port;
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        port = listener.local_addr().expect("Failed to get addr").port();
    }

    let connects = Arc::new(AtomicUsize::new(0));
    let settings = Settings {
        server_endpoint: format!("opc.tcp://127.0.0.1:{}", port),
        ..Default::default()
    };

    let outcome = GatewayExerciser::new(CountingConnector(connects.clone()), settings).run().await;

    assert!(matches!(outcome.result, Err(ExerciserError::Connection(_))));
    assert_eq!(outcome.exit_code(), 3);
    assert_eq!(connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_server_dropping_sessions_is_a_connection_error() {
    // Accepts the TCP connection but never speaks OPC-UA
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let port = listener.local_addr().expect("Failed to get addr").port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let pki = tempfile::tempdir().expect("Failed to create pki dir");
    let settings = Settings {
        server_endpoint: format!("opc.tcp://127.0.0.1:{}", port),
        precheck: false,
        pki_dir: pki.path().to_path_buf(),
        ..Default::default()
    };

    let exerciser = GatewayExerciser::new(OpcUaConnector, settings);
    let run = exerciser.run();
    let outcome = tokio::time::timeout(Duration::from_secs(60), run)
        .await
        .expect("connect attempt must not hang");

    assert!(matches!(outcome.result, Err(ExerciserError::Connection(_))), "{:?}", outcome.result);
    assert_eq!(outcome.exit_code(), 3);
    assert!(outcome.report.gateway.is_none());
}
