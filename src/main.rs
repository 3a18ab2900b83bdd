//! Modbus Gateway Exerciser
//!
//! Drives the Modbus plugin of an OPC-UA server through its full method
//! battery against one device and reports what each call returned.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modbus_gateway_exerciser::cli::Cli;
use modbus_gateway_exerciser::export::ExportEngine;
use modbus_gateway_exerciser::opcua::OpcUaConnector;
use modbus_gateway_exerciser::{ExerciserError, GatewayExerciser};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);

    // Optional file log next to the console output
    let (file_layer, _guard) = match &cli.log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
            let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "exerciser.log".into());
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(EnvFilter::builder().with_default_directive(level.into()).from_env_lossy())
        .init();

    // Install panic hook to log panics
    let next = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("Application panic: {}", info);
        next(info);
    }));

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            let err = ExerciserError::Configuration(format!("{:#}", e));
            tracing::error!("{}", err);
            return ExitCode::from(err.exit_code());
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let exerciser = GatewayExerciser::new(OpcUaConnector, settings);
    tracing::info!(
        "Exercising {} via {} (security: {})",
        exerciser.settings().device_address,
        exerciser.settings().server_endpoint,
        exerciser.settings().security.mode
    );
    let cancel = exerciser.cancel_token();

    let outcome = runtime.block_on(async {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing after the current call");
                cancel.cancel();
            }
        });
        exerciser.run().await
    });

    println!("{}", outcome.report.render_summary());

    if let Some(path) = &cli.report {
        if let Err(e) = ExportEngine::export_report(&outcome.report, path) {
            tracing::error!("Failed to write report {:?}: {:#}", path, e);
        }
    }

    tracing::info!("done");
    ExitCode::from(outcome.exit_code())
}
