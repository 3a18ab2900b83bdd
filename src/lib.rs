//! Modbus gateway exerciser
//!
//! Functional check for a Modbus gateway plugin living inside an OPC-UA
//! server: connect, find the plugin object, call each of its Modbus
//! methods against one device, report, disconnect.

pub mod cli;
pub mod config;
pub mod error;
pub mod exerciser;
pub mod export;
pub mod gateway;
pub mod network;
pub mod opcua;
pub mod report;

pub use error::{ExerciserError, ResolutionError};
pub use exerciser::{GatewayExerciser, RunOutcome};
