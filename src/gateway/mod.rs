//! Modbus gateway plugin model: its method commands and how it is found

pub mod command;
pub mod resolve;

pub use command::GatewayCommand;
pub use resolve::{resolve_gateway, MethodDirectory};
