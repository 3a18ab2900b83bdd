//! Gateway method commands
//!
//! Each remote operation the Modbus plugin exposes is one variant with a
//! typed payload. Conversion to the plugin's calling convention (browse
//! name plus positional string arguments, device address first) happens
//! only at [`GatewayCommand::arguments`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum GatewayCommand {
    Connect,
    WriteCoil { coil: u16, value: bool },
    ReadCoils { start: u16, count: u16 },
    ReadDiscreteInputs { start: u16, count: u16 },
    WriteRegister { register: u16, value: u16 },
    ReadHoldingRegisters { start: u16, count: u16 },
    ReadInputRegisters { start: u16, count: u16 },
    Disconnect,
}

impl GatewayCommand {
    /// Browse name of the method on the gateway object
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::WriteCoil { .. } => "write_coil",
            Self::ReadCoils { .. } => "read_coils",
            Self::ReadDiscreteInputs { .. } => "read_discrete_inputs",
            Self::WriteRegister { .. } => "write_register",
            Self::ReadHoldingRegisters { .. } => "read_holding_registers",
            Self::ReadInputRegisters { .. } => "read_input_registers",
            Self::Disconnect => "disconnect",
        }
    }

    /// `ns:name` identifier, as the plugin documents its methods
    pub fn method_id(&self, namespace: u16) -> String {
        format!("{}:{}", namespace, self.method_name())
    }

    /// Positional arguments, device address first
    pub fn arguments(&self, device: &str) -> Vec<String> {
        let mut args = vec![device.to_string()];
        match *self {
            Self::Connect | Self::Disconnect => {}
            Self::WriteCoil { coil, value } => {
                args.push(coil.to_string());
                args.push(if value { "1" } else { "0" }.to_string());
            }
            Self::WriteRegister { register, value } => {
                args.push(register.to_string());
                args.push(value.to_string());
            }
            Self::ReadCoils { start, count }
            | Self::ReadDiscreteInputs { start, count }
            | Self::ReadHoldingRegisters { start, count }
            | Self::ReadInputRegisters { start, count } => {
                args.push(start.to_string());
                args.push(count.to_string());
            }
        }
        args
    }

    /// The fixed battery run against every device, in call order
    pub fn standard_battery() -> [GatewayCommand; 8] {
        [
            Self::Connect,
            Self::WriteCoil { coil: 17, value: true },
            Self::ReadCoils { start: 10, count: 11 },
            Self::ReadDiscreteInputs { start: 20, count: 11 },
            Self::WriteRegister { register: 3, value: 1 },
            Self::ReadHoldingRegisters { start: 25, count: 10 },
            Self::ReadInputRegisters { start: 30, count: 10 },
            Self::Disconnect,
        ]
    }
}

impl std::fmt::Display for GatewayCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method_name())
    }
}
