//! Network helpers used before any OPC-UA traffic is sent

pub mod precheck;
