//! Status Code translation helper
//!
//! Maps the OPC-UA status codes a method call can realistically return to
//! friendly descriptions. Anything not in the table falls back to its
//! severity plus the raw hex value.

use opcua::types::StatusCode;

/// Translate a StatusCode into a user-friendly string
pub fn translate_status_code(code: StatusCode) -> String {
    translate_status_bits(code.bits())
}

pub fn translate_status_bits(code: u32) -> String {
    let msg = match code {
        0x00000000 => Some("Good"),

        0x40000000 => Some("Uncertain"),

        0x80010000 => Some("Bad - Unexpected Error"),
        0x80020000 => Some("Bad - Internal Error"),
        0x80030000 => Some("Bad - Out Of Memory"),
        0x80040000 => Some("Bad - Resource Unavailable"),
        0x80050000 => Some("Bad - Communication Error"),
        0x80060000 => Some("Bad - Encoding Error"),
        0x80070000 => Some("Bad - Decoding Error"),
        0x800A0000 => Some("Bad - Timeout"),
        0x800B0000 => Some("Bad - Service Unsupported"),
        0x800C0000 => Some("Bad - Shutdown"),
        0x800D0000 => Some("Bad - Server Not Connected"),
        0x800F0000 => Some("Bad - Nothing To Do"),
        0x80100000 => Some("Bad - Too Many Operations"),
        0x80120000 => Some("Bad - Certificate Invalid"),
        0x80130000 => Some("Bad - Security Checks Failed"),
        0x801A0000 => Some("Bad - Certificate Untrusted"),
        0x801F0000 => Some("Bad - User Access Denied"),
        0x80250000 => Some("Bad - Session ID Invalid"),
        0x80260000 => Some("Bad - Session Closed"),
        0x80330000 => Some("Bad - Node ID Invalid"),
        0x80340000 => Some("Bad - Node ID Unknown"),
        0x803A0000 => Some("Bad - Not Readable"),
        0x803B0000 => Some("Bad - Not Writable"),
        0x803C0000 => Some("Bad - Out Of Range"),
        0x803D0000 => Some("Bad - Not Supported"),
        0x803E0000 => Some("Bad - Not Found"),
        0x80740000 => Some("Bad - Type Mismatch"),
        0x80750000 => Some("Bad - Method Invalid"),
        0x80760000 => Some("Bad - Arguments Missing"),
        0x80AB0000 => Some("Bad - Invalid Argument"),
        0x80E50000 => Some("Bad - Too Many Arguments"),
        0x81110000 => Some("Bad - Not Executable"),
        _ => None,
    };

    if let Some(m) = msg {
        return m.to_string();
    }

    let severity = match code >> 30 {
        0 => "Good",
        1 => "Uncertain",
        _ => "Bad",
    };

    format!("{} (0x{:08X})", severity, code)
}
