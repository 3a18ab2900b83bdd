//! Per-run record of what was called and what came back

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gateway::GatewayCommand;

/// One gateway method invocation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallRecord {
    pub command: GatewayCommand,
    pub method_id: String,
    pub arguments: Vec<String>,
    /// Translated status, absent when the call never produced one
    pub status: Option<String>,
    pub outputs: Vec<String>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl CallRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    CallsFailed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GatewayInfo {
    pub node_id: String,
    pub display_name: String,
    pub methods: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub endpoint: String,
    pub device: String,
    pub gateway: Option<GatewayInfo>,
    pub calls: Vec<CallRecord>,
    pub verdict: Verdict,
    pub error: Option<String>,
}

impl RunReport {
    pub fn new(endpoint: &str, device: &str) -> Self {
        Self {
            started_at: Utc::now(),
            endpoint: endpoint.to_string(),
            device: device.to_string(),
            gateway: None,
            calls: Vec::new(),
            verdict: Verdict::Aborted,
            error: None,
        }
    }

    pub fn failed_calls(&self) -> usize {
        self.calls.iter().filter(|c| !c.succeeded()).count()
    }

    /// Human-readable summary table
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Endpoint : {}\n", self.endpoint));
        out.push_str(&format!("Device   : {}\n", self.device));
        match &self.gateway {
            Some(gw) => out.push_str(&format!("Gateway  : {} [{}], {} methods\n", gw.display_name, gw.node_id, gw.methods)),
            None => out.push_str("Gateway  : <unresolved>\n"),
        }
        out.push('\n');

        for call in &self.calls {
            let mark = if call.succeeded() { "ok " } else { "ERR" };
            let detail = match &call.error {
                Some(e) => e.clone(),
                None => format!(
                    "{} -> [{}]",
                    call.status.as_deref().unwrap_or("-"),
                    call.outputs.join(", ")
                ),
            };
            out.push_str(&format!(
                "{} {:<24} ({}) {:>5}ms  {}\n",
                mark,
                call.method_id,
                call.arguments.join(", "),
                call.duration_ms,
                detail
            ));
        }

        out.push_str(&format!(
            "\n{} calls, {} failed, verdict: {:?}\n",
            self.calls.len(),
            self.failed_calls(),
            self.verdict
        ));
        if let Some(e) = &self.error {
            out.push_str(&format!("error: {}\n", e));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(error: Option<&str>) -> CallRecord {
        let command = GatewayCommand::ReadCoils { start: 10, count: 11 };
        CallRecord {
            command,
            method_id: command.method_id(2),
            arguments: command.arguments("172.0.0.2:502"),
            status: error.is_none().then(|| "Good".to_string()),
            outputs: vec!["[true, false]".to_string()],
            duration_ms: 4,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_summary_lists_each_call() {
        let mut report = RunReport::new("opc.tcp://localhost:4840", "172.0.0.2:502");
        report.calls.push(record(None));
        report.calls.push(record(Some("Bad - Timeout")));
        report.verdict = Verdict::CallsFailed;

        assert_eq!(report.failed_calls(), 1);
        let text = report.render_summary();
        assert!(text.contains("Gateway  : <unresolved>"));
        assert!(text.contains("2:read_coils"));
        assert!(text.contains("172.0.0.2:502, 10, 11"));
        assert!(text.contains("ERR"));
        assert!(text.contains("2 calls, 1 failed"));
    }

    #[test]
    fn test_report_serializes_command_payload() {
        let mut report = RunReport::new("opc.tcp://localhost:4840", "172.0.0.2:502");
        report.calls.push(record(None));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["calls"][0]["command"]["method"], "read_coils");
        assert_eq!(json["calls"][0]["command"]["start"], 10);
        assert_eq!(json["verdict"], "aborted");
    }
}
