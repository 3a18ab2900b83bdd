//! Export Engine
//!
//! Writes a run report to CSV or JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::report::{CallRecord, RunReport};

const CSV_HEADER: [&str; 6] = ["method", "arguments", "status", "outputs", "duration_ms", "error"];

/// Flat CSV row for one call
#[derive(Serialize)]
struct ExportCall<'a> {
    method: &'a str,
    arguments: String,
    status: &'a str,
    outputs: String,
    duration_ms: u64,
    error: &'a str,
}

impl<'a> From<&'a CallRecord> for ExportCall<'a> {
    fn from(call: &'a CallRecord) -> Self {
        Self {
            method: &call.method_id,
            arguments: call.arguments.join(" "),
            status: call.status.as_deref().unwrap_or(""),
            outputs: call.outputs.join("; "),
            duration_ms: call.duration_ms,
            error: call.error.as_deref().unwrap_or(""),
        }
    }
}

/// Export engine functions
pub struct ExportEngine;

impl ExportEngine {
    /// Pick the format from the file extension (`.csv`, anything else is JSON)
    pub fn export_report(report: &RunReport, path: &Path) -> Result<()> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        let written = if is_csv {
            Self::export_report_to_csv(report, path)
        } else {
            Self::export_report_to_json(report, path)
        };
        written?;

        tracing::info!("Wrote run report to {:?}", path);
        Ok(())
    }

    /// One row per gateway call
    pub fn export_report_to_csv(report: &RunReport, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .context("Failed to create CSV writer")?;

        // Headers are only derived from the first serialized row
        if report.calls.is_empty() {
            wtr.write_record(CSV_HEADER)
                .context("Failed to write CSV header")?;
        }

        for call in &report.calls {
            wtr.serialize(ExportCall::from(call))
                .context("Failed to serialize call to CSV")?;
        }

        wtr.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }

    /// The full report including gateway info and verdict
    pub fn export_report_to_json(report: &RunReport, path: &Path) -> Result<()> {
        let file = File::create(path).context("Failed to create JSON file")?;
        serde_json::to_writer_pretty(file, report)
            .context("Failed to write JSON data")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayCommand;

    fn report() -> RunReport {
        let mut report = RunReport::new("opc.tcp://localhost:4840", "172.0.0.2:502");
        let command = GatewayCommand::WriteRegister { register: 3, value: 1 };
        report.calls.push(CallRecord {
            command,
            method_id: command.method_id(2),
            arguments: command.arguments("172.0.0.2:502"),
            status: Some("Good".to_string()),
            outputs: vec!["ok".to_string()],
            duration_ms: 12,
            error: None,
        });
        report
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        ExportEngine::export_report(&report(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("method,arguments,status,outputs,duration_ms,error"));
        assert_eq!(lines.next(), Some("2:write_register,172.0.0.2:502 3 1,Good,ok,12,"));
    }

    #[test]
    fn test_csv_export_without_calls_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aborted.csv");
        let report = RunReport::new("opc.tcp://localhost:4840", "172.0.0.2:502");
        ExportEngine::export_report(&report, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["method,arguments,status,outputs,duration_ms,error"]);
    }

    #[test]
    fn test_json_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        ExportEngine::export_report(&report(), &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["device"], "172.0.0.2:502");
        assert_eq!(value["calls"][0]["method_id"], "2:write_register");
    }
}
