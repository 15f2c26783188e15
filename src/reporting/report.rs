// Human-readable and machine-readable scan reports
// Writes report.md, results.json and endpoints.csv

use super::{write_file, Exporter};
use crate::analyzer::EndpointGroup;
use crate::errors::ExportError;
use crate::models::{Endpoint, RiskLevel, ScanResult};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub struct ReportExporter;

/// Escape CSV field to prevent formula injection attacks
/// Cells starting with =, +, -, @, or tab are prefixed with single quote
pub fn escape_csv_field(field: &str) -> String {
    let Some(first_char) = field.chars().next() else {
        return String::new();
    };
    let needs_escaping = matches!(first_char, '=' | '+' | '-' | '@' | '\t');

    // Also quote if field contains comma, quotes or a line break
    if needs_escaping {
        format!("\"'{}\"", field.replace('"', "\"\""))
    } else if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn join_methods(ep: &Endpoint) -> String {
    ep.methods
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn endpoint_lines(out: &mut String, endpoints: &[Endpoint], risk: RiskLevel) {
    for ep in endpoints.iter().filter(|ep| ep.risk == risk) {
        let _ = writeln!(
            out,
            "- `{}` {} [{}]",
            join_methods(ep),
            ep.normalized_path,
            ep.tags.join(", ")
        );
    }
}

pub fn render_markdown(result: &ScanResult, groups: &[EndpointGroup]) -> String {
    let stats = &result.statistics;
    let mut md = String::new();

    let _ = writeln!(md, "# APIHunter Report - {}\n", result.target);
    let _ = writeln!(
        md,
        "**Scan Time:** {} - {}\n",
        result.start_time.format("%Y-%m-%d %H:%M:%S"),
        result.end_time.format("%H:%M:%S")
    );

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    let _ = writeln!(md, "| Raw URLs | {} |", stats.total_urls);
    let _ = writeln!(md, "| Total Endpoints | {} |", stats.unique_endpoints);
    let _ = writeln!(md, "| Critical | {} |", stats.critical_count);
    let _ = writeln!(md, "| High | {} |", stats.high_count);
    let _ = writeln!(md, "| Medium | {} |", stats.medium_count);
    let _ = writeln!(md, "| Low | {} |\n", stats.low_count);

    md.push_str("## Module Results\n\n");
    for (name, stat) in &result.module_stats {
        let status = match &stat.error {
            Some(err) => format!("ERROR: {}", err),
            None => "OK".to_string(),
        };
        let _ = writeln!(
            md,
            "- **{}**: {} URLs ({:.2}s) - {}",
            name,
            stat.urls,
            stat.duration.as_secs_f64(),
            status
        );
    }
    md.push('\n');

    if !groups.is_empty() {
        md.push_str("## Resource Groups\n\n");
        for group in groups {
            let _ = writeln!(md, "- **{}**: {} endpoints", group.name, group.endpoints.len());
        }
        md.push('\n');
    }

    md.push_str("## Critical Endpoints\n\n");
    endpoint_lines(&mut md, &result.endpoints, RiskLevel::Critical);
    md.push('\n');

    md.push_str("## High Risk Endpoints\n\n");
    endpoint_lines(&mut md, &result.endpoints, RiskLevel::High);
    md
}

/// One row per (endpoint, method)
pub fn render_csv(result: &ScanResult) -> String {
    let mut csv = String::from("Method,URL,Risk,Tags\n");
    for ep in &result.endpoints {
        let tags = ep.tags.join(";");
        for method in &ep.methods {
            let _ = writeln!(
                csv,
                "{},{},{},{}",
                escape_csv_field(&method.to_string()),
                escape_csv_field(&ep.url),
                escape_csv_field(&ep.risk.to_string()),
                escape_csv_field(&tags)
            );
        }
    }
    csv
}

impl Exporter for ReportExporter {
    fn name(&self) -> &'static str {
        "report"
    }

    fn export(
        &self,
        result: &ScanResult,
        groups: &[EndpointGroup],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let json = serde_json::to_vec_pretty(result)?;
        Ok(vec![
            write_file(dir, "report.md", render_markdown(result, groups).as_bytes())?,
            write_file(dir, "results.json", &json)?,
            write_file(dir, "endpoints.csv", render_csv(result).as_bytes())?,
        ])
    }
}
