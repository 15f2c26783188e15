// Plain URL lists, one URL per line, for feeding other tools

use super::{write_file, Exporter};
use crate::analyzer::EndpointGroup;
use crate::errors::ExportError;
use crate::models::{Endpoint, RiskLevel, ScanResult};
use std::path::{Path, PathBuf};

const API_MARKERS: &[&str] = &["/api/", "/v1/", "/v2/", "/v3/", "/graphql", "/rest/"];

pub struct UrlExporter;

pub fn is_api_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    API_MARKERS.iter().any(|m| lower.contains(m))
}

fn urls_where(result: &ScanResult, keep: impl Fn(&Endpoint) -> bool) -> Vec<&str> {
    result
        .endpoints
        .iter()
        .filter(|ep| keep(ep))
        .map(|ep| ep.url.as_str())
        .collect()
}

impl Exporter for UrlExporter {
    fn name(&self) -> &'static str {
        "urls"
    }

    fn export(
        &self,
        result: &ScanResult,
        _groups: &[EndpointGroup],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let lists: [(&str, Vec<&str>); 5] = [
            ("urls_all.txt", urls_where(result, |_| true)),
            (
                "urls_critical.txt",
                urls_where(result, |ep| ep.risk == RiskLevel::Critical),
            ),
            (
                "urls_high.txt",
                urls_where(result, |ep| ep.risk == RiskLevel::High),
            ),
            ("urls_api.txt", urls_where(result, |ep| is_api_url(&ep.url))),
            (
                "urls_js.txt",
                result.script_files.iter().map(String::as_str).collect(),
            ),
        ];

        let mut written = Vec::new();
        for (name, urls) in lists {
            if urls.is_empty() {
                continue;
            }
            let mut content = urls.join("\n");
            content.push('\n');
            written.push(write_file(dir, name, content.as_bytes())?);
        }
        Ok(written)
    }
}
