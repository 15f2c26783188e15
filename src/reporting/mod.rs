// Reporting and output for apihunter
//
// Exporters read the frozen ScanResult and write files into the output directory:
//
//   openapi  -> openapi.json
//   postman  -> postman_collection.json
//   urls     -> urls_all.txt, urls_critical.txt, urls_high.txt, urls_api.txt, urls_js.txt
//   report   -> report.md, results.json, endpoints.csv

pub mod openapi;
pub mod postman;
pub mod report;
pub mod urls;

pub use openapi::OpenApiExporter;
pub use postman::PostmanExporter;
pub use report::{escape_csv_field, ReportExporter};
pub use urls::UrlExporter;

use crate::analyzer::EndpointGroup;
use crate::errors::{ConfigError, ExportError};
use crate::models::ScanResult;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub trait Exporter {
    fn name(&self) -> &'static str;

    /// Write this exporter's files into `dir`, returning the paths written
    fn export(
        &self,
        result: &ScanResult,
        groups: &[EndpointGroup],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    OpenApi,
    Postman,
    Urls,
    Report,
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openapi" => Ok(Format::OpenApi),
            "postman" => Ok(Format::Postman),
            "urls" => Ok(Format::Urls),
            "report" => Ok(Format::Report),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::OpenApi => write!(f, "openapi"),
            Format::Postman => write!(f, "postman"),
            Format::Urls => write!(f, "urls"),
            Format::Report => write!(f, "report"),
        }
    }
}

impl Format {
    pub fn exporter(&self) -> Box<dyn Exporter> {
        match self {
            Format::OpenApi => Box::new(OpenApiExporter),
            Format::Postman => Box::new(PostmanExporter),
            Format::Urls => Box::new(UrlExporter),
            Format::Report => Box::new(ReportExporter),
        }
    }
}

/// Parse format names, dropping repeats but keeping the given order
pub fn parse_formats(names: &[String]) -> Result<Vec<Format>, ConfigError> {
    let mut formats = Vec::new();
    for name in names.iter().filter(|n| !n.trim().is_empty()) {
        let format: Format = name.parse()?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

/// Run every requested exporter into `dir`, creating it if needed
pub fn export_all(
    result: &ScanResult,
    groups: &[EndpointGroup],
    dir: &Path,
    formats: &[Format],
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for format in formats {
        let exporter = format.exporter();
        let files = exporter.export(result, groups, dir)?;
        debug!("{} exporter wrote {} files", exporter.name(), files.len());
        written.extend(files);
    }
    Ok(written)
}

pub(crate) fn write_file(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf, ExportError> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}
