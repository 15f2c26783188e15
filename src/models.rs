// Core data models for apihunter
// Endpoints, parameters, risk levels and per-scan aggregates

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Supported HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    HEAD,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GET => write!(f, "GET"),
            Method::POST => write!(f, "POST"),
            Method::PUT => write!(f, "PUT"),
            Method::DELETE => write!(f, "DELETE"),
            Method::PATCH => write!(f, "PATCH"),
            Method::OPTIONS => write!(f, "OPTIONS"),
            Method::HEAD => write!(f, "HEAD"),
        }
    }
}

/// Parameter location in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
        }
    }
}

/// Semantic type of a detected parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    String,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Integer => write!(f, "integer"),
            ParamType::String => write!(f, "string"),
        }
    }
}

/// Represents a parameter for an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl Parameter {
    /// Path parameters are always required.
    pub fn path(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            location: ParameterLocation::Path,
            required: true,
            example: None,
        }
    }

    /// Query parameters are always optional strings.
    pub fn query(name: impl Into<String>, example: Option<String>) -> Self {
        Self {
            name: name.into(),
            param_type: ParamType::String,
            location: ParameterLocation::Query,
            required: false,
            example,
        }
    }
}

/// Ordinal risk tier, Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// One discovered API route.
///
/// Starts life as a bare URL seeded by the orchestrator and is enriched in place by
/// the normalizer (path, parameters) and the classifier (methods, risk, tags).
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub url: String,
    pub path: String,
    pub normalized_path: String,
    pub methods: Vec<Method>,
    pub parameters: Vec<Parameter>,
    pub query_params: Vec<Parameter>,
    pub tags: Vec<String>,
    pub risk: RiskLevel,
    pub source: String,
    pub discovered_at: DateTime<Utc>,
}

impl Endpoint {
    /// Create a bare endpoint carrying only its raw URL and origin
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: String::new(),
            normalized_path: String::new(),
            methods: Vec::new(),
            parameters: Vec::new(),
            query_params: Vec::new(),
            tags: Vec::new(),
            risk: RiskLevel::Low,
            source: source.into(),
            discovered_at: Utc::now(),
        }
    }

    /// Path followed by query parameters, in that order
    pub fn all_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().chain(self.query_params.iter())
    }
}

/// Outcome of one discovery source run
#[derive(Debug, Clone, Serialize)]
pub struct ModuleStat {
    pub name: String,
    pub urls: usize,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModuleStat {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub total_urls: usize,
    pub unique_endpoints: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
}

impl ScanStats {
    pub fn from_endpoints(total_urls: usize, endpoints: &[Endpoint]) -> Self {
        let mut stats = ScanStats {
            total_urls,
            unique_endpoints: endpoints.len(),
            ..Default::default()
        };
        for ep in endpoints {
            match ep.risk {
                RiskLevel::Critical => stats.critical_count += 1,
                RiskLevel::High => stats.high_count += 1,
                RiskLevel::Medium => stats.medium_count += 1,
                RiskLevel::Low => stats.low_count += 1,
            }
        }
        stats
    }
}

/// Aggregate root of one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub target: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub endpoints: Vec<Endpoint>,
    pub script_files: Vec<String>,
    pub statistics: ScanStats,
    pub module_stats: BTreeMap<String, ModuleStat>,
}

impl ScanResult {
    pub fn new(target: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            target: target.into(),
            start_time: now,
            end_time: now,
            endpoints: Vec::new(),
            script_files: Vec::new(),
            statistics: ScanStats::default(),
            module_stats: BTreeMap::new(),
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
