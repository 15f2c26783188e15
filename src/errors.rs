// Error types for apihunter
// Transport, source, configuration, export and scan-level failures

use thiserror::Error;

/// Failures of a single outbound HTTP call.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("too many redirects (>{max_redirects}) for {url}")]
    TooManyRedirects { url: String, max_redirects: usize },
}

/// A discovery source failed. Captured into the source's ModuleStat, never fatal.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{source_name} returned status {status}")]
    UnexpectedStatus { source_name: String, status: u16 },

    #[error("invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("cancelled")]
    Cancelled,
}

/// Invalid configuration. Raised before any source is dispatched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported auth type: {0}")]
    UnsupportedAuthType(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("requests per second must be at least 1")]
    InvalidRate,

    #[error("--passive-only and --active-only cannot be combined")]
    ConflictingModes,

    #[error("invalid header (expected 'Name: value'): {0}")]
    InvalidHeader(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that stop a login attempt before its outcome is known.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0} login needs a login URL")]
    MissingLoginUrl(String),

    #[error("could not encode login body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("login page returned status {0}")]
    CsrfPage(u16),
}

/// Errors that abort a whole scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("auto-login failed: {0}")]
    Auth(String),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
