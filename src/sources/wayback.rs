// Web archive (Wayback Machine) CDX lookup
// Returns every archived URL under the target host

use super::{host_with_port, parse_target, Cancellation, Source, SourceKind};
use crate::errors::SourceError;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

pub struct WaybackSource {
    transport: Arc<Transport>,
    endpoint: String,
}

impl WaybackSource {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self::with_endpoint(transport, CDX_ENDPOINT)
    }

    /// Point the source at another CDX server
    pub fn with_endpoint(transport: Arc<Transport>, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Source for WaybackSource {
    fn name(&self) -> &'static str {
        "wayback"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Passive
    }

    async fn run(&self, cancel: &Cancellation, target: &str) -> Result<Vec<String>, SourceError> {
        let parsed = parse_target(target)?;
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        let api_url = format!(
            "{}?url={}/*&output=json&collapse=urlkey&fl=original",
            self.endpoint,
            host_with_port(&parsed)
        );
        let resp = self.transport.get(&api_url).await?;
        if resp.status != 200 {
            return Err(SourceError::UnexpectedStatus {
                source_name: self.name().to_string(),
                status: resp.status,
            });
        }
        let urls = parse_cdx(&resp.body);
        debug!("wayback returned {} URLs", urls.len());
        Ok(urls)
    }
}

/// Rows of `[original]`; the first row is the header.
fn parse_cdx(body: &str) -> Vec<String> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    let rows: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("wayback: unparseable CDX response: {}", e);
            return Vec::new();
        }
    };
    rows.as_array()
        .map(|rows| {
            rows.iter()
                .skip(1)
                .filter_map(|row| row.get(0).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_header_row() {
        let body = r#"[["original"],["https://x.com/api/users"],["https://x.com/login"]]"#;
        assert_eq!(
            parse_cdx(body),
            vec!["https://x.com/api/users", "https://x.com/login"]
        );
    }

    #[test]
    fn malformed_body_yields_nothing() {
        assert!(parse_cdx("<html>rate limited</html>").is_empty());
        assert!(parse_cdx("").is_empty());
        assert!(parse_cdx(r#"{"not":"rows"}"#).is_empty());
    }

    #[test]
    fn ignores_empty_rows() {
        let body = r#"[["original"],[],["https://x.com/a"]]"#;
        assert_eq!(parse_cdx(body), vec!["https://x.com/a"]);
    }
}
