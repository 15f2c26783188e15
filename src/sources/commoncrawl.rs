// Common Crawl URL index lookup
// The index answers with one JSON object per line

use super::{host_with_port, parse_target, Cancellation, Source, SourceKind};
use crate::errors::SourceError;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const INDEX_SERVER: &str = "https://index.commoncrawl.org";
const DEFAULT_INDEX: &str = "CC-MAIN-2024-10";

pub struct CommonCrawlSource {
    transport: Arc<Transport>,
    server: String,
    index: String,
}

impl CommonCrawlSource {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self::with_server(transport, INDEX_SERVER, DEFAULT_INDEX)
    }

    pub fn with_server(transport: Arc<Transport>, server: &str, index: &str) -> Self {
        Self {
            transport,
            server: server.trim_end_matches('/').to_string(),
            index: index.to_string(),
        }
    }
}

#[async_trait]
impl Source for CommonCrawlSource {
    fn name(&self) -> &'static str {
        "commoncrawl"
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
            "{}/{}-index?url={}/*&output=json",
            self.server,
            self.index,
            host_with_port(&parsed)
        );
        let resp = self.transport.get(&api_url).await?;
        if resp.status != 200 {
            return Err(SourceError::UnexpectedStatus {
                source_name: self.name().to_string(),
                status: resp.status,
            });
        }
        Ok(parse_index_lines(&resp.body))
    }
}

/// Lines that fail to parse are skipped
fn parse_index_lines(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|record| record.get("url").and_then(Value::as_str).map(str::to_string))
        .collect()
}
