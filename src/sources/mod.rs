// Discovery sources for apihunter
//
// Each source turns one technique into a list of raw candidate URLs:
//
//   wayback      (passive) web archive CDX index
//   commoncrawl  (passive) Common Crawl URL index
//   sitemap      (active)  robots.txt + sitemap probing
//   crawler      (active)  same-host link crawl
//   scripts      (active)  endpoint strings in client-side scripts
//
// Sources only talk to the network through the shared Transport. A parse failure
// yields whatever was collected so far; only transport failures and unexpected
// statuses become SourceErrors.

pub mod commoncrawl;
pub mod crawler;
pub mod scripts;
pub mod sitemap;
pub mod wayback;

pub use commoncrawl::CommonCrawlSource;
pub use crawler::CrawlerSource;
pub use scripts::ScriptSource;
pub use sitemap::SitemapSource;
pub use wayback::WaybackSource;

use crate::errors::SourceError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Third-party index lookups; never touches the target
    Passive,
    /// Sends requests to the target itself
    Active,
}

/// Cooperative cancellation flag shared by every source of one scan.
///
/// Sources check it between requests; in-flight requests are not aborted.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identifier, used as the ModuleStat key
    fn name(&self) -> &'static str;

    fn kind(&self) -> SourceKind;

    async fn run(&self, cancel: &Cancellation, target: &str) -> Result<Vec<String>, SourceError>;
}

/// Parse the scan target, rejecting anything without a host
pub(crate) fn parse_target(target: &str) -> Result<Url, SourceError> {
    let url = Url::parse(target).map_err(|_| SourceError::InvalidTarget(target.to_string()))?;
    if url.host_str().is_none() {
        return Err(SourceError::InvalidTarget(target.to_string()));
    }
    Ok(url)
}

/// host[:port] of a URL, as index services expect it
pub(crate) fn host_with_port(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// scheme://host[:port] of a URL
pub(crate) fn origin_of(url: &Url) -> String {
    format!("{}://{}", url.scheme(), host_with_port(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_shared_between_clones() {
        let cancel = Cancellation::new();
        let other = cancel.clone();
        assert!(!other.is_cancelled());
        cancel.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn target_helpers() {
        let url = parse_target("http://localhost:8080/app").unwrap();
        assert_eq!(host_with_port(&url), "localhost:8080");
        assert_eq!(origin_of(&url), "http://localhost:8080");
        assert!(parse_target("mailto:someone@example.com").is_err());
        assert!(parse_target("nonsense").is_err());
    }
}
