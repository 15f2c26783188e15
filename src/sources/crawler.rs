// Same-host link crawler
//
// Depth-first over an explicit work stack, bounded by max depth and max page count.
// Pages that answer 200 are recorded; <form action> and <script src> targets are
// recorded without being fetched. Only links on the target's host are followed.

use super::{parse_target, Cancellation, Source, SourceKind};
use crate::errors::SourceError;
use crate::transport::Transport;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;
use url::Url;

pub const DEFAULT_MAX_PAGES: usize = 500;

pub struct CrawlerSource {
    transport: Arc<Transport>,
    max_depth: usize,
    max_pages: usize,
    visited: Mutex<HashSet<String>>,
}

/// Absolute URLs pulled out of one HTML page
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub links: Vec<String>,
    pub forms: Vec<String>,
    pub scripts: Vec<String>,
}

impl CrawlerSource {
    pub fn new(transport: Arc<Transport>, max_depth: usize) -> Self {
        Self::with_limits(transport, max_depth, DEFAULT_MAX_PAGES)
    }

    pub fn with_limits(transport: Arc<Transport>, max_depth: usize, max_pages: usize) -> Self {
        Self {
            transport,
            max_depth,
            max_pages,
            visited: Mutex::new(HashSet::new()),
        }
    }

    /// Mark a URL visited; false if it already was.
    fn mark_visited(&self, url: &str) -> bool {
        let mut visited = self.visited.lock().unwrap_or_else(|e| e.into_inner());
        visited.insert(url.to_string())
    }

    fn reset(&self) {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[async_trait]
impl Source for CrawlerSource {
    fn name(&self) -> &'static str {
        "crawler"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Active
    }

    async fn run(&self, cancel: &Cancellation, target: &str) -> Result<Vec<String>, SourceError> {
        let root = parse_target(target)?;
        self.reset();

        let mut urls = Vec::new();
        let mut stack = vec![(strip_fragment(root.clone()), 0usize)];
        let mut pages = 0usize;

        while let Some((page, depth)) = stack.pop() {
            if cancel.is_cancelled() || pages >= self.max_pages {
                break;
            }
            if depth > self.max_depth || !self.mark_visited(page.as_str()) {
                continue;
            }
            pages += 1;

            let resp = match self.transport.get(page.as_str()).await {
                Ok(r) => r,
                Err(e) => {
                    debug!("crawler: {} failed: {}", page, e);
                    continue;
                }
            };
            if resp.status != 200 {
                continue;
            }
            urls.push(page.to_string());

            let found = extract_page_links(&resp.body, &page);
            urls.extend(found.forms);
            urls.extend(found.scripts);
            // Reversed so the first link on the page is expanded first
            for link in found.links.into_iter().rev() {
                if let Ok(next) = Url::parse(&link) {
                    if same_host(&root, &next) {
                        stack.push((next, depth + 1));
                    }
                }
            }
        }
        debug!("crawler visited {} pages", pages);
        Ok(urls)
    }
}

/// Resolve href/action/src attributes of a page against its URL
pub fn extract_page_links(html: &str, base: &Url) -> PageLinks {
    let doc = Html::parse_document(html);
    let collect = |css: &str, attr: &str| -> Vec<String> {
        let Ok(selector) = Selector::parse(css) else {
            return Vec::new();
        };
        doc.select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .filter_map(|raw| resolve(base, raw))
            .collect()
    };
    PageLinks {
        links: collect("a[href]", "href"),
        forms: collect("form[action]", "action"),
        scripts: collect("script[src]", "src"),
    }
}

fn resolve(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let joined = base.join(raw).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    Some(strip_fragment(joined).to_string())
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}
