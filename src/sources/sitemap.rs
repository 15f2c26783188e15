// robots.txt and sitemap probing
// Disallowed paths and every <loc> of every reachable sitemap become candidate URLs

use super::{parse_target, Cancellation, Source, SourceKind};
use crate::errors::SourceError;
use crate::transport::Transport;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap1.xml",
    "/sitemap-index.xml",
    "/sitemaps/sitemap.xml",
    "/sitemap/sitemap.xml",
    "/sitemap.xml.gz",
    "/sitemap_index.xml.gz",
    "/sitemap.php",
    "/sitemap.txt",
    "/sitemap",
    "/site-map.xml",
    "/sitemapindex.xml",
    "/sitemap/index.xml",
    "/post-sitemap.xml",
    "/page-sitemap.xml",
    "/product-sitemap.xml",
    "/category-sitemap.xml",
    "/news-sitemap.xml",
    "/video-sitemap.xml",
    "/image-sitemap.xml",
];

lazy_static! {
    static ref LOC_PATTERN: Regex = Regex::new(r"<loc>\s*([^<\s]+)\s*</loc>").unwrap();
}

pub struct SitemapSource {
    transport: Arc<Transport>,
}

/// Per-run bookkeeping: collected URLs in first-seen order plus fetched sitemaps
#[derive(Default)]
struct Collected {
    urls: Vec<String>,
    seen: HashSet<String>,
    fetched: HashSet<String>,
}

impl Collected {
    fn push(&mut self, url: String) {
        if self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }
}

impl SitemapSource {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    async fn fetch_robots(&self, cancel: &Cancellation, root: &str, out: &mut Collected) {
        let resp = match self.transport.get(&format!("{}/robots.txt", root)).await {
            Ok(r) if r.is_success() => r,
            Ok(r) => {
                debug!("robots.txt returned {}", r.status);
                return;
            }
            Err(e) => {
                debug!("robots.txt unreachable: {}", e);
                return;
            }
        };
        let (paths, sitemaps) = parse_robots(&resp.body);
        for path in paths {
            out.push(format!("{}{}", root, path));
        }
        for sitemap in sitemaps {
            if cancel.is_cancelled() {
                return;
            }
            self.fetch_sitemap(&sitemap, out).await;
        }
    }

    /// Collect the <loc> values of one sitemap, following an index one level deep.
    async fn fetch_sitemap(&self, sitemap_url: &str, out: &mut Collected) {
        let Some(body) = self.fetch_once(sitemap_url, out).await else {
            return;
        };
        let locs = extract_locs(&body);
        if !is_sitemap_index(&body) {
            locs.into_iter().for_each(|loc| out.push(loc));
            return;
        }
        for child in locs {
            if let Some(child_body) = self.fetch_once(&child, out).await {
                extract_locs(&child_body)
                    .into_iter()
                    .for_each(|loc| out.push(loc));
            }
        }
    }

    /// Body of a sitemap not fetched before in this run
    async fn fetch_once(&self, sitemap_url: &str, out: &mut Collected) -> Option<String> {
        if !out.fetched.insert(sitemap_url.to_string()) {
            return None;
        }
        match self.transport.get(sitemap_url).await {
            Ok(r) if r.is_success() => Some(r.body),
            _ => None,
        }
    }
}

#[async_trait]
impl Source for SitemapSource {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Active
    }

    async fn run(&self, cancel: &Cancellation, target: &str) -> Result<Vec<String>, SourceError> {
        parse_target(target)?;
        let root = target.trim_end_matches('/');
        let mut out = Collected::default();

        self.fetch_robots(cancel, root, &mut out).await;
        for path in SITEMAP_PATHS {
            if cancel.is_cancelled() {
                break;
            }
            self.fetch_sitemap(&format!("{}{}", root, path), &mut out).await;
        }
        Ok(out.urls)
    }
}

/// Disallowed paths (excluding "/") and Sitemap references from robots.txt
fn parse_robots(body: &str) -> (Vec<String>, Vec<String>) {
    let mut paths = Vec::new();
    let mut sitemaps = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "disallow" if !value.is_empty() && value != "/" => paths.push(value.to_string()),
            "sitemap" if !value.is_empty() => sitemaps.push(value.to_string()),
            _ => {}
        }
    }
    (paths, sitemaps)
}

fn extract_locs(body: &str) -> Vec<String> {
    LOC_PATTERN
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .collect()
}

fn is_sitemap_index(body: &str) -> bool {
    body.contains("<sitemapindex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_disallow_and_sitemap_lines() {
        let robots = "User-agent: *\nDisallow: /admin/\nDisallow: /\ndisallow: /api/private\nDisallow:\nSitemap: https://x.com/sitemap.xml\n# comment";
        let (paths, sitemaps) = parse_robots(robots);
        assert_eq!(paths, vec!["/admin/", "/api/private"]);
        assert_eq!(sitemaps, vec!["https://x.com/sitemap.xml"]);
    }

    #[test]
    fn loc_extraction_unescapes_ampersands() {
        let xml = "<urlset><url><loc>https://x.com/a?b=1&amp;c=2</loc></url><url><loc> https://x.com/d </loc></url></urlset>";
        assert_eq!(
            extract_locs(xml),
            vec!["https://x.com/a?b=1&c=2", "https://x.com/d"]
        );
    }

    #[test]
    fn detects_sitemap_index() {
        assert!(is_sitemap_index(
            "<?xml version=\"1.0\"?><sitemapindex xmlns=\"...\"></sitemapindex>"
        ));
        assert!(!is_sitemap_index("<urlset></urlset>"));
    }
}
