// Client-side script analysis
// Pulls endpoint-looking strings out of the target page's external and inline scripts.
// Scripts are only read, never executed.

use super::{origin_of, parse_target, Cancellation, Source, SourceKind};
use crate::errors::SourceError;
use crate::transport::Transport;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use url::Url;

lazy_static! {
    // Order matters: earlier patterns win when two produce the same string
    static ref ENDPOINT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"["'](/api/[^"'\s]+)["']"#).unwrap(),
        Regex::new(r#"["'](/v[0-9]+/[^"'\s]+)["']"#).unwrap(),
        Regex::new(r#"["'](https?://[^"'\s]+/api/[^"'\s]*)["']"#).unwrap(),
        Regex::new(r#"fetch\s*\(\s*["'`]([^"'`]+)["'`]"#).unwrap(),
        Regex::new(r#"axios\.[a-z]+\s*\(\s*["'`]([^"'`]+)["'`]"#).unwrap(),
        Regex::new(r#"\.get\s*\(\s*["'`]([^"'`]+)["'`]"#).unwrap(),
        Regex::new(r#"\.post\s*\(\s*["'`]([^"'`]+)["'`]"#).unwrap(),
        Regex::new(r#"\.put\s*\(\s*["'`]([^"'`]+)["'`]"#).unwrap(),
        Regex::new(r#"\.delete\s*\(\s*["'`]([^"'`]+)["'`]"#).unwrap(),
        Regex::new(r#"baseURL\s*[:=]\s*["'`]([^"'`]+)["'`]"#).unwrap(),
        Regex::new(r#"endpoint\s*[:=]\s*["'`]([^"'`]+)["'`]"#).unwrap(),
    ];
}

pub struct ScriptSource {
    transport: Arc<Transport>,
}

/// Script references found in an HTML page
#[derive(Debug, Default)]
pub struct PageScripts {
    pub external: Vec<String>,
    pub inline: Vec<String>,
}

impl ScriptSource {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Source for ScriptSource {
    fn name(&self) -> &'static str {
        "scripts"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Active
    }

    async fn run(&self, cancel: &Cancellation, target: &str) -> Result<Vec<String>, SourceError> {
        let base = parse_target(target)?;
        let origin = origin_of(&base);

        let page = self.transport.get(target).await?;
        if page.status != 200 {
            return Err(SourceError::UnexpectedStatus {
                source_name: self.name().to_string(),
                status: page.status,
            });
        }
        let scripts = collect_scripts(&page.body, &base);

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        let mut push_all = |found: Vec<String>| {
            for url in found {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        };

        for body in &scripts.inline {
            push_all(extract_endpoints(body, &origin));
        }
        for script_url in &scripts.external {
            if cancel.is_cancelled() {
                break;
            }
            match self.transport.get(script_url).await {
                Ok(resp) if resp.status == 200 => push_all(extract_endpoints(&resp.body, &origin)),
                Ok(resp) => debug!("script {} returned {}", script_url, resp.status),
                Err(e) => debug!("script {} failed: {}", script_url, e),
            }
        }
        debug!(
            "scripts: {} external files, {} endpoints",
            scripts.external.len(),
            urls.len()
        );
        Ok(urls)
    }
}

/// External script URLs (resolved against the page) and inline script bodies
pub fn collect_scripts(html: &str, base: &Url) -> PageScripts {
    let doc = Html::parse_document(html);
    let Ok(selector) = Selector::parse("script") else {
        return PageScripts::default();
    };

    let mut scripts = PageScripts::default();
    for el in doc.select(&selector) {
        match el.value().attr("src") {
            Some(src) => {
                if let Ok(url) = base.join(src.trim()) {
                    if matches!(url.scheme(), "http" | "https") {
                        scripts.external.push(url.to_string());
                    }
                }
            }
            None => {
                let body: String = el.text().collect();
                if !body.trim().is_empty() {
                    scripts.inline.push(body);
                }
            }
        }
    }
    scripts
}

/// Run the pattern catalogue over one script body.
///
/// Root-relative matches are made absolute against `origin`; anything that is not
/// http(s) afterwards (template fragments, relative paths, data URIs) is dropped.
pub fn extract_endpoints(content: &str, origin: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for pattern in ENDPOINT_PATTERNS.iter() {
        for caps in pattern.captures_iter(content) {
            let Some(m) = caps.get(1) else { continue };
            let raw = m.as_str().trim();
            let url = if raw.starts_with("//") {
                continue;
            } else if raw.starts_with('/') {
                format!("{}{}", origin, raw)
            } else {
                raw.to_string()
            };
            if url.starts_with("http://") || url.starts_with("https://") {
                if seen.insert(url.clone()) {
                    found.push(url);
                }
            }
        }
    }
    found
}
