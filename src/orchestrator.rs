// Module orchestration
//
// Runs every enabled discovery source concurrently against one target, isolates their
// failures into ModuleStats and merges the raw URLs into a deduplicated, sorted set of
// bare Endpoints.

use crate::config::{Config, ModulesConfig};
use crate::models::{Endpoint, ModuleStat, ScanResult};
use crate::sources::{
    CommonCrawlSource, CrawlerSource, ScriptSource, SitemapSource, Source, SourceKind,
    WaybackSource,
};
use crate::transport::Transport;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

pub use crate::sources::Cancellation;

/// Raw output of the fan-in barrier, guarded by one lock
#[derive(Default)]
struct Aggregate {
    urls: Vec<(usize, Vec<String>)>,
    stats: BTreeMap<String, ModuleStat>,
}

pub struct Orchestrator {
    sources: Vec<Arc<dyn Source>>,
}

impl Orchestrator {
    /// Keep the sources allowed by the passive/active selection, in the given order
    pub fn new(sources: Vec<Arc<dyn Source>>, modules: &ModulesConfig) -> Self {
        let sources = sources
            .into_iter()
            .filter(|s| match s.kind() {
                SourceKind::Passive => !modules.active_only,
                SourceKind::Active => !modules.passive_only,
            })
            .collect();
        Self { sources }
    }

    /// The built-in sources, honouring each per-source switch
    pub fn from_config(config: &Config, transport: Arc<Transport>) -> Self {
        let m = &config.modules;
        let mut sources: Vec<Arc<dyn Source>> = Vec::new();
        if m.wayback {
            sources.push(Arc::new(WaybackSource::new(transport.clone())));
        }
        if m.commoncrawl {
            sources.push(Arc::new(CommonCrawlSource::new(transport.clone())));
        }
        if m.sitemap {
            sources.push(Arc::new(SitemapSource::new(transport.clone())));
        }
        if m.crawler {
            sources.push(Arc::new(CrawlerSource::new(
                transport.clone(),
                config.crawl_depth,
            )));
        }
        if m.scripts {
            sources.push(Arc::new(ScriptSource::new(transport)));
        }
        Self::new(sources, m)
    }

    /// Names of the sources that will run, in registration order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run every source and wait for all of them before returning.
    ///
    /// The returned result holds one bare Endpoint per unique raw URL, sorted by URL.
    pub async fn run(&self, cancel: &Cancellation, target: &str) -> ScanResult {
        let mut result = ScanResult::new(target);
        let aggregate = Arc::new(Mutex::new(Aggregate::default()));

        let mut handles = Vec::with_capacity(self.sources.len());
        for (idx, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let name = source.name();
            let aggregate = Arc::clone(&aggregate);
            let cancel = cancel.clone();
            let target = target.to_string();
            let handle = tokio::spawn(async move {
                let started = Instant::now();
                debug!("starting source {}", name);
                let outcome = source.run(&cancel, &target).await;
                let duration = started.elapsed();

                let (urls, error) = match outcome {
                    Ok(urls) => (urls, None),
                    Err(e) => (Vec::new(), Some(e.to_string())),
                };
                let stat = ModuleStat {
                    name: name.to_string(),
                    urls: urls.len(),
                    duration,
                    error,
                };
                let mut agg = aggregate.lock().unwrap_or_else(|e| e.into_inner());
                agg.stats.insert(name.to_string(), stat);
                agg.urls.push((idx, urls));
            });
            handles.push((name, handle));
        }

        // Fan-in: a panicking source becomes an error stat, siblings are unaffected
        for (name, handle) in handles {
            if let Err(e) = handle.await {
                warn!("source {} aborted: {}", name, e);
                let mut agg = aggregate.lock().unwrap_or_else(|e| e.into_inner());
                agg.stats.insert(
                    name.to_string(),
                    ModuleStat {
                        name: name.to_string(),
                        urls: 0,
                        duration: Default::default(),
                        error: Some(format!("task failed: {}", e)),
                    },
                );
            }
        }

        let Aggregate { mut urls, stats } = {
            let mut agg = aggregate.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *agg)
        };

        // Registration order decides which source a shared URL is credited to
        urls.sort_by_key(|(idx, _)| *idx);
        let mut total = 0usize;
        let mut unique: BTreeMap<String, &'static str> = BTreeMap::new();
        for (idx, batch) in urls {
            let name = self.sources[idx].name();
            for url in batch {
                total += 1;
                unique.entry(url).or_insert(name);
            }
        }

        result.script_files = unique
            .keys()
            .filter(|url| is_script_file(url))
            .cloned()
            .collect();
        result.endpoints = unique
            .into_iter()
            .map(|(url, source)| Endpoint::new(url, source))
            .collect();
        result.statistics.total_urls = total;
        result.module_stats = stats;
        result.end_time = Utc::now();

        info!(
            "collected {} raw URLs, {} unique",
            total,
            result.endpoints.len()
        );
        result
    }
}

/// True for URLs whose path names a JavaScript file
pub fn is_script_file(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_ascii_lowercase(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase(),
    };
    path.ends_with(".js") || path.ends_with(".mjs")
}
