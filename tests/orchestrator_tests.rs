/// Orchestrator tests with in-process sources
/// Failure isolation, passive/active selection, deduplication and attribution

use apihunter::config::ModulesConfig;
use apihunter::errors::SourceError;
use apihunter::orchestrator::{Cancellation, Orchestrator};
use apihunter::sources::{Source, SourceKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

enum Behaviour {
    Urls(Vec<&'static str>),
    Fail,
    Panic,
    Slow(Vec<&'static str>),
}

struct FakeSource {
    name: &'static str,
    kind: SourceKind,
    behaviour: Behaviour,
}

impl FakeSource {
    fn arc(name: &'static str, kind: SourceKind, behaviour: Behaviour) -> Arc<dyn Source> {
        Arc::new(Self {
            name,
            kind,
            behaviour,
        })
    }
}

#[async_trait]
impl Source for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn run(&self, _cancel: &Cancellation, _target: &str) -> Result<Vec<String>, SourceError> {
        match &self.behaviour {
            Behaviour::Urls(urls) => Ok(urls.iter().map(|u| u.to_string()).collect()),
            Behaviour::Fail => Err(SourceError::UnexpectedStatus {
                source_name: self.name.to_string(),
                status: 500,
            }),
            Behaviour::Panic => panic!("source blew up"),
            Behaviour::Slow(urls) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(urls.iter().map(|u| u.to_string()).collect())
            }
        }
    }
}

#[tokio::test]
async fn test_failing_module_does_not_block_siblings() {
    let orchestrator = Orchestrator::new(
        vec![
            FakeSource::arc("broken", SourceKind::Passive, Behaviour::Fail),
            FakeSource::arc(
                "good",
                SourceKind::Active,
                Behaviour::Urls(vec!["https://x.com/api/a"]),
            ),
            FakeSource::arc("crashy", SourceKind::Active, Behaviour::Panic),
        ],
        &ModulesConfig::default(),
    );

    let result = orchestrator.run(&Cancellation::new(), "https://x.com").await;

    assert_eq!(result.endpoints.len(), 1);
    assert_eq!(result.endpoints[0].url, "https://x.com/api/a");

    let broken = &result.module_stats["broken"];
    assert!(broken.error.as_deref().unwrap_or_default().contains("500"));
    assert_eq!(broken.urls, 0);
    assert!(result.module_stats["crashy"].error.is_some());
    assert!(result.module_stats["good"].is_ok());
    assert_eq!(result.module_stats["good"].urls, 1);
}

#[tokio::test]
async fn test_dedup_sorts_and_credits_first_registered_source() {
    let orchestrator = Orchestrator::new(
        vec![
            // Finishes last but is registered first
            FakeSource::arc(
                "first",
                SourceKind::Passive,
                Behaviour::Slow(vec!["https://x.com/b", "https://x.com/app.js"]),
            ),
            FakeSource::arc(
                "second",
                SourceKind::Active,
                Behaviour::Urls(vec!["https://x.com/b", "https://x.com/a", "https://x.com/a"]),
            ),
        ],
        &ModulesConfig::default(),
    );

    let result = orchestrator.run(&Cancellation::new(), "https://x.com").await;

    let urls: Vec<_> = result.endpoints.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://x.com/a", "https://x.com/app.js", "https://x.com/b"]
    );
    let source_of = |url: &str| {
        result
            .endpoints
            .iter()
            .find(|e| e.url == url)
            .map(|e| e.source.clone())
            .unwrap()
    };
    assert_eq!(source_of("https://x.com/b"), "first");
    assert_eq!(source_of("https://x.com/a"), "second");
    assert_eq!(result.statistics.total_urls, 5);
    assert_eq!(result.script_files, vec!["https://x.com/app.js"]);
}

#[tokio::test]
async fn test_passive_only_skips_active_sources() {
    let modules = ModulesConfig {
        passive_only: true,
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(
        vec![
            FakeSource::arc("archive", SourceKind::Passive, Behaviour::Urls(vec!["https://x.com/p"])),
            FakeSource::arc("crawl", SourceKind::Active, Behaviour::Urls(vec!["https://x.com/a"])),
        ],
        &modules,
    );
    assert_eq!(orchestrator.source_names(), vec!["archive"]);

    let result = orchestrator.run(&Cancellation::new(), "https://x.com").await;
    assert_eq!(result.endpoints.len(), 1);
    assert!(!result.module_stats.contains_key("crawl"));
}

#[tokio::test]
async fn test_active_only_skips_passive_sources() {
    let modules = ModulesConfig {
        active_only: true,
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(
        vec![
            FakeSource::arc("archive", SourceKind::Passive, Behaviour::Urls(vec![])),
            FakeSource::arc("crawl", SourceKind::Active, Behaviour::Urls(vec![])),
        ],
        &modules,
    );
    assert_eq!(orchestrator.source_names(), vec!["crawl"]);
}

#[tokio::test]
async fn test_no_sources_yields_empty_result() {
    let orchestrator = Orchestrator::new(vec![], &ModulesConfig::default());
    let result = orchestrator.run(&Cancellation::new(), "https://x.com").await;
    assert!(result.endpoints.is_empty());
    assert!(result.module_stats.is_empty());
    assert_eq!(result.target, "https://x.com");
}
