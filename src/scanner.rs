// Scan pipeline for apihunter
//
//   validate config -> transport + credentials -> auto-login
//   [1/4] discovery (orchestrator)
//   [2/4] normalization
//   [3/4] classification + grouping
//   [4/4] export

use crate::analyzer::{classify, group, normalize, EndpointGroup};
use crate::auth::Authenticator;
use crate::config::Config;
use crate::errors::ScanError;
use crate::models::{ScanResult, ScanStats};
use crate::orchestrator::{Cancellation, Orchestrator};
use crate::reporting::{export_all, parse_formats, Format};
use crate::transport::Transport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a finished scan produced
#[derive(Debug)]
pub struct ScanReport {
    pub result: ScanResult,
    pub groups: Vec<EndpointGroup>,
    pub files: Vec<PathBuf>,
}

pub struct Scanner {
    config: Config,
    formats: Vec<Format>,
    transport: Arc<Transport>,
}

impl Scanner {
    /// Validate the config and build the shared transport with static credentials applied
    pub fn new(config: Config) -> Result<Self, ScanError> {
        config.validate()?;
        let formats = parse_formats(&config.formats)?;
        let transport = Transport::new(&config.rate_limit, config.timeout)?;

        let auth = &config.auth;
        if !auth.cookies.is_empty() {
            transport.set_cookies(&auth.cookies);
        }
        if !auth.bearer_token.is_empty() {
            transport.set_header("Authorization", &format!("Bearer {}", auth.bearer_token));
        }
        for (name, value) in auth.parsed_headers()? {
            transport.set_header(&name, &value);
        }

        Ok(Self {
            config,
            formats,
            transport: Arc::new(transport),
        })
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full scan with the built-in sources
    pub async fn run(&self, cancel: &Cancellation) -> Result<ScanReport, ScanError> {
        let orchestrator = Orchestrator::from_config(&self.config, Arc::clone(&self.transport));
        self.run_with(&orchestrator, cancel).await
    }

    /// Full scan driving the given orchestrator
    pub async fn run_with(
        &self,
        orchestrator: &Orchestrator,
        cancel: &Cancellation,
    ) -> Result<ScanReport, ScanError> {
        if self.config.auth.wants_auto_login() {
            self.login().await?;
        }

        self.progress(&format!(
            "[1/4] Running discovery modules: {}",
            orchestrator.source_names().join(", ")
        ));
        let mut result = orchestrator.run(cancel, &self.config.target).await;
        for (name, stat) in &result.module_stats {
            match &stat.error {
                Some(err) => self.progress(&format!("  [WARN] {}: {}", name, err)),
                None => self.progress(&format!(
                    "  [OK] {}: {} URLs ({:.2}s)",
                    name,
                    stat.urls,
                    stat.duration.as_secs_f64()
                )),
            }
        }
        self.progress(&format!(
            "  {} raw URLs, {} unique",
            result.statistics.total_urls,
            result.endpoints.len()
        ));

        self.progress("[2/4] Normalizing endpoints");
        normalize_endpoints(&mut result);
        self.progress(&format!("  {} unique endpoints", result.endpoints.len()));

        self.progress("[3/4] Classifying endpoints");
        let groups = classify_endpoints(&mut result);

        self.progress("[4/4] Exporting results");
        let dir = Path::new(&self.config.output_dir);
        let files = export_all(&result, &groups, dir, &self.formats)?;

        self.print_summary(&result, &files);
        Ok(ScanReport {
            result,
            groups,
            files,
        })
    }

    async fn login(&self) -> Result<(), ScanError> {
        self.progress("[*] Logging in");
        let authenticator = Authenticator::new(Arc::clone(&self.transport), self.config.auth.clone());
        let outcome = authenticator
            .login()
            .await
            .map_err(|e| ScanError::Auth(e.to_string()))?;
        if !outcome.success {
            return Err(ScanError::Auth(outcome.message));
        }
        if !outcome.cookies.is_empty() {
            self.transport.append_cookies(&outcome.cookies);
        }
        for (name, value) in &outcome.headers {
            self.transport.set_header(name, value);
        }
        info!("{}", outcome.message);
        self.progress(&format!("  [OK] {}", outcome.message));
        Ok(())
    }

    fn progress(&self, line: &str) {
        if !self.config.quiet {
            println!("{}", line);
        }
    }

    fn print_summary(&self, result: &ScanResult, files: &[PathBuf]) {
        let stats = &result.statistics;
        self.progress("");
        self.progress(&format!(
            "Found {} endpoints ({} critical, {} high, {} medium, {} low)",
            stats.unique_endpoints,
            stats.critical_count,
            stats.high_count,
            stats.medium_count,
            stats.low_count
        ));
        if !result.script_files.is_empty() {
            self.progress(&format!("Script files: {}", result.script_files.len()));
        }
        self.progress(&format!("Output written to {}", self.config.output_dir));
        for file in files {
            self.progress(&format!("  {}", file.display()));
        }
    }
}

/// Normalize, classify and group the orchestrator's bare endpoints in place.
///
/// Statistics are recomputed from the final endpoint list; the raw URL count set by
/// the orchestrator is kept.
pub fn analyze(result: &mut ScanResult) -> Vec<EndpointGroup> {
    normalize_endpoints(result);
    classify_endpoints(result)
}

fn normalize_endpoints(result: &mut ScanResult) {
    let raw = std::mem::take(&mut result.endpoints);
    let seeded = raw.len();
    result.endpoints = normalize(raw);
    debug!("{} URLs normalized into {} endpoints", seeded, result.endpoints.len());
}

fn classify_endpoints(result: &mut ScanResult) -> Vec<EndpointGroup> {
    classify(&mut result.endpoints);
    let groups = group(&result.endpoints);
    result.statistics = ScanStats::from_endpoints(result.statistics.total_urls, &result.endpoints);
    groups
}
