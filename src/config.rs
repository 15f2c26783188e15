// Scan configuration for apihunter
// Built from CLI flags in main.rs, validated before any request is sent

use crate::auth::AuthType;
use crate::errors::ConfigError;
use crate::reporting::parse_formats;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub target: String,
    pub output_dir: String,
    pub formats: Vec<String>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub modules: ModulesConfig,
    pub crawl_depth: usize,
    pub timeout: Duration,
    pub verbose: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub cookies: String,
    /// Raw "Name: value" strings
    pub headers: Vec<String>,
    pub bearer_token: String,
    // Auto-login
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub auth_type: String,
    pub username_field: String,
    pub password_field: String,
    pub fetch_csrf: bool,
    /// Additional login form/JSON fields
    pub extra_fields: BTreeMap<String, String>,
}

impl AuthConfig {
    pub fn wants_auto_login(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Parsed static headers, in the order given
    pub fn parsed_headers(&self) -> Result<Vec<(String, String)>, ConfigError> {
        self.headers
            .iter()
            .map(|h| split_header(h).ok_or_else(|| ConfigError::InvalidHeader(h.clone())))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    /// Idle connections kept per host
    pub threads: usize,
    /// Fixed pause after each token acquisition
    pub delay: Duration,
    /// Feed the adaptive controller's advice back into the token bucket
    pub adaptive: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            threads: 5,
            delay: Duration::ZERO,
            adaptive: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModulesConfig {
    pub wayback: bool,
    pub commoncrawl: bool,
    pub sitemap: bool,
    pub crawler: bool,
    pub scripts: bool,
    pub passive_only: bool,
    pub active_only: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            wayback: true,
            commoncrawl: true,
            sitemap: true,
            crawler: true,
            scripts: true,
            passive_only: false,
            active_only: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: String::new(),
            output_dir: "./apihunter_output".to_string(),
            formats: vec![
                "openapi".to_string(),
                "postman".to_string(),
                "urls".to_string(),
                "report".to_string(),
            ],
            auth: AuthConfig {
                auth_type: "form".to_string(),
                username_field: "username".to_string(),
                password_field: "password".to_string(),
                ..Default::default()
            },
            rate_limit: RateLimitConfig::default(),
            modules: ModulesConfig::default(),
            crawl_depth: 3,
            timeout: Duration::from_secs(30),
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.target)
            .map_err(|_| ConfigError::InvalidTarget(self.target.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidTarget(self.target.clone()));
        }
        if self.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::InvalidRate);
        }
        if self.modules.passive_only && self.modules.active_only {
            return Err(ConfigError::ConflictingModes);
        }
        self.auth.parsed_headers()?;
        self.auth.auth_type.parse::<AuthType>()?;
        parse_formats(&self.formats)?;
        Ok(())
    }

    /// Target without a trailing slash, the form sources append paths to
    pub fn target_root(&self) -> &str {
        self.target.trim_end_matches('/')
    }
}

/// Split "Name: value" into its trimmed halves
pub fn split_header(h: &str) -> Option<(String, String)> {
    let (name, value) = h.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
