// Auto-login for apihunter
// Logs in with the supplied credentials and hands back the cookies/headers
// that should be attached to every later request.

use crate::config::AuthConfig;
use crate::errors::{AuthError, ConfigError};
use crate::transport::{Response, Transport};
use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// url-encoded form POST
    Form,
    /// JSON object POST
    Json,
    /// Authorization: Basic header, no request
    Basic,
}

impl FromStr for AuthType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" => Ok(AuthType::Form),
            "json" => Ok(AuthType::Json),
            "basic" => Ok(AuthType::Basic),
            other => Err(ConfigError::UnsupportedAuthType(other.to_string())),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::Form => write!(f, "form"),
            AuthType::Json => write!(f, "json"),
            AuthType::Basic => write!(f, "basic"),
        }
    }
}

/// Outcome of a login attempt
#[derive(Debug, Clone, Default)]
pub struct AuthResult {
    pub success: bool,
    pub cookies: String,
    pub headers: BTreeMap<String, String>,
    pub token: Option<String>,
    pub message: String,
}

/// A CSRF token scraped from the login page and the form field it belongs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub field: String,
    pub value: String,
}

/// JSON pointers tried in order when looking for a session token
const TOKEN_POINTERS: &[&str] = &[
    "/token",
    "/access_token",
    "/accessToken",
    "/auth_token",
    "/authToken",
    "/jwt",
    "/id_token",
    "/idToken",
    "/session_token",
    "/sessionToken",
    "/bearer",
    "/data/token",
    "/data/access_token",
    "/data/accessToken",
    "/result/token",
    "/response/token",
    "/auth/token",
    "/user/token",
];

lazy_static! {
    static ref JWT_PATTERN: Regex = Regex::new(
        r#""(?:token|access_token|accessToken|jwt|bearer)"\s*:\s*"(eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+)""#
    ).unwrap();

    // (form field, pattern)
    static ref CSRF_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("_token", Regex::new(r#"name="_token"\s+value="([^"]+)""#).unwrap()),
        ("csrf_token", Regex::new(r#"name="csrf_token"\s+value="([^"]+)""#).unwrap()),
        ("csrfToken", Regex::new(r#"name="csrfToken"\s+value="([^"]+)""#).unwrap()),
        ("_csrf", Regex::new(r#"name="_csrf"\s+value="([^"]+)""#).unwrap()),
        ("authenticity_token", Regex::new(r#"name="authenticity_token"\s+value="([^"]+)""#).unwrap()),
        ("csrf_token", Regex::new(r#"<meta\s+name="csrf-token"\s+content="([^"]+)""#).unwrap()),
        ("csrfToken", Regex::new(r#""csrfToken"\s*:\s*"([^"]+)""#).unwrap()),
    ];
}

pub struct Authenticator {
    transport: Arc<Transport>,
    config: AuthConfig,
}

impl Authenticator {
    pub fn new(transport: Arc<Transport>, config: AuthConfig) -> Self {
        Self { transport, config }
    }

    pub async fn login(&self) -> Result<AuthResult, AuthError> {
        let auth_type: AuthType = self.config.auth_type.parse()?;
        let url = self.config.login_url.as_str();
        let resp = match auth_type {
            AuthType::Basic => return Ok(self.login_basic()),
            AuthType::Form => {
                let fields = self.login_fields(auth_type).await?;
                info!("logging in to {} (form)", url);
                self.transport.post_form(url, &fields).await?
            }
            AuthType::Json => {
                let body: Map<String, Value> = self
                    .login_fields(auth_type)
                    .await?
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                let bytes = serde_json::to_vec(&Value::Object(body))?;
                info!("logging in to {} (json)", url);
                self.transport.post_json(url, bytes).await?
            }
        };
        Ok(process_login_response(&resp))
    }

    /// Credentials, extra fields and (if requested) the login page's CSRF token
    async fn login_fields(&self, auth_type: AuthType) -> Result<BTreeMap<String, String>, AuthError> {
        if self.config.login_url.is_empty() {
            return Err(AuthError::MissingLoginUrl(auth_type.to_string()));
        }
        let mut fields = self.credential_fields();
        if self.config.fetch_csrf {
            match self.fetch_csrf_token(&self.config.login_url).await {
                Ok(Some(csrf)) => {
                    debug!("using CSRF field {}", csrf.field);
                    fields.insert(csrf.field, csrf.value);
                }
                Ok(None) => warn!("no CSRF token found on {}", self.config.login_url),
                Err(e) => warn!("could not fetch login page for CSRF token: {}", e),
            }
        }
        Ok(fields)
    }

    fn credential_fields(&self) -> BTreeMap<String, String> {
        let mut fields = self.config.extra_fields.clone();
        fields.insert(
            self.config.username_field.clone(),
            self.config.username.clone(),
        );
        fields.insert(
            self.config.password_field.clone(),
            self.config.password.clone(),
        );
        fields
    }

    fn login_basic(&self) -> AuthResult {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Authorization".to_string(),
            basic_auth(&self.config.username, &self.config.password),
        );
        AuthResult {
            success: true,
            headers,
            message: "Basic auth configured".to_string(),
            ..Default::default()
        }
    }

    /// Scrape a CSRF token from a page. `Ok(None)` when the page has none.
    pub async fn fetch_csrf_token(&self, page_url: &str) -> Result<Option<CsrfToken>, AuthError> {
        let resp = self.transport.get(page_url).await?;
        if resp.status != 200 {
            return Err(AuthError::CsrfPage(resp.status));
        }
        Ok(find_csrf_token(&resp.body))
    }
}

pub fn basic_auth(username: &str, password: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

/// Turn a login response into cookies, headers and a verdict
pub fn process_login_response(resp: &Response) -> AuthResult {
    let mut result = AuthResult::default();

    if let Some(cookies) = resp.header("set-cookie").filter(|c| !c.is_empty()) {
        result.cookies = cookies.to_string();
    }
    if let Some(token) = extract_token(&resp.body) {
        result
            .headers
            .insert("Authorization".to_string(), format!("Bearer {}", token));
        result.token = Some(token);
    }

    let status = resp.status;
    match status {
        200..=399 => {
            result.success = true;
            result.message = if result.cookies.is_empty() && result.token.is_none() {
                format!(
                    "Login completed (status: {}) - no session cookies or tokens found in response",
                    status
                )
            } else {
                format!("Login successful (status: {})", status)
            };
        }
        401 | 403 => {
            result.message = format!("Login failed: unauthorized (status: {})", status);
        }
        _ => {
            result.message = format!("Login failed (status: {})", status);
        }
    }
    result
}

/// Session token from a JSON login body
pub fn extract_token(body: &str) -> Option<String> {
    if let Ok(data) = serde_json::from_str::<Value>(body) {
        let found = TOKEN_POINTERS.iter().find_map(|ptr| {
            data.pointer(ptr)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        });
        if found.is_some() {
            return found;
        }
    }
    JWT_PATTERN
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn find_csrf_token(html: &str) -> Option<CsrfToken> {
    CSRF_PATTERNS.iter().find_map(|(field, pattern)| {
        pattern.captures(html).and_then(|c| c.get(1)).map(|m| CsrfToken {
            field: field.to_string(),
            value: m.as_str().to_string(),
        })
    })
}
