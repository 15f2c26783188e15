// Rate-limited HTTP transport for apihunter
// Uses reqwest and tokio; every outbound call first takes a token from the bucket

use super::adaptive::{AdaptiveController, Advice};
use super::bucket::TokenBucket;
use crate::config::RateLimitConfig;
use crate::errors::TransportError;
use reqwest::header::{HeaderMap, CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const MAX_REDIRECTS: usize = 10;

const DEFAULT_USER_AGENT: &str = concat!("apihunter/", env!("CARGO_PKG_VERSION"));

/// Body, status and (lower-cased) headers of a completed request
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct SharedState {
    headers: BTreeMap<String, String>,
    cookies: String,
}

pub struct Transport {
    client: Client,
    bucket: TokenBucket,
    controller: AdaptiveController,
    adaptive: bool,
    delay: Duration,
    state: Mutex<SharedState>,
}

impl Transport {
    pub fn new(config: &RateLimitConfig, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.threads.max(1))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(TransportError::Build)?;
        Ok(Self {
            client,
            bucket: TokenBucket::new(config.requests_per_second),
            controller: AdaptiveController::new(config.requests_per_second),
            adaptive: config.adaptive,
            delay: config.delay,
            state: Mutex::new(SharedState::default()),
        })
    }

    /// Set a default header sent with every request
    pub fn set_header(&self, key: &str, value: &str) {
        self.lock().headers.insert(key.to_string(), value.to_string());
    }

    pub fn set_cookies(&self, cookies: &str) {
        self.lock().cookies = cookies.to_string();
    }

    pub fn append_cookies(&self, new_cookies: &str) {
        let mut state = self.lock();
        if state.cookies.is_empty() {
            state.cookies = new_cookies.to_string();
        } else {
            state.cookies = format!("{}; {}", state.cookies, new_cookies);
        }
    }

    pub fn cookies(&self) -> String {
        self.lock().cookies.clone()
    }

    pub fn headers(&self) -> BTreeMap<String, String> {
        self.lock().headers.clone()
    }

    pub fn bucket(&self) -> &TokenBucket {
        &self.bucket
    }

    pub fn controller(&self) -> &AdaptiveController {
        &self.controller
    }

    /// Rate-limited GET that follows up to MAX_REDIRECTS redirects
    pub async fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.throttle().await;
        let mut current = parse_url(url)?;
        let mut redirects = 0;
        loop {
            let req = self.client.get(current.clone());
            let resp = self.send(req, current.as_str()).await?;
            if is_redirect(resp.status) {
                if let Some(location) = resp.header("location") {
                    if redirects >= MAX_REDIRECTS {
                        return Err(TransportError::TooManyRedirects {
                            url: url.to_string(),
                            max_redirects: MAX_REDIRECTS,
                        });
                    }
                    let next = resolve_location(&current, location)?;
                    debug!("redirect {} -> {}", current, next);
                    current = next;
                    redirects += 1;
                    continue;
                }
            }
            self.observe(resp.status).await;
            return Ok(resp);
        }
    }

    /// Rate-limited url-encoded POST. Redirects are not followed.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<Response, TransportError> {
        self.throttle().await;
        let target = parse_url(url)?;
        let req = self.client.post(target).form(fields);
        let resp = self.send(req, url).await?;
        self.observe(resp.status).await;
        Ok(resp)
    }

    /// Rate-limited POST with a raw JSON body. Redirects are not followed.
    pub async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Response, TransportError> {
        self.throttle().await;
        let target = parse_url(url)?;
        let req = self
            .client
            .post(target)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let resp = self.send(req, url).await?;
        self.observe(resp.status).await;
        Ok(resp)
    }

    async fn throttle(&self) {
        self.bucket.acquire().await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    async fn send(&self, req: RequestBuilder, url: &str) -> Result<Response, TransportError> {
        let req = self.apply_defaults(req);
        let resp = req.send().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status().as_u16();
        let headers = collect_headers(resp.headers());
        let body = resp.text().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(Response {
            status,
            body,
            headers,
        })
    }

    fn apply_defaults(&self, mut req: RequestBuilder) -> RequestBuilder {
        let state = self.lock();
        for (k, v) in &state.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if !state.cookies.is_empty() {
            req = req.header(COOKIE, state.cookies.as_str());
        }
        req.header(USER_AGENT, DEFAULT_USER_AGENT)
    }

    async fn observe(&self, status: u16) {
        let advice = self.controller.on_response(status);
        if !self.adaptive {
            if !advice.pause.is_zero() {
                debug!(
                    "status {}: advised rate {} req/s, pause {:?} (not applied)",
                    status, advice.rate, advice.pause
                );
            }
            return;
        }
        self.apply_advice(status, advice).await;
    }

    async fn apply_advice(&self, status: u16, advice: Advice) {
        if advice.rate != self.bucket.rate() {
            if advice.rate < self.bucket.rate() {
                warn!("status {}: lowering rate to {} req/s", status, advice.rate);
            } else {
                debug!("recovering rate to {} req/s", advice.rate);
            }
            self.bucket.set_rate(advice.rate);
        }
        if !advice.pause.is_zero() {
            tokio::time::sleep(advice.pause).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_url(url: &str) -> Result<Url, TransportError> {
    Url::parse(url).map_err(|_| TransportError::InvalidUrl {
        url: url.to_string(),
    })
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Resolve a Location header against the URL that produced it.
///
/// Absolute-path locations keep the request's scheme and host; relative locations
/// resolve against the request's directory.
pub fn resolve_location(current: &Url, location: &str) -> Result<Url, TransportError> {
    current.join(location).map_err(|_| TransportError::InvalidUrl {
        url: location.to_string(),
    })
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers.iter() {
        if name == SET_COOKIE {
            continue;
        }
        if let Ok(v) = value.to_str() {
            out.entry(name.as_str().to_string())
                .or_insert_with(|| v.to_string());
        }
    }
    // Multiple Set-Cookie headers collapse into "a=1; b=2"
    let cookies: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect();
    if !cookies.is_empty() {
        out.insert(SET_COOKIE.as_str().to_string(), cookies.join("; "));
    }
    out
}
