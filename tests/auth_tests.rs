/// Auto-login tests against a local mock server

use apihunter::auth::{AuthType, Authenticator, CsrfToken};
use apihunter::config::{AuthConfig, Config, RateLimitConfig};
use apihunter::errors::{AuthError, ScanError};
use apihunter::orchestrator::Cancellation;
use apihunter::scanner::Scanner;
use apihunter::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn transport() -> Arc<Transport> {
    let config = RateLimitConfig {
        requests_per_second: 200,
        ..Default::default()
    };
    Arc::new(Transport::new(&config, Duration::from_secs(5)).unwrap())
}

fn auth_config(login_url: &str, auth_type: AuthType) -> AuthConfig {
    AuthConfig {
        login_url: login_url.to_string(),
        username: "alice".to_string(),
        password: "pw".to_string(),
        auth_type: auth_type.to_string(),
        ..Config::default().auth
    }
}

fn crawler_only(base: &str, out: &std::path::Path) -> Config {
    let mut config = Config {
        target: base.to_string(),
        output_dir: out.to_string_lossy().to_string(),
        formats: vec!["urls".to_string()],
        crawl_depth: 1,
        quiet: true,
        ..Default::default()
    };
    config.modules.active_only = true;
    config.modules.sitemap = false;
    config.modules.scripts = false;
    config.rate_limit.requests_per_second = 200;
    config
}

#[tokio::test]
async fn test_form_login_session_reaches_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=pw"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Set-Cookie", "session=xyz; Path=/; HttpOnly"),
        )
        .mount(&server)
        .await;
    // Only an authenticated crawl sees these pages
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "session=xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/api/secret">s</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/secret"))
        .and(header("cookie", "session=xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>secret</p>"))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let mut config = crawler_only(&base, out.path());
    config.auth = auth_config(&format!("{}/login", base), AuthType::Form);

    let scanner = Scanner::new(config).unwrap();
    let report = scanner.run(&Cancellation::new()).await.unwrap();

    assert_eq!(scanner.transport().cookies(), "session=xyz");
    assert!(report
        .result
        .endpoints
        .iter()
        .any(|e| e.url == format!("{}/api/secret", base)));
}

#[tokio::test]
async fn test_rejected_login_aborts_scan() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let mut config = crawler_only(&base, out.path());
    config.auth = auth_config(&format!("{}/login", base), AuthType::Form);

    let scanner = Scanner::new(config).unwrap();
    let err = scanner.run(&Cancellation::new()).await.unwrap_err();
    match err {
        ScanError::Auth(message) => assert!(message.contains("unauthorized")),
        other => panic!("expected an auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_basic_auth_header_is_sent() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "Basic YWxpY2U6cHc="))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>hi</p>"))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let mut config = crawler_only(&base, out.path());
    config.auth = auth_config("", AuthType::Basic);

    let scanner = Scanner::new(config).unwrap();
    let report = scanner.run(&Cancellation::new()).await.unwrap();
    assert_eq!(report.result.endpoints.len(), 1, "root page is only served with the header");
}

#[tokio::test]
async fn test_json_login_token_becomes_bearer_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains(r#""username":"alice""#))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"data":{"access_token":"tok-1"}}"#),
        )
        .mount(&server)
        .await;

    let config = auth_config(&format!("{}/api/auth", server.uri()), AuthType::Json);
    let result = Authenticator::new(transport(), config).login().await.unwrap();

    assert!(result.success);
    assert_eq!(result.token.as_deref(), Some("tok-1"));
    assert_eq!(result.headers["Authorization"], "Bearer tok-1");
}

#[tokio::test]
async fn test_csrf_token_is_posted_with_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form method="post"><input type="hidden" name="_csrf" value="c5rf"></form>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("_csrf=c5rf"))
        .respond_with(ResponseTemplate::new(302).insert_header("Set-Cookie", "sid=ok"))
        .mount(&server)
        .await;

    let login_url = format!("{}/login", server.uri());
    let mut config = auth_config(&login_url, AuthType::Form);
    config.fetch_csrf = true;
    let authenticator = Authenticator::new(transport(), config);

    assert_eq!(
        authenticator.fetch_csrf_token(&login_url).await.unwrap(),
        Some(CsrfToken {
            field: "_csrf".to_string(),
            value: "c5rf".to_string()
        })
    );
    let result = authenticator.login().await.unwrap();
    assert!(result.success);
    assert_eq!(result.cookies, "sid=ok");
}

#[tokio::test]
async fn test_form_login_needs_login_url() {
    let config = auth_config("", AuthType::Form);
    let err = Authenticator::new(transport(), config).login().await.unwrap_err();
    assert!(matches!(err, AuthError::MissingLoginUrl(_)));
}
