/// Discovery source tests against a local mock server

use apihunter::config::RateLimitConfig;
use apihunter::errors::SourceError;
use apihunter::sources::{
    Cancellation, CommonCrawlSource, CrawlerSource, ScriptSource, SitemapSource, Source,
    SourceKind, WaybackSource,
};
use apihunter::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn transport() -> Arc<Transport> {
    let config = RateLimitConfig {
        requests_per_second: 200,
        ..Default::default()
    };
    Arc::new(Transport::new(&config, Duration::from_secs(5)).unwrap())
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/html")
        .set_body_string(body.to_string())
}

#[tokio::test]
async fn test_wayback_reads_cdx_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .and(query_param("url", "x.com/*"))
        .and(query_param("fl", "original"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[["original"],["https://x.com/api/users/1"],["https://x.com/api/users/2"]]"#,
        ))
        .mount(&server)
        .await;

    let source = WaybackSource::with_endpoint(transport(), &format!("{}/cdx", server.uri()));
    assert_eq!(source.kind(), SourceKind::Passive);

    let urls = source
        .run(&Cancellation::new(), "https://x.com")
        .await
        .unwrap();
    assert_eq!(
        urls,
        vec!["https://x.com/api/users/1", "https://x.com/api/users/2"]
    );
}

#[tokio::test]
async fn test_wayback_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = WaybackSource::with_endpoint(transport(), &format!("{}/cdx", server.uri()));
    let err = source
        .run(&Cancellation::new(), "https://x.com")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SourceError::UnexpectedStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn test_passive_source_honours_cancellation() {
    let cancel = Cancellation::new();
    cancel.cancel();
    let source = WaybackSource::with_endpoint(transport(), "http://127.0.0.1:9/cdx");
    let err = source.run(&cancel, "https://x.com").await.unwrap_err();
    assert!(matches!(err, SourceError::Cancelled));
}

#[tokio::test]
async fn test_commoncrawl_reads_ndjson() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CC-TEST-index"))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\"url\": \"https://x.com/api/orders\"}\n{\"url\": \"https://x.com/login\"}\n",
        ))
        .mount(&server)
        .await;

    let source = CommonCrawlSource::with_server(transport(), &server.uri(), "CC-TEST");
    let urls = source
        .run(&Cancellation::new(), "https://x.com")
        .await
        .unwrap();
    assert_eq!(urls, vec!["https://x.com/api/orders", "https://x.com/login"]);
}

#[tokio::test]
async fn test_sitemap_collects_robots_and_index_children() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nDisallow: /admin/\nDisallow: /\nSitemap: {}/custom.xml\n",
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/custom.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{}/api/products</loc></url></urlset>",
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<sitemapindex><sitemap><loc>{0}/child.xml</loc></sitemap><sitemap><loc>{0}/custom.xml</loc></sitemap></sitemapindex>",
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/child.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{0}/blog/1</loc></url><url><loc>{0}/api/products</loc></url></urlset>",
            base
        )))
        .mount(&server)
        .await;

    let source = SitemapSource::new(transport());
    let urls = source.run(&Cancellation::new(), &base).await.unwrap();

    assert_eq!(
        urls,
        vec![
            format!("{}/admin/", base),
            format!("{}/api/products", base),
            format!("{}/blog/1", base),
        ]
    );
}

#[tokio::test]
async fn test_crawler_stays_on_host_and_respects_depth() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/docs">docs</a>
               <a href="/broken">broken</a>
               <a href="https://elsewhere.example/">away</a>
               <form action="/login" method="post"></form>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(html(
            r#"<a href="/docs/deep#part">deep</a><a href="/">home</a>
               <script src="/static/docs.js"></script>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/deep"))
        .respond_with(html("<p>deep</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let shallow = CrawlerSource::new(transport(), 1);
    let urls = shallow.run(&Cancellation::new(), &base).await.unwrap();

    assert!(urls.contains(&format!("{}/", base)));
    assert!(urls.contains(&format!("{}/docs", base)));
    assert!(urls.contains(&format!("{}/login", base)));
    assert!(urls.contains(&format!("{}/static/docs.js", base)));
    assert!(!urls.contains(&format!("{}/broken", base)), "non-200 pages are not recorded");
    assert!(!urls.contains(&format!("{}/docs/deep", base)), "depth 2 is beyond the limit");
    assert!(!urls.iter().any(|u| u.contains("elsewhere.example")));

    let deep = CrawlerSource::new(transport(), 3);
    let urls = deep.run(&Cancellation::new(), &base).await.unwrap();
    assert!(urls.contains(&format!("{}/docs/deep", base)));
    let home_visits = urls.iter().filter(|u| **u == format!("{}/", base)).count();
    assert_eq!(home_visits, 1, "pages are visited once");
}

#[tokio::test]
async fn test_crawler_page_cap() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#))
        .mount(&server)
        .await;

    let crawler = CrawlerSource::with_limits(transport(), 5, 2);
    let urls = crawler.run(&Cancellation::new(), &base).await.unwrap();
    assert_eq!(urls.len(), 2);
}

#[tokio::test]
async fn test_scripts_extracts_from_external_and_inline() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head>
                 <script src="/static/app.js"></script>
                 <script>const cfg = { endpoint: "/api/config" };</script>
               </head></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/static/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"fetch("/api/v1/orders"); axios.get('/v2/items'); const x = "not/an/endpoint";"#,
        ))
        .mount(&server)
        .await;

    let source = ScriptSource::new(transport());
    let urls = source.run(&Cancellation::new(), &base).await.unwrap();

    assert!(urls.contains(&format!("{}/api/config", base)));
    assert!(urls.contains(&format!("{}/api/v1/orders", base)));
    assert!(urls.contains(&format!("{}/v2/items", base)));
    assert!(urls.iter().all(|u| u.starts_with("http")));
}
