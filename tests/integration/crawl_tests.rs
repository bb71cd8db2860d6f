//! Integration tests for the crawl engine
//!
//! These tests use wiremock to create mock HTTP servers and run
//! complete crawl cycles end-to-end.

use sitemapper::config::HttpConfig;
use sitemapper::crawler::{build_http_client, CycleStats, LinkAttributes};
use sitemapper::output::SitemapOptions;
use sitemapper::{Crawler, CycleOutcome, DiscoveredPage, Domain, LogSinks};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body.to_string()),
        )
        .mount(server)
        .await;
}

/// Creates an engine for the mock server's origin
fn create_crawler(server: &MockServer, attributes: LinkAttributes, sinks: LogSinks) -> Crawler {
    let domain = Domain::parse(&server.uri()).expect("mock server uri is a valid domain");
    let client = build_http_client(&HttpConfig {
        user_agent: "SitemapperTest/1.0".to_string(),
        request_timeout_secs: 5,
    })
    .expect("Failed to build client");
    Crawler::new(domain, attributes, client, sinks)
}

fn urls(pages: &[DiscoveredPage]) -> BTreeSet<String> {
    pages.iter().map(|p| p.url.clone()).collect()
}

fn expected(server: &MockServer, paths: &[&str]) -> BTreeSet<String> {
    paths
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect()
}

fn completed(outcome: CycleOutcome) -> CycleStats {
    match outcome {
        CycleOutcome::Completed(stats) => stats,
        other => panic!("expected a completed cycle, got {:?}", other),
    }
}

#[tokio::test]
async fn test_crawl_stays_in_domain() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/a">A</a>
            <a href="b">B</a>
            <a href="https://other.example.org/elsewhere">Elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/a", r#"<a href="/">home</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/a#section">A again</a>"#).await;

    let crawler = create_crawler(&server, LinkAttributes::none(), LogSinks::new());
    let stats = completed(crawler.run_cycle("/").await);

    assert_eq!(stats.visited, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(urls(&crawler.snapshot()), expected(&server, &["", "/a", "/b"]));
}

#[tokio::test]
async fn test_crawl_follows_configured_attributes() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <button hx-get="/partial">Load</button>
            <a href="/page" hx-get="/ignored">Page</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/partial", "<p>partial</p>").await;
    mount_page(&server, "/page", "<p>page</p>").await;

    let attributes = LinkAttributes::new(["hx-get"]).unwrap();
    let crawler = create_crawler(&server, attributes, LogSinks::new());
    crawler.run_cycle("/").await;

    assert_eq!(
        urls(&crawler.snapshot()),
        expected(&server, &["", "/partial", "/page"])
    );
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/moved">Moved</a><a href="/missing">Missing</a><a href="/ok">OK</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/ok"))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", r#"<a href="/missing">Missing again</a>"#).await;

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink_errors = errors.clone();
    let sinks = LogSinks::new().with_error(move |e| {
        sink_errors.lock().unwrap().push(e.to_string());
    });

    let crawler = create_crawler(&server, LinkAttributes::none(), sinks);
    let stats = completed(crawler.run_cycle("/").await);

    assert_eq!(stats.visited, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(urls(&crawler.snapshot()), expected(&server, &["", "/ok"]));

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.contains("/moved")));
    assert!(errors.iter().any(|e| e.contains("/missing") && e.contains("404")));
}

#[tokio::test]
async fn test_unchanged_pages_keep_timestamp() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "<p>stable</p>").await;

    let crawler = create_crawler(&server, LinkAttributes::none(), LogSinks::new());
    completed(crawler.run_cycle("/").await);
    let first = crawler.page(&format!("{}/a", server.uri())).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let stats = completed(crawler.run_cycle("/").await);
    let second = crawler.page(&format!("{}/a", server.uri())).unwrap();

    assert_eq!(stats.changed, 0);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_changed_page_gets_new_timestamp() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "<p>version one</p>").await;
    mount_page(&server, "/b", "<p>stable</p>").await;

    let crawler = create_crawler(&server, LinkAttributes::none(), LogSinks::new());
    completed(crawler.run_cycle("/").await);

    let a_url = format!("{}/a", server.uri());
    let b_url = format!("{}/b", server.uri());
    let a_before = crawler.page(&a_url).unwrap();
    let b_before = crawler.page(&b_url).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    server.reset().await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "<p>version two</p>").await;
    mount_page(&server, "/b", "<p>stable</p>").await;

    let stats = completed(crawler.run_cycle("/").await);
    let a_after = crawler.page(&a_url).unwrap();
    let b_after = crawler.page(&b_url).unwrap();

    assert_eq!(stats.changed, 1);
    assert_ne!(a_before.fingerprint, a_after.fingerprint);
    assert!(a_after.last_changed > a_before.last_changed);
    assert_eq!(b_before, b_after);
}

#[tokio::test]
async fn test_unreachable_pages_are_removed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    mount_page(&server, "/old", "<p>old</p>").await;

    let crawler = create_crawler(&server, LinkAttributes::none(), LogSinks::new());
    completed(crawler.run_cycle("/").await);
    assert_eq!(urls(&crawler.snapshot()), expected(&server, &["", "/old"]));

    server.reset().await;
    mount_page(&server, "/", r#"<a href="/new">New</a>"#).await;
    mount_page(&server, "/old", "<p>old</p>").await;
    mount_page(&server, "/new", "<p>new</p>").await;

    let stats = completed(crawler.run_cycle("/").await);

    assert_eq!(stats.removed, 1);
    assert_eq!(urls(&crawler.snapshot()), expected(&server, &["", "/new"]));
}

#[tokio::test]
async fn test_unreachable_seed_clears_known_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "<p>a</p>").await;

    let crawler = create_crawler(&server, LinkAttributes::none(), LogSinks::new());
    completed(crawler.run_cycle("/").await);
    assert_eq!(crawler.snapshot().len(), 2);

    server.reset().await;

    let stats = completed(crawler.run_cycle("/").await);
    assert_eq!(stats.visited, 0);
    assert_eq!(stats.removed, 2);
    assert!(crawler.snapshot().is_empty());
}

#[tokio::test]
async fn test_snapshot_is_always_a_complete_cycle() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a1">1</a><a href="/a2">2</a>"#).await;
    mount_page(&server, "/a1", "<p>a1</p>").await;
    mount_page(&server, "/a2", "<p>a2</p>").await;

    let crawler = Arc::new(create_crawler(
        &server,
        LinkAttributes::none(),
        LogSinks::new(),
    ));
    completed(crawler.run_cycle("/").await);

    let site_a = expected(&server, &["", "/a1", "/a2"]);
    let site_b = expected(&server, &["", "/b1", "/b2"]);
    assert_eq!(urls(&crawler.snapshot()), site_a);

    server.reset().await;
    for (route, body) in [
        ("/", r#"<a href="/b1">1</a><a href="/b2">2</a>"#),
        ("/b1", "<p>b1</p>"),
        ("/b2", "<p>b2</p>"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .set_delay(Duration::from_millis(50)),
            )
            .mount(&server)
            .await;
    }

    let running = {
        let crawler = crawler.clone();
        tokio::spawn(async move { crawler.run_cycle("/").await })
    };

    while !running.is_finished() {
        let snapshot = urls(&crawler.snapshot());
        assert!(
            snapshot == site_a || snapshot == site_b,
            "snapshot mixes cycles: {:?}",
            snapshot
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    completed(running.await.unwrap());
    assert_eq!(urls(&crawler.snapshot()), site_b);
    assert_eq!(crawler.cycles_completed(), 2);
}

#[tokio::test]
async fn test_generate_sitemap_from_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/blog">Blog</a><a href="/admin/login">Admin</a>"#,
    )
    .await;
    mount_page(&server, "/blog", "<p>blog</p>").await;
    mount_page(&server, "/admin/login", "<p>login</p>").await;

    let crawler = create_crawler(&server, LinkAttributes::none(), LogSinks::new());
    crawler.run_cycle("/").await;

    let options = SitemapOptions::new("https://example.com").exclude("/admin");
    let xml = crawler.generate_sitemap(&options).unwrap();

    assert!(xml.contains("<loc>https://example.com</loc>"));
    assert!(xml.contains("<loc>https://example.com/blog</loc>"));
    assert!(!xml.contains("admin"));
    assert!(!xml.contains(&server.uri()));
}
