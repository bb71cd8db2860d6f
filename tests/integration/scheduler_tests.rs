//! Integration tests for crawl scheduling
//!
//! These tests drive the scheduler and the `SiteMapper` facade against
//! wiremock servers with short delays and intervals.

use sitemapper::config::{parse_config, HttpConfig};
use sitemapper::crawler::{build_http_client, CrawlCallback, LinkAttributes, ScheduleSettings};
use sitemapper::{Crawler, Domain, LogSinks, Scheduler, SiteMapper};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(10);

async fn mount_site(server: &MockServer, delay: Duration) {
    for (route, body) in [
        ("/", r#"<a href="/about">About</a>"#),
        ("/about", "<p>about</p>"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }
}

fn create_crawler(server: &MockServer) -> Arc<Crawler> {
    let domain = Domain::parse(&server.uri()).expect("mock server uri is a valid domain");
    let client = build_http_client(&HttpConfig::default()).expect("Failed to build client");
    Arc::new(Crawler::new(
        domain,
        LinkAttributes::none(),
        client,
        LogSinks::new(),
    ))
}

fn settings(startup_delay: Duration, crawl_interval: Duration) -> ScheduleSettings {
    ScheduleSettings {
        seed: "/".to_string(),
        startup_delay,
        crawl_interval,
    }
}

/// A callback counting its invocations
fn counting_callback() -> (CrawlCallback, Arc<AtomicU64>) {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = calls.clone();
    let callback: CrawlCallback = Arc::new(move |_crawler: &Crawler| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (callback, calls)
}

#[tokio::test]
async fn test_first_cycle_runs_without_delay() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let (callback, calls) = counting_callback();
    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::ZERO, Duration::ZERO),
        Some(callback),
    );

    timeout(WAIT, scheduler.wait_for_cycles(1))
        .await
        .expect("first cycle did not finish");

    assert_eq!(scheduler.crawler().snapshot().len(), 2);
    // the startup cycle does not invoke the callback
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_startup_delay_is_honored() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::from_millis(400), Duration::ZERO),
        None,
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(scheduler.cycles_completed(), 0);
    assert!(server.received_requests().await.unwrap().is_empty());

    timeout(WAIT, scheduler.wait_for_cycles(1))
        .await
        .expect("first cycle did not finish");

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_stop_during_startup_delay() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::from_secs(3600), Duration::ZERO),
        None,
    );

    timeout(Duration::from_secs(2), scheduler.shutdown())
        .await
        .expect("shutdown waited for the startup delay");

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_trigger_runs_another_cycle() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let (callback, calls) = counting_callback();
    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::ZERO, Duration::ZERO),
        Some(callback),
    );
    timeout(WAIT, scheduler.wait_for_cycles(1))
        .await
        .expect("first cycle did not finish");

    scheduler.trigger();
    timeout(WAIT, scheduler.wait_for_cycles(2))
        .await
        .expect("triggered cycle did not finish");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_back_to_back_triggers_coalesce() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::from_millis(100)).await;

    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::ZERO, Duration::ZERO),
        None,
    );
    timeout(WAIT, scheduler.wait_for_cycles(1))
        .await
        .expect("first cycle did not finish");

    scheduler.trigger();
    scheduler.trigger();

    timeout(WAIT, scheduler.wait_for_cycles(2))
        .await
        .expect("triggered cycle did not finish");
    tokio::time::sleep(Duration::from_millis(800)).await;

    let completed = scheduler.cycles_completed();
    assert!(
        (2..=3).contains(&completed),
        "expected one or two extra cycles, got {}",
        completed - 1
    );

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_triggers_during_cycle_collapse_into_one() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::from_millis(200)).await;

    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::ZERO, Duration::ZERO),
        None,
    );
    timeout(WAIT, scheduler.wait_for_cycles(1))
        .await
        .expect("first cycle did not finish");

    scheduler.trigger();
    // the second cycle is now fetching its first page
    tokio::time::sleep(Duration::from_millis(100)).await;
    for _ in 0..5 {
        scheduler.trigger();
    }

    timeout(WAIT, scheduler.wait_for_cycles(3))
        .await
        .expect("queued cycle did not finish");
    tokio::time::sleep(Duration::from_millis(1000)).await;

    assert_eq!(scheduler.cycles_completed(), 3);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_rejected_seed_still_invokes_callback() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let crawler = create_crawler(&server);
    crawler.run_cycle("/").await;
    let before = crawler.snapshot();
    assert_eq!(before.len(), 2);

    let (callback, calls) = counting_callback();
    let scheduler = Scheduler::start(
        crawler,
        ScheduleSettings {
            seed: "javascript:void(0)".to_string(),
            startup_delay: Duration::ZERO,
            crawl_interval: Duration::ZERO,
        },
        Some(callback),
    );
    timeout(WAIT, scheduler.wait_for_cycles(1))
        .await
        .expect("startup cycle did not finish");

    scheduler.trigger();
    timeout(WAIT, scheduler.wait_for_cycles(2))
        .await
        .expect("triggered cycle did not finish");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    scheduler.trigger();
    timeout(WAIT, scheduler.wait_for_cycles(3))
        .await
        .expect("scheduler stopped after a rejected seed");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let mut after = scheduler.crawler().snapshot();
    let mut before = before;
    after.sort_by(|a, b| a.url.cmp(&b.url));
    before.sort_by(|a, b| a.url.cmp(&b.url));
    assert_eq!(after, before);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_interval_drives_cycles() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let (callback, calls) = counting_callback();
    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::ZERO, Duration::from_millis(100)),
        Some(callback),
    );

    timeout(WAIT, scheduler.wait_for_cycles(3))
        .await
        .expect("interval cycles did not run");

    scheduler.shutdown().await;
    assert!(calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_no_cycles_after_shutdown() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let scheduler = Scheduler::start(
        create_crawler(&server),
        settings(Duration::ZERO, Duration::from_millis(50)),
        None,
    );
    timeout(WAIT, scheduler.wait_for_cycles(2))
        .await
        .expect("interval cycles did not run");

    timeout(WAIT, scheduler.shutdown())
        .await
        .expect("shutdown did not finish");

    let requests = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), requests);
}

#[tokio::test]
async fn test_site_mapper_end_to_end() {
    let server = MockServer::start().await;
    mount_site(&server, Duration::ZERO).await;

    let config = parse_config(&format!(
        r#"
        [site]
        domain = "{}"

        [schedule]
        startup-delay-ms = 0
        crawl-interval-ms = 0

        [sitemap]
        output-domain = "https://example.com"
        "#,
        server.uri()
    ))
    .unwrap();

    let messages = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink_messages = messages.clone();
    let (callback, calls) = counting_callback();

    let mapper = SiteMapper::builder(config)
        .on_info(move |m| sink_messages.lock().unwrap().push(m.to_string()))
        .on_crawl(move |crawler| callback(crawler))
        .start()
        .unwrap();

    timeout(WAIT, mapper.wait_for_cycles(1))
        .await
        .expect("first cycle did not finish");
    assert_eq!(mapper.pages().len(), 2);

    mapper.recrawl();
    timeout(WAIT, mapper.wait_for_cycles(2))
        .await
        .expect("recrawl did not finish");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let xml = mapper.configured_sitemap().unwrap();
    assert!(xml.contains("<loc>https://example.com</loc>"));
    assert!(xml.contains("<loc>https://example.com/about</loc>"));

    let xml = mapper.generate_sitemap("https://mirror.example.net", Some("about")).unwrap();
    assert!(xml.contains("<loc>https://mirror.example.net</loc>"));
    assert!(!xml.contains("about"));

    let empty = mapper.empty_sitemap("https://example.com");
    assert!(empty.contains("<loc>https://example.com/</loc>"));

    assert!(messages
        .lock()
        .unwrap()
        .contains(&format!("Crawling '{}/about'", server.uri())));

    mapper.shutdown().await;
}
