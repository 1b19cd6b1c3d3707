//! Integration tests for the Harvester
//!
//! These tests use wiremock to create mock HTTP servers and drive full visits
//! end-to-end. `Harvester::visit` is blocking, so most tests are plain
//! `#[test]` functions: the mock server lives on its own runtime owned by
//! [`TestServer`], and the Harvester is driven from the test thread.

use harvester::storage::SqliteStore;
use harvester::{HarvestError, Harvester, VisitedStore};
use reqwest::header::{HeaderValue, USER_AGENT};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROBOTS: &str = "User-agent: *\nDisallow: /disallowed";

const RELATIVE_LINKS: &str = r#"<!DOCTYPE html>
<html>
<head><title>Relative Links</title></head>
<body>
  <h1>Relative Links Page</h1>
  <ul>
    <li><a href="/page1">Page 1</a></li>
    <li><a href="../page2">Page 2</a></li>
    <li><a href="./page3">Page 3</a></li>
    <li><a href="/path/to/page4">Nested Page 4</a></li>
    <li><a href="/path/to/page5#section1">Nested Page 5 with Anchor</a></li>
  </ul>
</body>
</html>"#;

/// Mock server plus the runtime that serves it
struct TestServer {
    // Declared first so it drops before its runtime
    server: MockServer,
    rt: tokio::runtime::Runtime,
}

impl TestServer {
    fn start() -> Self {
        let rt = tokio::runtime::Runtime::new().expect("Failed to build test runtime");
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn page(&self, route: &str, body: &str) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(body)
                        .insert_header("content-type", "text/html"),
                ),
        );
    }

    fn robots(&self, status: u16, body: &str) {
        self.mount(
            Mock::given(method("GET"))
                .and(path("/robots.txt"))
                .respond_with(ResponseTemplate::new(status).set_body_string(body)),
        );
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.server.uri(), route)
    }

    /// Number of requests the server received for `route`
    fn hits(&self, route: &str) -> usize {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == route)
            .count()
    }
}

/// Server with the standard pages and robots.txt used by most tests
fn standard_server() -> TestServer {
    let server = TestServer::start();
    server.robots(200, ROBOTS);
    server.page("/allowed", "<html><body><p>allowed</p></body></html>");
    server.page("/disallowed", "<html><body><p>disallowed</p></body></html>");
    server.page("/relative_links", RELATIVE_LINKS);
    server
}

#[test]
fn test_visit_runs_hooks_in_order() {
    let server = standard_server();
    let harvester = Harvester::new().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));

    let log = events.clone();
    harvester.on_request(move |req| log.lock().unwrap().push(format!("request {}", req.url().path())));
    let log = events.clone();
    harvester.on_response(move |res| log.lock().unwrap().push(format!("response {}", res.status().as_u16())));
    let log = events.clone();
    harvester
        .on_html("p", move |el| log.lock().unwrap().push(format!("html {}", el.text())))
        .unwrap();

    harvester.visit(&server.url("/allowed")).unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["request /allowed", "response 200", "html allowed"]
    );
    assert!(harvester.store().is_visited(&server.url("/allowed")).unwrap());
}

#[test]
fn test_robots_disallowed_path() {
    let server = standard_server();
    let harvester = Harvester::new().unwrap();

    harvester.visit(&server.url("/allowed")).unwrap();

    let err = harvester.visit(&server.url("/disallowed")).unwrap_err();
    assert!(err.is_robots_rejection(), "unexpected error: {}", err);
    assert_eq!(server.hits("/disallowed"), 0);

    // One robots.txt fetch per host, however many pages
    assert_eq!(server.hits("/robots.txt"), 1);
    assert_eq!(harvester.robots().fetch_count(), 1);
}

#[test]
fn test_ignore_robots_skips_fetch() {
    let server = standard_server();
    let harvester = Harvester::builder().ignore_robots(true).build().unwrap();

    harvester.visit(&server.url("/disallowed")).unwrap();
    harvester.visit(&server.url("/allowed")).unwrap();

    assert_eq!(server.hits("/robots.txt"), 0);
    assert_eq!(server.hits("/disallowed"), 1);
}

#[test]
fn test_robots_agent_specific_group() {
    let server = TestServer::start();
    server.robots(200, "User-agent: Harvester\nDisallow: /\n\nUser-agent: *\nAllow: /");
    server.page("/allowed", "ok");

    let harvester = Harvester::new().unwrap();
    let err = harvester.visit(&server.url("/allowed")).unwrap_err();
    assert!(err.is_robots_rejection());

    let other = Harvester::builder().robots_agent("OtherBot").build().unwrap();
    other.visit(&server.url("/allowed")).unwrap();
}

#[test]
fn test_robots_client_error_allows_all() {
    let server = TestServer::start();
    server.robots(404, "");
    server.page("/disallowed", "ok");

    let harvester = Harvester::new().unwrap();
    harvester.visit(&server.url("/disallowed")).unwrap();
    assert_eq!(server.hits("/robots.txt"), 1);
}

#[test]
fn test_robots_server_error_disallows_all() {
    let server = TestServer::start();
    server.robots(503, "");
    server.page("/allowed", "ok");

    let harvester = Harvester::new().unwrap();
    let err = harvester.visit(&server.url("/allowed")).unwrap_err();
    assert!(err.is_robots_rejection());
    assert_eq!(server.hits("/allowed"), 0);
}

#[test]
fn test_disallowed_prefix_issues_no_request() {
    let server = standard_server();
    let harvester = Harvester::builder()
        .disallowed_urls(vec![server.url("/disallowed")])
        .ignore_robots(true)
        .build()
        .unwrap();

    let err = harvester.visit(&server.url("/disallowed")).unwrap_err();
    assert!(matches!(err, HarvestError::Forbidden { .. }));
    assert!(err.is_policy_rejection());
    assert_eq!(server.hits("/disallowed"), 0);

    harvester.visit(&server.url("/allowed")).unwrap();
}

#[test]
fn test_allowed_prefix_restricts() {
    let server = standard_server();
    let harvester = Harvester::builder()
        .allowed_urls(vec![server.url("/allowed")])
        .build()
        .unwrap();

    harvester.visit(&server.url("/allowed")).unwrap();

    let err = harvester.visit(&server.url("/relative_links")).unwrap_err();
    assert!(matches!(err, HarvestError::Forbidden { .. }));
    assert_eq!(server.hits("/relative_links"), 0);
}

#[test]
fn test_revisit_rejected_unless_allowed() {
    let server = standard_server();

    let harvester = Harvester::new().unwrap();
    harvester.visit(&server.url("/allowed")).unwrap();
    let err = harvester.visit(&server.url("/allowed")).unwrap_err();
    assert!(matches!(err, HarvestError::AlreadyVisited { .. }));
    assert_eq!(server.hits("/allowed"), 1);

    let revisiting = Harvester::builder().allow_revisit(true).build().unwrap();
    revisiting.visit(&server.url("/allowed")).unwrap();
    revisiting.visit(&server.url("/allowed")).unwrap();
    assert_eq!(server.hits("/allowed"), 3);
}

#[test]
fn test_depth_limit_bounds_request_visit() {
    let server = standard_server();
    let harvester = Harvester::builder()
        .depth_limit(2)
        .allow_revisit(true)
        .build()
        .unwrap();

    let rejections = Arc::new(Mutex::new(Vec::new()));
    let seen = rejections.clone();
    harvester.on_response(move |res| {
        if let Err(e) = res.request().visit(res.request().url().as_str()) {
            seen.lock().unwrap().push(e.to_string());
        }
    });

    harvester.visit(&server.url("/allowed")).unwrap();

    assert_eq!(server.hits("/allowed"), 2);
    assert_eq!(
        *rejections.lock().unwrap(),
        vec!["depth limit exceeded: 2 >= 2".to_string()]
    );
}

#[test]
fn test_zero_depth_limit_leaves_request_visit_unbounded() {
    let server = standard_server();
    let harvester = Harvester::builder()
        .depth_limit(0)
        .allow_revisit(true)
        .build()
        .unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    harvester.on_response(move |res| {
        let fetched = counter.fetch_add(1, Ordering::SeqCst) + 1;
        assert_eq!(res.request().depth(), fetched - 1);
        if fetched >= 12 {
            return;
        }
        res.request().visit(res.request().url().as_str()).unwrap();
    });

    harvester.visit(&server.url("/allowed")).unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 12);
    assert_eq!(server.hits("/allowed"), 12);
}

#[test]
fn test_harvester_visit_starts_at_depth_zero() {
    let server = standard_server();
    let harvester = Harvester::builder()
        .depth_limit(2)
        .allow_revisit(true)
        .build()
        .unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    harvester.on_response(move |res| {
        if counter.fetch_add(1, Ordering::SeqCst) + 1 >= 10 {
            return;
        }
        assert_eq!(res.request().depth(), 0);
        let handle = res.request().harvester().expect("harvester alive");
        handle.visit(res.request().url().as_str()).unwrap();
    });

    harvester.visit(&server.url("/allowed")).unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 10);
    assert_eq!(server.hits("/allowed"), 10);
}

#[test]
fn test_relative_links_resolve() {
    let server = standard_server();
    let harvester = Harvester::new().unwrap();

    let links = Arc::new(Mutex::new(Vec::new()));
    let found = links.clone();
    harvester
        .on_html("a[href]", move |el| {
            let href = el.attr("href").unwrap();
            found.lock().unwrap().push(el.request().absolute_url(href));
        })
        .unwrap();

    harvester.visit(&server.url("/relative_links")).unwrap();

    let expected: Vec<Option<String>> = [
        "/page1",
        "/page2",
        "/page3",
        "/path/to/page4",
        "/path/to/page5#section1",
    ]
    .iter()
    .map(|route| Some(server.url(route)))
    .collect();
    assert_eq!(*links.lock().unwrap(), expected);
}

#[test]
fn test_element_hooks_follow_links() {
    let server = TestServer::start();
    server.page("/", r#"<a href="/a">A</a> <a href="/b">B</a> <a href="mailto:x@y.z">mail</a>"#);
    server.page("/a", r#"<a href="/">home</a> <a href="/c">C</a>"#);
    server.page("/b", r#"<a href="/c">C</a>"#);
    server.page("/c", r#"<a href="/d">D</a>"#);
    server.page("/d", "end");

    let harvester = Harvester::builder().depth_limit(3).build().unwrap();
    let fetched = Arc::new(Mutex::new(Vec::new()));

    let log = fetched.clone();
    harvester.on_response(move |res| log.lock().unwrap().push(res.request().url().path().to_string()));
    harvester
        .on_html("a[href]", |el| {
            if let Some(link) = el.attr("href").and_then(|href| el.request().absolute_url(href)) {
                let _ = el.request().visit(&link);
            }
        })
        .unwrap();

    harvester.visit(&server.url("/")).unwrap();

    // /d sits at depth 3 and is never fetched; /c only once
    assert_eq!(*fetched.lock().unwrap(), vec!["/", "/a", "/c", "/b"]);
    assert_eq!(server.hits("/d"), 0);
}

#[test]
fn test_body_readable_by_every_hook() {
    use std::io::Read;

    let server = standard_server();
    let harvester = Harvester::new().unwrap();
    let bodies = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..2 {
        let bodies = bodies.clone();
        harvester.on_response(move |res| {
            let mut body = String::new();
            res.body_reader().read_to_string(&mut body).unwrap();
            bodies.lock().unwrap().push(body);
        });
    }
    let texts = bodies.clone();
    harvester
        .on_html("body p", move |el| {
            texts.lock().unwrap().push(el.response().text().into_owned());
        })
        .unwrap();

    harvester.visit(&server.url("/allowed")).unwrap();

    let bodies = bodies.lock().unwrap();
    assert_eq!(bodies.len(), 3);
    assert!(bodies.iter().all(|b| b == "<html><body><p>allowed</p></body></html>"));
}

#[test]
fn test_request_hook_sets_header() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/user_agent"))
            .and(header("user-agent", "Test User Agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("matched")),
    );

    let harvester = Harvester::builder().ignore_robots(true).build().unwrap();
    harvester.on_request(|req| {
        req.headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static("Test User Agent"));
    });

    let status = Arc::new(AtomicUsize::new(0));
    let seen = status.clone();
    harvester.on_response(move |res| seen.store(res.status().as_u16() as usize, Ordering::SeqCst));

    harvester.visit(&server.url("/user_agent")).unwrap();
    assert_eq!(status.load(Ordering::SeqCst), 200);
}

#[test]
fn test_non_success_status_is_delivered() {
    let server = TestServer::start();
    let harvester = Harvester::builder().ignore_robots(true).build().unwrap();

    let status = Arc::new(AtomicUsize::new(0));
    let seen = status.clone();
    harvester.on_response(move |res| seen.store(res.status().as_u16() as usize, Ordering::SeqCst));

    // Nothing is mounted, so wiremock answers 404
    harvester.visit(&server.url("/missing")).unwrap();
    assert_eq!(status.load(Ordering::SeqCst), 404);
    assert!(harvester.store().is_visited(&server.url("/missing")).unwrap());
}

#[test]
fn test_redirect_not_followed_when_disabled() {
    let server = standard_server();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/redirect"))
            .respond_with(ResponseTemplate::new(303).insert_header("Location", "/allowed")),
    );

    let harvester = Harvester::builder().follow_redirects(false).build().unwrap();
    let status = Arc::new(AtomicUsize::new(0));
    let seen = status.clone();
    harvester.on_response(move |res| {
        assert_eq!(res.request().url().path(), "/redirect");
        seen.store(res.status().as_u16() as usize, Ordering::SeqCst);
    });

    harvester.visit(&server.url("/redirect")).unwrap();
    assert_eq!(status.load(Ordering::SeqCst), 303);
    assert_eq!(server.hits("/allowed"), 0);
}

#[test]
fn test_redirect_followed_by_default() {
    let server = standard_server();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/redirect"))
            .respond_with(ResponseTemplate::new(303).insert_header("Location", "/allowed")),
    );

    let harvester = Harvester::new().unwrap();
    harvester.visit(&server.url("/redirect")).unwrap();
    assert_eq!(server.hits("/allowed"), 1);
}

#[test]
fn test_cancellation_aborts_in_flight_request() {
    let server = standard_server();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/heavyweight"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_secs(2)),
            ),
    );

    let token = CancellationToken::new();
    let harvester = Harvester::builder()
        .cancellation_token(token.clone())
        .build()
        .unwrap();

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(1));
        token.cancel();
    });

    let started = Instant::now();
    let err = harvester.visit(&server.url("/heavyweight")).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, HarvestError::Cancelled { .. }), "unexpected error: {}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!harvester.store().is_visited(&server.url("/heavyweight")).unwrap());
}

#[test]
fn test_invalid_url_runs_no_hooks() {
    let harvester = Harvester::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    harvester.on_request(move |_req| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = harvester.visit("not a url").unwrap_err();
    assert!(matches!(err, HarvestError::InvalidUrl(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_fork_resets_hooks_but_shares_state() {
    let server = standard_server();
    let harvester = Harvester::new().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    harvester.on_response(move |_res| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let fork = harvester.fork();
    fork.visit(&server.url("/allowed")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Visited store and robots cache are shared
    let err = harvester.visit(&server.url("/allowed")).unwrap_err();
    assert!(matches!(err, HarvestError::AlreadyVisited { .. }));
    harvester.visit(&server.url("/relative_links")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(server.hits("/robots.txt"), 1);
}

#[test]
fn test_sqlite_store_persists_visits() {
    let server = standard_server();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("visited.db");

    {
        let store = Arc::new(SqliteStore::new(&db_path).unwrap());
        let harvester = Harvester::builder().store(store.clone()).build().unwrap();
        harvester.visit(&server.url("/allowed")).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    let store = Arc::new(SqliteStore::new(&db_path).unwrap());
    assert!(store.is_visited(&server.url("/allowed")).unwrap());

    let harvester = Harvester::builder().store(store).build().unwrap();
    let err = harvester.visit(&server.url("/allowed")).unwrap_err();
    assert!(matches!(err, HarvestError::AlreadyVisited { .. }));
    assert_eq!(server.hits("/allowed"), 1);
}

#[test]
fn test_concurrent_visits_share_one_harvester() {
    let server = standard_server();
    let harvester = Harvester::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    harvester.on_response(move |_res| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let urls = vec![server.url("/allowed"), server.url("/relative_links")];
    let workers: Vec<_> = urls
        .into_iter()
        .map(|url| {
            let harvester = harvester.clone();
            std::thread::spawn(move || harvester.visit(&url))
        })
        .collect();

    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(harvester.store().is_visited(&server.url("/allowed")).unwrap());
    assert!(harvester.store().is_visited(&server.url("/relative_links")).unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_visit_from_async_context() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/allowed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;
    let url = format!("{}/allowed", mock_server.uri());

    // The Harvester blocks and owns a runtime, so it lives entirely on a
    // blocking thread
    let status = tokio::task::spawn_blocking(move || {
        let harvester = Harvester::builder().ignore_robots(true).build()?;
        let status = Arc::new(AtomicUsize::new(0));
        let seen = status.clone();
        harvester.on_response(move |res| seen.store(res.status().as_u16() as usize, Ordering::SeqCst));
        harvester.visit(&url)?;
        Ok::<_, HarvestError>(status.load(Ordering::SeqCst))
    })
    .await
    .expect("blocking task panicked")
    .unwrap();

    assert_eq!(status, 200);
}
