//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! analyses end-to-end. The private-network guard is disabled so the local
//! mock server can be crawled, except in the test that checks the guard.

use site_audit::config::UserAgentConfig;
use site_audit::output::{OutputResult, SharedStorage, SqliteSink};
use site_audit::storage::{open_storage, Storage};
use site_audit::{
    run_analysis, spawn_analysis, CrawlSettings, CrawlStrategy, CrawlTarget, MemorySink,
    PageRecord, ResultsSink, RunStatus, RunSummary, SeoIssue,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Settings suited to a local mock server
fn test_settings() -> CrawlSettings {
    CrawlSettings {
        rate_limit_ms: 0,
        timeout_ms: 5_000,
        discovery_timeout_ms: 2_000,
        allow_private_hosts: true,
        ..CrawlSettings::default()
    }
}

/// Builds a small HTML page linking to `links`
fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, anchors
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn analyze(
    server: &MockServer,
    settings: CrawlSettings,
    exclusions: &[&str],
) -> (RunSummary, Arc<MemorySink>) {
    let target = CrawlTarget::new(&server.uri(), settings, exclusions).unwrap();
    let sink = Arc::new(MemorySink::new());
    let summary = run_analysis(target, UserAgentConfig::default(), sink.clone())
        .await
        .unwrap();
    (summary, sink)
}

fn visited_paths(server: &MockServer, pages: &[PageRecord]) -> Vec<String> {
    let base = server.uri();
    pages
        .iter()
        .map(|p| p.url.trim_start_matches(&base).to_string())
        .collect()
}

#[tokio::test]
async fn test_breadth_first_visits_level_by_level() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/a", "/b"])).await;
    mount_page(&server, "/a", html_page("A", &["/c"])).await;
    mount_page(&server, "/b", html_page("B", &["/d"])).await;
    mount_page(&server, "/c", html_page("C", &[])).await;
    mount_page(&server, "/d", html_page("D", &[])).await;

    let (summary, sink) = analyze(&server, test_settings(), &[]).await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.pages_crawled, 5);
    assert_eq!(
        visited_paths(&server, &sink.pages()),
        vec!["/", "/a", "/b", "/c", "/d"]
    );
}

#[tokio::test]
async fn test_depth_first_follows_first_link() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/a", "/b"])).await;
    mount_page(&server, "/a", html_page("A", &["/c"])).await;
    mount_page(&server, "/b", html_page("B", &["/d"])).await;
    mount_page(&server, "/c", html_page("C", &[])).await;
    mount_page(&server, "/d", html_page("D", &[])).await;

    let settings = CrawlSettings {
        crawl_strategy: CrawlStrategy::DepthFirst,
        ..test_settings()
    };
    let (_, sink) = analyze(&server, settings, &[]).await;

    assert_eq!(
        visited_paths(&server, &sink.pages()),
        vec!["/", "/a", "/c", "/b", "/d"]
    );
}

#[tokio::test]
async fn test_excluded_links_are_never_fetched() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("Home", &["/listings/123", "/about"]),
    )
    .await;
    mount_page(&server, "/about", html_page("About", &[])).await;
    Mock::given(method("GET"))
        .and(path("/listings/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Listing", &[])))
        .expect(0)
        .mount(&server)
        .await;

    // Budget of 2 is filled by / and /about; the listing never takes a slot
    let settings = CrawlSettings {
        max_pages: 2,
        ..test_settings()
    };
    let (summary, sink) = analyze(&server, settings, &["*/listings/*"]).await;

    assert_eq!(visited_paths(&server, &sink.pages()), vec!["/", "/about"]);
    assert_eq!(summary.skipped_urls, 1);
}

#[tokio::test]
async fn test_robots_sitemap_seeds_the_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nDisallow:\n\nSitemap: {}/custom-sitemap.xml\n",
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/custom-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/p1</loc></url>
  <url><loc>{base}/p2</loc></url>
</urlset>"#
        )))
        .mount(&server)
        .await;
    mount_page(&server, "/p1", html_page("P1", &[])).await;
    mount_page(&server, "/p2", html_page("P2", &[])).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Home", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let (_, sink) = analyze(&server, test_settings(), &[]).await;

    assert_eq!(visited_paths(&server, &sink.pages()), vec!["/p1", "/p2"]);
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", &["/private/x", "/public"])).await;
    mount_page(&server, "/public", html_page("Public", &[])).await;
    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Secret", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let (summary, sink) = analyze(&server, test_settings(), &[]).await;

    assert_eq!(visited_paths(&server, &sink.pages()), vec!["/", "/public"]);
    assert_eq!(summary.skipped_urls, 1);
}

#[tokio::test]
async fn test_page_budget_is_never_exceeded() {
    let server = MockServer::start().await;
    let links: Vec<String> = (0..10).map(|i| format!("/page{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Home", &link_refs)).await;
    for link in &links {
        mount_page(&server, link, html_page(link, &[])).await;
    }

    let settings = CrawlSettings {
        max_pages: 3,
        ..test_settings()
    };
    let (summary, sink) = analyze(&server, settings, &[]).await;

    assert_eq!(summary.pages_crawled, 3);
    assert_eq!(sink.pages().len(), 3);
}

#[tokio::test]
async fn test_equivalent_urls_are_fetched_once() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &["/a", "/A/", "/a#section", "/a?y=2&x=1", "/a?x=1&y=2"],
        ),
    )
    .await;
    mount_page(&server, "/a", html_page("A", &["/"])).await;

    let (_, sink) = analyze(&server, test_settings(), &[]).await;

    let pages = sink.pages();
    let unique: HashSet<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(unique.len(), pages.len());
    assert_eq!(
        visited_paths(&server, &pages),
        vec!["/", "/a", "/a?x=1&y=2"]
    );
}

#[tokio::test]
async fn test_failed_fetches_do_not_stop_the_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/missing", "/ok"])).await;
    mount_page(&server, "/ok", html_page("Ok", &[])).await;

    let (summary, sink) = analyze(&server, test_settings(), &[]).await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.failed_urls, 1);
    assert_eq!(visited_paths(&server, &sink.pages()), vec!["/", "/ok"]);
}

#[tokio::test]
async fn test_redirect_within_site_is_recorded_under_requested_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/old"])).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/new", html_page("New", &[])).await;

    let (summary, sink) = analyze(&server, test_settings(), &[]).await;

    let pages = sink.pages();
    assert_eq!(visited_paths(&server, &pages), vec!["/", "/old"]);
    assert_eq!(pages[1].title.as_deref(), Some("New"));
    assert_eq!(summary.skipped_urls, 0);
}

#[tokio::test]
async fn test_redirect_off_site_is_never_recorded() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/landing", elsewhere.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&elsewhere, "/landing", html_page("Foreign Page", &["/deeper"])).await;
    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Deeper", &[])))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let (summary, sink) = analyze(&server, test_settings(), &[]).await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.pages_crawled, 0);
    assert_eq!(summary.skipped_urls, 1);
    assert!(sink.pages().is_empty());
    assert!(sink.issues().is_empty());
}

#[tokio::test]
async fn test_clean_page_scores_perfectly() {
    let server = MockServer::start().await;
    let words = "word ".repeat(400);
    let body = format!(
        r#"<html><head>
<title>{}</title>
<meta name="description" content="{}">
<meta property="og:title" content="Clean">
<script type="application/ld+json">{{"@type": "WebPage"}}</script>
</head><body><h1>Clean page</h1><img src="/x.png" alt="x"><p>{}</p></body></html>"#,
        "t".repeat(55),
        "m".repeat(150),
        words
    );
    mount_page(&server, "/", body).await;

    let (summary, sink) = analyze(&server, test_settings(), &[]).await;

    assert!(sink.issues().is_empty());
    let scores = summary.scores.unwrap();
    assert_eq!(scores.overall, 100);
    assert_eq!(scores.technical, 100);
    assert_eq!(scores.content, 100);
    assert_eq!(scores.mobile, 100);
    assert_eq!(scores.ai_chatbot, 100);
}

#[tokio::test]
async fn test_thin_untitled_page_issues() {
    let server = MockServer::start().await;
    let words = "word ".repeat(50);
    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><meta property="og:title" content="x">
<script type="application/ld+json">{{}}</script></head><body><p>{}</p></body></html>"#,
            words
        ),
    )
    .await;

    let (summary, sink) = analyze(&server, test_settings(), &[]).await;

    let types: Vec<String> = sink.issues().into_iter().map(|i| i.issue_type).collect();
    assert_eq!(
        types,
        vec!["Missing Title", "Missing Meta Description", "Missing H1", "Thin Content"]
    );
    assert_eq!(summary.critical_issues, 3);
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.scores.unwrap().technical, 70);
}

/// Cancels the run once `limit` pages have been recorded
struct CancelAfter {
    inner: MemorySink,
    limit: usize,
}

impl ResultsSink for CancelAfter {
    fn record_page(&self, page: &PageRecord) -> OutputResult<()> {
        self.inner.record_page(page)?;
        if self.inner.pages().len() >= self.limit {
            self.inner.cancel();
        }
        Ok(())
    }

    fn record_issues(&self, issues: &[SeoIssue]) -> OutputResult<()> {
        self.inner.record_issues(issues)
    }

    fn finalize(&self, summary: &RunSummary) -> OutputResult<()> {
        self.inner.finalize(summary)
    }

    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

#[tokio::test]
async fn test_cancellation_keeps_recorded_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/a", "/b", "/c"])).await;
    mount_page(&server, "/a", html_page("A", &[])).await;
    mount_page(&server, "/b", html_page("B", &[])).await;
    mount_page(&server, "/c", html_page("C", &[])).await;

    let target = CrawlTarget::new(&server.uri(), test_settings(), &[] as &[&str]).unwrap();
    let sink = Arc::new(CancelAfter {
        inner: MemorySink::new(),
        limit: 2,
    });

    let summary = spawn_analysis(target, UserAgentConfig::default(), sink.clone())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.status, RunStatus::Failed);
    assert_eq!(summary.pages_crawled, 2);
    assert!(summary.scores.is_none());
    assert!(summary.error_message.is_some());
    assert_eq!(sink.inner.pages().len(), 2);
    assert!(sink.inner.issues().is_empty());
    assert_eq!(sink.inner.summary(), Some(summary));
}

#[tokio::test]
async fn test_guard_blocks_local_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Home", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let settings = CrawlSettings {
        allow_private_hosts: false,
        ..test_settings()
    };
    let (summary, sink) = analyze(&server, settings, &[]).await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.pages_crawled, 0);
    assert_eq!(summary.skipped_urls, 1);
    assert!(sink.pages().is_empty());
}

#[tokio::test]
async fn test_broken_links_are_reported() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/ok", "/gone"])).await;
    mount_page(&server, "/ok", html_page("Ok", &[])).await;
    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let settings = CrawlSettings {
        check_broken_links: true,
        ..test_settings()
    };
    let (_, sink) = analyze(&server, settings, &[]).await;

    let pages = sink.pages();
    assert_eq!(pages[0].broken_links, Some(1));
    assert_eq!(pages[1].broken_links, Some(0));

    let broken: Vec<SeoIssue> = sink
        .issues()
        .into_iter()
        .filter(|i| i.issue_type == "Broken Links")
        .collect();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].page_url.as_deref(), Some(pages[0].url.as_str()));
}

#[tokio::test]
async fn test_broken_links_unchecked_by_default() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &[])).await;

    let (_, sink) = analyze(&server, test_settings(), &[]).await;

    assert_eq!(sink.pages()[0].broken_links, None);
}

#[tokio::test]
async fn test_results_persisted_to_sqlite() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/a"])).await;
    mount_page(&server, "/a", html_page("A", &[])).await;

    let dir = TempDir::new().unwrap();
    let storage: SharedStorage = Arc::new(Mutex::new(
        open_storage(&dir.path().join("audit.db")).unwrap(),
    ));

    let target = CrawlTarget::new(&server.uri(), test_settings(), &[] as &[&str]).unwrap();
    let sink = Arc::new(
        SqliteSink::start(storage.clone(), target.base_url().as_str(), "hash").unwrap(),
    );
    let analysis_id = sink.analysis_id();

    let summary = run_analysis(target, UserAgentConfig::default(), sink)
        .await
        .unwrap();

    let guard = storage.lock().unwrap();
    let analysis = guard.get_analysis(analysis_id).unwrap();
    assert_eq!(analysis.status, RunStatus::Completed);
    assert_eq!(analysis.pages_crawled, 2);
    assert_eq!(analysis.scores, summary.scores);
    assert_eq!(analysis.total_issues, summary.total_issues);

    assert_eq!(guard.load_pages(analysis_id).unwrap().len(), 2);
    assert_eq!(
        guard.load_issues(analysis_id).unwrap().len() as u32,
        summary.total_issues
    );
}

#[tokio::test]
async fn test_sqlite_cancellation_by_another_writer() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &[])).await;

    let dir = TempDir::new().unwrap();
    let storage: SharedStorage = Arc::new(Mutex::new(
        open_storage(&dir.path().join("audit.db")).unwrap(),
    ));

    let target = CrawlTarget::new(&server.uri(), test_settings(), &[] as &[&str]).unwrap();
    let sink = Arc::new(
        SqliteSink::start(storage.clone(), target.base_url().as_str(), "hash").unwrap(),
    );
    let analysis_id = sink.analysis_id();

    storage
        .lock()
        .unwrap()
        .mark_failed(analysis_id, None, Some("Cancelled by user"))
        .unwrap();

    let summary = run_analysis(target, UserAgentConfig::default(), sink)
        .await
        .unwrap();
    assert_eq!(summary.status, RunStatus::Failed);
    assert_eq!(summary.pages_crawled, 0);

    let analysis = storage.lock().unwrap().get_analysis(analysis_id).unwrap();
    assert_eq!(analysis.status, RunStatus::Failed);
    assert_eq!(analysis.error_message.as_deref(), Some("Cancelled by user"));
    assert_eq!(analysis.scores, None);
}
