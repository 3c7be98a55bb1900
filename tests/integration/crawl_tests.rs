//! Integration tests for the auditor
//!
//! These tests use wiremock to create mock HTTP servers and run the full crawl and
//! audit cycle end-to-end.

use spider_audit::config::{load_config, Config};
use spider_audit::crawler::{run_audit, Coordinator};
use spider_audit::output::{JsonReportWriter, MarkdownReportWriter, ReportWriter};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration suited to a local mock server
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.interval_ms = 0;
    config.crawler.timeout_ms = 5_000;
    config.crawler.max_concurrency = 4;
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_anchor_is_reported() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r##"<html><head><title>Home</title></head><body>
            <a href="/page#exists">ok</a>
            <a href="/page#missing">broken</a>
        </body></html>"##,
    )
    .await;
    mount_page(
        &server,
        "/page",
        r#"<html><body><h2 id="exists">Here</h2></body></html>"#,
    )
    .await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert_eq!(report.errors.len(), 1);
    let finding = &report.errors[0];
    assert_eq!(finding.url, format!("{}/page#missing", base));
    assert_eq!(finding.msg, "Hash not found");
    assert_eq!(finding.linked_from, Some(vec![format!("{}/", base)]));
    assert_eq!(report.exit_code, 1);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.mime_counts.get("text/html;charset=utf-8"), Some(&2));
}

#[tokio::test]
async fn test_same_page_anchor() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r##"<html><body>
            <a href="#top">top</a>
            <a href="#bottom">bottom</a>
            <p id="top"></p>
        </body></html>"##,
    )
    .await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].url, format!("{}/#bottom", base));
}

#[tokio::test]
async fn test_anchor_resolved_through_redirect() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r##"<a href="/old#target">moved</a>"##).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", r#"<div id="target">found</div>"#).await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
    assert_eq!(
        report.redirects.get(&format!("{}/old", base)),
        Some(&format!("{}/new", base))
    );
    assert_eq!(report.success_count, 3);
    assert_eq!(report.exit_code, 0);
}

#[tokio::test]
async fn test_missing_anchor_after_redirect_has_chain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r##"<a href="/old#gone">moved</a>"##).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<p>no anchors</p>").await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert_eq!(report.errors.len(), 1);
    let finding = &report.errors[0];
    assert_eq!(finding.url, format!("{}/new#gone", base));
    assert_eq!(finding.redirect_from, Some(vec![format!("{}/old#gone", base)]));
}

#[tokio::test]
async fn test_not_found_with_provenance() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/gone">dead</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert_eq!(report.not_found.len(), 1);
    let finding = &report.not_found[0];
    assert_eq!(finding.url, format!("{}/gone", base));
    assert_eq!(finding.code, Some(404));
    assert_eq!(finding.msg, "Http code 404");
    assert_eq!(finding.linked_from, Some(vec![format!("{}/", base)]));
    assert_eq!(report.exit_code, 1);
}

#[tokio::test]
async fn test_server_error_is_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/broken">broken</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].msg, "Http code 500");
}

#[tokio::test]
async fn test_warn_only_status() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/legacy/page">legacy</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/legacy/page"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config
        .policy
        .http_warn_only_patterns
        .insert("404".to_string(), vec!["^#{ROOT_URL}/legacy/".to_string()]);

    let report = run_audit(&format!("{}/", base), config)
        .await
        .expect("audit failed");

    assert!(report.not_found.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        report.warnings[0].msg,
        "Ignoring 404 as configured by ^#{ROOT_URL}/legacy/"
    );
    assert_eq!(report.exit_code, 0);
}

#[tokio::test]
async fn test_hash_not_found_warn_only() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r##"<a href="/api/v1#method">api</a>"##).await;
    mount_page(&server, "/api/v1", "<p>generated</p>").await;

    let mut config = create_test_config();
    config.policy.hash_not_found_warn_only_patterns = vec!["#{ROOT}/api/".to_string()];

    let report = run_audit(&format!("{}/", base), config)
        .await
        .expect("audit failed");

    assert!(report.errors.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].url, format!("{}/api/v1#method", base));
}

#[tokio::test]
async fn test_hash_warn_only_matches_redirect_target() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r##"<a href="/docs/latest#install">docs</a>"##).await;
    Mock::given(method("GET"))
        .and(path("/docs/latest"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/generated/v2"))
        .mount(&server)
        .await;
    mount_page(&server, "/generated/v2", "<p>rendered client side</p>").await;

    let mut config = create_test_config();
    config.policy.hash_not_found_warn_only_patterns = vec!["/generated/".to_string()];

    let report = run_audit(&format!("{}/", base), config)
        .await
        .expect("audit failed");

    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].url, format!("{}/generated/v2#install", base));
    assert_eq!(report.exit_code, 0);
}

#[tokio::test]
async fn test_robots_disallowed_urls_are_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
        .mount(&server)
        .await;
    mount_page(&server, "/", r##"<a href="/admin#panel">admin</a>"##).await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert!(report.errors.is_empty());
    assert_eq!(report.disallowed, vec![format!("{}/admin", base)]);
}

#[tokio::test]
async fn test_excluded_urls_are_ignored() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r##"<a href="/private/a#x">private</a><a href="/public">public</a>"##,
    )
    .await;
    mount_page(&server, "/public", "<p>public</p>").await;
    Mock::given(method("GET"))
        .and(path("/private/a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.policy.exclude_patterns = vec!["/private/".to_string()];

    let report = run_audit(&format!("{}/", base), config)
        .await
        .expect("audit failed");

    assert!(report.errors.is_empty());
    assert_eq!(report.ignored, vec![format!("{}/private/a", base)]);
    assert_eq!(report.success_count, 2);
}

#[tokio::test]
async fn test_title_mismatch() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/docs">docs</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/docs",
        "<html><head><title>Docs | Acme</title></head></html>",
    )
    .await;

    let mut config = create_test_config();
    config.policy.title_pattern = Some("^Docs".to_string());

    let report = run_audit(&format!("{}/", base), config)
        .await
        .expect("audit failed");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].url, format!("{}/", base));
    assert_eq!(report.errors[0].msg, "pattern: ^Docs failed on title: Home");
}

#[tokio::test]
async fn test_additional_paths_are_crawled() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", "<p>no links</p>").await;
    Mock::given(method("GET"))
        .and(path("/hidden/"))
        .respond_with(html(r##"<a href="#nothing">x</a>"##))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.additional_paths = vec!["/hidden/".to_string()];

    let report = run_audit(&format!("{}/", base), config)
        .await
        .expect("audit failed");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].url, format!("{}/hidden/#nothing", base));
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r##"<a href="/a">a</a><a href="/a#one">a1</a><a href="/b">b</a>"##,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">home</a><a href="/b">b</a><i id="one"></i>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(r#"<a href="/a">a</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_audit(&format!("{}/", base), create_test_config())
        .await
        .expect("audit failed");

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.success_count, 3);
}

#[tokio::test]
async fn test_reports_written_from_config_file() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r##"<a href="/page#missing">broken</a>"##).await;
    mount_page(&server, "/page", "<p>page</p>").await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[crawler]
interval-ms = 0
max-concurrency = 2

[report]
include-successes = true
"#,
    )
    .unwrap();
    file.flush().unwrap();
    let config = load_config(file.path()).expect("config should load");

    let coordinator = Coordinator::new(&format!("{}/", base), config).unwrap();
    let report = coordinator.run().await.expect("audit failed");

    let dir = TempDir::new().unwrap();
    let json = JsonReportWriter::new(dir.path().join("report.json"));
    let markdown = MarkdownReportWriter::new(dir.path().join("report.md"));
    json.write_report(&report).unwrap();
    markdown.write_report(&report).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json.path()).unwrap()).unwrap();
    assert_eq!(value["exitCode"], 1);
    assert_eq!(value["errors"][0]["msg"], "Hash not found");
    assert_eq!(value["successes"].as_array().unwrap().len(), 2);

    let md = std::fs::read_to_string(markdown.path()).unwrap();
    assert!(md.contains("## Errors (1)"));
}
