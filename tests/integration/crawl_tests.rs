//! End-to-end harvests over real HTTP
//!
//! These tests use wiremock to stand in for target sites (and for the
//! forward proxy) and check the output file produced by a full run.

use crate::support::{read_items, LogCapture};
use page_harvest::config::Config;
use page_harvest::crawler::{harvest, harvest_urls, Coordinator, HttpConnector, RetryPolicy};
use page_harvest::output::{JsonArraySink, ENVELOPE_CLOSE, ENVELOPE_OPEN};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn direct_connector() -> HttpConnector {
    HttpConnector::new(None, Some(Duration::from_secs(10)))
}

#[tokio::test]
async fn test_mixed_results_across_two_chunks() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/three"))
        .respond_with(ResponseTemplate::new(200).set_body_string("bye"))
        .mount(&mock_server)
        .await;

    let urls = vec![
        format!("{}/one", base_url),
        format!("{}/two", base_url),
        format!("{}/three", base_url),
    ];

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");

    let stats = harvest_urls(direct_connector(), &urls, &output, 2)
        .await
        .expect("Harvest failed");

    assert_eq!(stats.total_urls, 3);
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.records_written, 2);
    assert_eq!(stats.failures, 1);

    let items = read_items(&output);
    assert_eq!(items.len(), 2);

    // /three is in the second chunk, so it lands after everything from the first
    assert_eq!(items[0]["url"], urls[0].as_str());
    assert_eq!(items[0]["status"], 200);
    assert_eq!(items[0]["html"], "hi");
    assert_eq!(items[1]["url"], urls[2].as_str());
    assert_eq!(items[1]["html"], "bye");

    assert_eq!(logs.error_lines_mentioning("/two"), 1);
    assert_eq!(logs.error_lines_mentioning("/one"), 0);
    assert_eq!(logs.error_lines_mentioning("/three"), 0);
}

#[tokio::test]
async fn test_empty_url_list_writes_envelope_only() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");

    let stats = harvest_urls(direct_connector(), &[], &output, 25)
        .await
        .expect("Harvest failed");

    assert_eq!(stats.chunks, 0);
    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, format!("{}{}", ENVELOPE_OPEN, ENVELOPE_CLOSE));
    assert!(read_items(&output).is_empty());
}

#[tokio::test]
async fn test_html_is_written_verbatim() {
    let mock_server = MockServer::start().await;
    let body = "<html>\n<head><title>Caf\u{e9} \"quotes\" & \\slashes</title></head>\n\t<body>\u{1F600}</body></html>";

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let urls = vec![format!("{}/page", mock_server.uri())];

    harvest_urls(direct_connector(), &urls, &output, 25)
        .await
        .expect("Harvest failed");

    let items = read_items(&output);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["html"].as_str().unwrap(), body);
}

#[tokio::test]
async fn test_every_failure_kind_is_isolated() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let refused_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let urls = vec![
        format!("{}/missing", base_url),
        format!("{}/ok", base_url),
        format!("http://127.0.0.1:{}/refused", refused_port),
        format!("{}/forbidden", base_url),
        "not a url at all".to_string(),
    ];

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");

    let stats = harvest_urls(direct_connector(), &urls, &output, 25)
        .await
        .expect("Per-URL failures must not abort the run");

    assert_eq!(stats.records_written, 1);
    assert_eq!(stats.failures, 4);

    let items = read_items(&output);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["url"], urls[1].as_str());

    assert_eq!(logs.error_lines_mentioning("/missing"), 1);
    assert_eq!(logs.error_lines_mentioning("/refused"), 1);
    assert_eq!(logs.error_lines_mentioning("/forbidden"), 1);
    assert_eq!(logs.error_lines_mentioning("not a url at all"), 1);
}

#[tokio::test]
async fn test_requests_go_through_proxy_with_credentials() {
    let proxy = MockServer::start().await;

    // reqwest sends the embedded credentials as basic proxy auth ("user:pass")
    Mock::given(method("GET"))
        .and(header("proxy-authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("via proxy"))
        .mount(&proxy)
        .await;

    let address = proxy.address();
    let proxy_url = format!("http://user:pass@{}:{}", address.ip(), address.port());
    let connector = HttpConnector::new(Some(proxy_url), Some(Duration::from_secs(10)));

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");

    // Unresolvable host: only reachable through the proxy
    let urls = vec!["http://upstream.invalid/page".to_string()];
    let stats = harvest_urls(connector, &urls, &output, 25)
        .await
        .expect("Harvest failed");

    assert_eq!(stats.records_written, 1);
    let items = read_items(&output);
    assert_eq!(items[0]["url"], "http://upstream.invalid/page");
    assert_eq!(items[0]["html"], "via proxy");

    let received = proxy.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn test_unreachable_proxy_is_a_per_url_failure() {
    let refused_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let connector = HttpConnector::new(
        Some(format!("http://127.0.0.1:{}", refused_port)),
        Some(Duration::from_secs(5)),
    );

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let urls = vec![
        "http://a.example/".to_string(),
        "http://b.example/".to_string(),
    ];

    let stats = harvest_urls(connector, &urls, &output, 25)
        .await
        .expect("Proxy failures must not abort the run");

    assert_eq!(stats.records_written, 0);
    assert_eq!(stats.failures, 2);
    assert!(read_items(&output).is_empty());
}

#[tokio::test]
async fn test_retry_policy_recovers_flaky_page() {
    let mock_server = MockServer::start().await;

    // First request fails, the next ones succeed
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let sink = JsonArraySink::new(dir.path().join("out.json"), false);
    let urls = vec![format!("{}/flaky", mock_server.uri())];

    let stats = Coordinator::new(direct_connector(), sink, 25)
        .with_retry(RetryPolicy {
            max_retries: 1,
            delay: Duration::from_millis(10),
        })
        .run(&urls)
        .await
        .expect("Harvest failed");

    assert_eq!(stats.records_written, 1);
    let items = read_items(&dir.path().join("out.json"));
    assert_eq!(items[0]["html"], "recovered");
}

#[tokio::test]
async fn test_harvest_from_config() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>page</p>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("urls.txt");
    let output = dir.path().join("content.json");

    std::fs::write(
        &input,
        format!(
            "  {base}/a  \n\n{base}/b\n{base}/c\n",
            base = mock_server.uri()
        ),
    )
    .unwrap();

    let mut config = Config::default();
    config.crawler.chunk_size = 2;
    config.crawler.request_timeout_secs = Some(10);
    config.input.urls_path = input.display().to_string();
    config.output.path = output.display().to_string();
    config.output.trailing_comma = true;

    let stats = harvest(&config).await.expect("Harvest failed");

    assert_eq!(stats.total_urls, 3);
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.records_written, 3);

    // Compatibility layout: every record ends with ",\n", including the last
    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with(ENVELOPE_OPEN));
    assert!(content.ends_with(",\n]\n}"));
    assert_eq!(content.matches("\"html\": \"<p>page</p>\"").count(), 3);
}

#[tokio::test]
async fn test_success_status_logged_before_body_decoding() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let mock_server = MockServer::start().await;

    // Claims gzip but the body is plain text, so decoding fails after a 200
    Mock::given(method("GET"))
        .and(path("/corrupt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_string("definitely not gzip"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let urls = vec![format!("{}/corrupt", mock_server.uri())];

    let stats = harvest_urls(direct_connector(), &urls, &output, 25)
        .await
        .expect("Decoding failures must not abort the run");

    assert_eq!(stats.records_written, 0);
    assert_eq!(stats.failures, 1);
    assert!(read_items(&output).is_empty());

    let success_lines = logs
        .lines()
        .iter()
        .filter(|line| line.contains(" INFO ") && line.contains("Got response [200]"))
        .filter(|line| line.contains("/corrupt"))
        .count();
    assert_eq!(success_lines, 1);
    assert_eq!(logs.error_lines_mentioning("/corrupt"), 1);
    assert_eq!(logs.error_lines_mentioning("Unexpected error while fetching"), 1);
}
