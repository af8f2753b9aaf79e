use assert_cmd::Command;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("regulaai").unwrap();
    cmd.env_remove("REGULAAI_API_URL")
        .env_remove("REGULAAI_TIMEOUT_MS")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_dir.path().join("config.json"));
    cmd
}

fn scan_body() -> serde_json::Value {
    json!({
        "url": "https://example.com",
        "cookies": [],
        "cookie_banner_detected": true,
        "cookie_banner_selectors": ["#cookie-banner"],
        "scan_time_ms": 900,
        "score": 85,
        "violations": [{"title": "Pre-ticked consent", "description": "Marketing box pre-ticked", "severity": "medium"}]
    })
}

#[test]
fn auth_writes_config() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["auth", "--api-key", "rk_live_abcdefghijkl", "--url", "http://localhost:8000"])
        .assert()
        .success()
        .stdout(contains("rk_live_...ijkl"));

    let raw = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["api_key"], "rk_live_abcdefghijkl");
    assert_eq!(stored["base_url"], "http://localhost:8000");
}

#[test]
fn status_reports_defaults_when_unconfigured() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Base URL: https://api.regulaai.com"))
        .stdout(contains("Timeout: 30000ms"))
        .stdout(contains("Auth method: apiKey"))
        .stdout(contains("Authenticated: false"));
}

#[test]
fn scan_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["scan", "https://example.com"])
        .assert()
        .failure()
        .stderr(contains("No API key configured"));
}

#[test]
fn empty_api_key_does_not_authenticate() {
    let dir = TempDir::new().unwrap();
    cmd(&dir).args(["auth", "--api-key", ""]).assert().success();

    cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Authenticated: false"));
    cmd(&dir)
        .args(["scan", "https://example.com"])
        .assert()
        .failure()
        .stderr(contains("No API key configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn scan_prints_json_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scan"))
        .and(header("x-api-key", "rk_live_abcdefghijkl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scan_body()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["auth", "--api-key", "rk_live_abcdefghijkl", "--url", &mock_server.uri()])
        .assert()
        .success();

    cmd(&dir)
        .args(["scan", "https://example.com", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"score\": 85.0"))
        .stdout(contains("Pre-ticked consent"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_key_prints_hint() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid API key"})))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["auth", "--api-key", "revoked-key-0000"])
        .assert()
        .success();

    cmd(&dir)
        .args(["--base-url", &mock_server.uri(), "scan", "https://example.com"])
        .assert()
        .failure()
        .stderr(contains("Authentication failed"))
        .stderr(contains("regulaai auth"));
}

#[tokio::test(flavor = "multi_thread")]
async fn badge_prints_raw_markup() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/badge/test-site"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<svg><!-- badge --></svg>", "image/svg+xml"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["--base-url", &mock_server.uri(), "badge", "test-site"])
        .assert()
        .success()
        .stdout(contains("<svg><!-- badge --></svg>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_reports_failed_items_on_stderr() {
    let mock_server = MockServer::start().await;
    let body = format!(
        "{}\n{}\n",
        scan_body(),
        json!({"url": "https://down.example", "error": "net::ERR_CONNECTION_REFUSED"})
    );
    Mock::given(method("POST"))
        .and(path("/batch_scan"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["auth", "--api-key", "rk_live_abcdefghijkl", "--url", &mock_server.uri()])
        .assert()
        .success();

    cmd(&dir)
        .args(["batch", "https://example.com", "https://down.example"])
        .assert()
        .success()
        .stdout(contains("Score:      85/100"))
        .stderr(contains("failed: https://down.example (net::ERR_CONNECTION_REFUSED)"));
}
