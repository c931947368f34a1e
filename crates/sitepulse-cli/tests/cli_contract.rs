//! Contract tests for the `sitepulse` binary: subcommands, output and exit
//! codes. The reporting API is a wiremock server and the audit tool a shell
//! script.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPORT_PATH: &str = "/properties/123:runReport";

fn sitepulse() -> Command {
    let mut cmd = Command::cargo_bin("sitepulse").unwrap();
    for var in [
        "SITEPULSE_CONFIG",
        "SITEPULSE_PROPERTY_ID",
        "SITEPULSE_CREDENTIALS",
        "SITEPULSE_ACCESS_TOKEN",
        "SITEPULSE_BIND",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "warn");
    cmd
}

struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Fake audit tool printing `body` and exiting with `code`.
    fn audit_tool(&self, body: &serde_json::Value, code: i32) -> String {
        let report = self.path("audit-output.json");
        std::fs::write(&report, body.to_string()).unwrap();
        let script = self.path("fake-lighthouse.sh");
        std::fs::write(
            &script,
            format!(
                "cat {}\necho 'chrome crashed' >&2\nexit {}\n",
                report.display(),
                code
            ),
        )
        .unwrap();
        format!("/bin/sh {}", script.display())
    }

    fn config(&self, property_id: &str, api_base_url: &str, lighthouse_bin: &str) -> PathBuf {
        let config = self.path("sitepulse.yaml");
        let yaml = format!(
            r#"site_name: Example Shop
property_id: "{property_id}"
audit_url: https://example.com/
audit_results_path: {results}
api_base_url: {api_base_url}
max_retries: 0
lighthouse_bin: {lighthouse_bin}
metrics:
  - key: totalUsers
    title: Total Users
    description: Unique users in the window.
  - key: sessions
    title: Sessions
    description: ""
"#,
            results = self.results_path().display(),
        );
        std::fs::write(&config, yaml).unwrap();
        config
    }

    fn results_path(&self) -> PathBuf {
        self.path("lighthouse_results.json")
    }
}

fn audit_document() -> serde_json::Value {
    json!({
        "requestedUrl": "https://example.com/",
        "fetchTime": "2026-10-17T08:00:00.000Z",
        "categories": {
            "performance": {"score": 0.7239, "auditRefs": [{"id": "speed-index"}]},
            "seo": {"score": 0.85, "auditRefs": [{"id": "document-title"}]}
        },
        "audits": {
            "speed-index": {"score": 0.61},
            "document-title": {"score": 1}
        }
    })
}

fn row(date: &str, users: &str, sessions: &str) -> serde_json::Value {
    json!({
        "dimensionValues": [{"value": date}],
        "metricValues": [{"value": users}, {"value": sessions}]
    })
}

async fn reporting_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .and(header("authorization", "Bearer cli-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [
                row("20261003", "90", "130"),
                row("20261001", "100", "150"),
                row("20261002", "120", "170")
            ]
        })))
        .mount(&server)
        .await;
    server
}

fn config_arg(config: &Path) -> [String; 2] {
    ["--config".to_string(), config.display().to_string()]
}

#[test]
fn test_help_lists_subcommands() {
    sitepulse()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("audit"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_version() {
    sitepulse()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_validate_prints_effective_metrics() {
    let site = Site::new();
    let config = site.config("123", "https://analytics.example", "lighthouse");

    sitepulse()
        .arg("validate")
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .assert()
        .success()
        .stdout(predicate::str::contains("site: Example Shop"))
        .stdout(predicate::str::contains("credentials: static token"))
        .stdout(predicate::str::contains("1. totalUsers (Total Users) [primary]"))
        .stdout(predicate::str::contains("2. sessions (Sessions)"))
        .stdout(predicate::str::contains("cli-token").not());
}

#[test]
fn test_validate_json_format() {
    let site = Site::new();
    let config = site.config("123", "https://analytics.example", "lighthouse");

    let output = sitepulse()
        .args(["validate", "--format", "json"])
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["property_id"], "123");
    assert_eq!(parsed["metrics"], json!(["totalUsers", "sessions"]));
}

#[test]
fn test_validate_rejects_missing_property() {
    let site = Site::new();
    let config = site.config("", "https://analytics.example", "lighthouse");

    sitepulse()
        .arg("validate")
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fatal: ConfigurationError"));
}

#[test]
fn test_property_override_fills_missing_property() {
    let site = Site::new();
    let config = site.config("", "https://analytics.example", "lighthouse");

    sitepulse()
        .args(["validate", "--property-id", "properties/987"])
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .assert()
        .success()
        .stdout(predicate::str::contains("property: properties/987"));
}

#[test]
fn test_validate_without_credentials() {
    let site = Site::new();
    let config = site.config("123", "https://analytics.example", "lighthouse");

    sitepulse()
        .arg("validate")
        .args(config_arg(&config))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no credentials configured"));
}

#[test]
fn test_missing_config_file() {
    let site = Site::new();
    sitepulse()
        .arg("validate")
        .args(config_arg(&site.path("absent.yaml")))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("absent.yaml"));
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_run_renders_page_and_persists_audit() {
    let server = reporting_server().await;
    let site = Site::new();
    let tool = site.audit_tool(&audit_document(), 0);
    let config = site.config("123", &server.uri(), &tool);
    let out = site.path("dashboard.html");

    sitepulse()
        .args(["run", "--no-serve", "--out"])
        .arg(&out)
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .assert()
        .success()
        .stdout(predicate::str::contains("totalUsers change: 20.00%"))
        .stdout(predicate::str::contains("sessions month-over-month: 0.00%"));

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("<h1>Example Shop</h1>"));
    assert!(html.contains("<h3>Total Users (change: 20.00%)</h3>"));
    assert!(html.contains("<h3>Sessions</h3>"));
    assert!(html.contains("<div class=\"value\">72.39</div>"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(site.results_path()).unwrap()).unwrap();
    assert_eq!(stored, audit_document());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_run_maps_rejected_credentials_to_upstream_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials."}
        })))
        .mount(&server)
        .await;

    let site = Site::new();
    let tool = site.audit_tool(&audit_document(), 0);
    let config = site.config("123", &server.uri(), &tool);

    sitepulse()
        .args(["run", "--no-serve"])
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "stale-token")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("fatal: UpstreamServiceError"));
    assert!(!site.results_path().exists());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_run_maps_audit_failure() {
    let server = reporting_server().await;
    let site = Site::new();
    let tool = site.audit_tool(&json!({}), 1);
    let config = site.config("123", &server.uri(), &tool);

    sitepulse()
        .args(["run", "--no-serve"])
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("chrome crashed"));
    assert!(!site.results_path().exists());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_skip_audit_without_persisted_report() {
    let server = reporting_server().await;
    let site = Site::new();
    let config = site.config("123", &server.uri(), "lighthouse");

    sitepulse()
        .args(["run", "--no-serve", "--skip-audit"])
        .args(config_arg(&config))
        .env("SITEPULSE_ACCESS_TOKEN", "cli-token")
        .assert()
        .code(6)
        .stderr(predicate::str::contains("fatal: AuditStoreError"));
}

#[cfg(unix)]
#[test]
fn test_audit_command_prints_gauges_and_saves() {
    let site = Site::new();
    let tool = site.audit_tool(&audit_document(), 0);
    // No property or credentials needed for an audit-only run.
    let config = site.config("", "https://analytics.example", &tool);

    sitepulse()
        .arg("audit")
        .args(config_arg(&config))
        .assert()
        .success()
        .stdout(predicate::str::contains("performance: 72.39"))
        .stdout(predicate::str::contains("seo: 85.00"));
    assert!(site.results_path().exists());
}
