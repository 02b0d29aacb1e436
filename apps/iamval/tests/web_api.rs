use iamval::analyzer::fake::{StaticAnalyzer, StaticConnector};
use iamval::analyzer::{ActiveAnalyzer, AnalyzerError, ConnectionSettings};
use iamval::models::{Finding, FindingKind, PolicyType};
use iamval::server::{build_router, AppState};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn spawn_app(analyzer: StaticAnalyzer) -> (SocketAddr, Arc<StaticConnector>) {
    let connector = Arc::new(StaticConnector::new(analyzer));
    let active = ActiveAnalyzer::connect(connector.clone(), ConnectionSettings::default()).await;
    let app = build_router(AppState::new(Arc::new(active)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, connector)
}

/// Minimal HTTP/1.1 exchange; returns (status, body).
async fn request(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let payload = body.unwrap_or("");
    let req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{payload}",
        payload.len()
    );
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).to_string();
    let (head, rest) = text.split_once("\r\n\r\n").unwrap();
    let status: u16 = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    let body = if head.to_ascii_lowercase().contains("transfer-encoding: chunked") {
        dechunk(rest)
    } else {
        rest.to_string()
    };
    (status, body)
}

fn dechunk(mut s: &str) -> String {
    let mut out = String::new();
    while let Some((size, rest)) = s.split_once("\r\n") {
        let n = usize::from_str_radix(size.trim(), 16).unwrap_or(0);
        if n == 0 {
            break;
        }
        out.push_str(&rest[..n]);
        s = &rest[n + 2..];
    }
    out
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

fn warning() -> Finding {
    Finding {
        kind: Some(FindingKind::SecurityWarning),
        code: Some("PASS_ROLE_WITH_STAR_IN_ACTION_AND_RESOURCE".into()),
        detail: Some("Using iam:PassRole with wildcards is overly permissive.".into()),
        reference: Some("https://docs.aws.amazon.com/IAM/latest/UserGuide/access-analyzer-reference-policy-checks.html".into()),
    }
}

#[tokio::test]
async fn malformed_policy_is_rejected_without_remote_call() {
    let (addr, connector) = spawn_app(StaticAnalyzer::with_findings(vec![warning()])).await;
    let (status, body) = request(
        addr,
        "POST",
        "/api/validate",
        Some(r#"{"policy":"{ invalid","type":"IDENTITY_POLICY"}"#),
    )
    .await;
    assert_eq!(status, 400);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Invalid JSON format: "));
    assert!(connector.analyzer().calls().is_empty());
}

#[tokio::test]
async fn missing_policy_is_a_bad_request() {
    let (addr, _) = spawn_app(StaticAnalyzer::with_findings(vec![])).await;
    let (status, body) = request(addr, "POST", "/api/validate", Some(r#"{"policy":"  "}"#)).await;
    assert_eq!(status, 400);
    assert_eq!(json(&body)["error"], "Policy document is required");
}

#[tokio::test]
async fn validate_returns_findings_and_html() {
    let (addr, connector) = spawn_app(StaticAnalyzer::with_findings(vec![warning()])).await;
    let policy = r#"{\"Version\":\"2012-10-17\",\"Statement\":[{\"Effect\":\"Allow\",\"Action\":\"*\",\"Resource\":\"*\"}]}"#;
    let body = format!(r#"{{"policy":"{}","type":"RESOURCE_POLICY"}}"#, policy);
    let (status, resp) = request(addr, "POST", "/api/validate", Some(&body)).await;
    assert_eq!(status, 200);
    let v = json(&resp);
    assert_eq!(v["findings"][0]["issueCode"], "PASS_ROLE_WITH_STAR_IN_ACTION_AND_RESOURCE");
    assert_eq!(v["findings"][0]["findingType"], "SECURITY_WARNING");
    let html = v["html"].as_str().unwrap();
    assert!(html.contains("data-testid=\"finding-1\""));
    assert!(html.contains("PASS_ROLE_WITH_STAR_IN_ACTION_AND_RESOURCE"));

    let calls = connector.analyzer().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].policy_type, PolicyType::ResourcePolicy);
}

#[tokio::test]
async fn remote_failure_is_reported_in_body() {
    let (addr, _) = spawn_app(StaticAnalyzer::failing(AnalyzerError::AccessDenied(
        "User is not authorized".into(),
    )))
    .await;
    let (status, resp) = request(
        addr,
        "POST",
        "/api/validate",
        Some(r#"{"policy":"{\"Version\":\"2012-10-17\"}"}"#),
    )
    .await;
    assert_eq!(status, 200);
    assert!(json(&resp)["error"]
        .as_str()
        .unwrap()
        .contains("access-analyzer:ValidatePolicy"));
}

#[tokio::test]
async fn set_profile_reconnects_and_reports_identity() {
    let (addr, connector) = spawn_app(StaticAnalyzer::with_findings(vec![])).await;
    let (status, resp) =
        request(addr, "POST", "/api/set-profile", Some(r#"{"profile":"spoke"}"#)).await;
    assert_eq!(status, 200);
    let v = json(&resp);
    assert_eq!(v["success"], true);
    assert_eq!(v["identity"], "arn:aws:iam::123456789012:user/tester");
    assert_eq!(
        connector.connected_profiles(),
        vec![None, Some("spoke".to_string())]
    );
}

#[tokio::test]
async fn page_examples_and_health() {
    let (addr, _) = spawn_app(StaticAnalyzer::with_findings(vec![])).await;

    let (status, body) = request(addr, "GET", "/healthz", None).await;
    assert_eq!((status, body.as_str()), (200, "ok"));

    let (status, body) = request(addr, "GET", "/api/examples", None).await;
    assert_eq!(status, 200);
    let v = json(&body);
    assert_eq!(v["overpermissive"]["Statement"][0]["Action"], "*");
    assert!(v.get("resource_policy").is_some());

    let (status, body) = request(addr, "GET", "/", None).await;
    assert_eq!(status, 200);
    assert!(body.contains("arn:aws:iam::123456789012:user/tester"));
    assert!(body.contains("data-testid=\"validate-button\""));
}
