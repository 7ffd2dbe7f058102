use httpmock::prelude::*;
use registry_stats_bot::{Aggregator, CredentialStore, HttpCountSource, RequestDescriptor};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn descriptor(server: &MockServer, category: &str, path: &str) -> RequestDescriptor {
    RequestDescriptor::new(
        category,
        server.url(path),
        json!({"searchKey": "", "registrationDate": [], "isApprove": true}),
    )
}

fn aggregator(credential: Arc<CredentialStore>, timeout: Duration) -> Aggregator {
    Aggregator::new(Arc::new(HttpCountSource::new(credential, timeout))).with_call_timeout(timeout)
}

fn pairs(report: &registry_stats_bot::Report) -> Vec<(String, u64)> {
    report
        .entries()
        .iter()
        .map(|e| (e.category.clone(), e.count))
        .collect()
}

/// A 回傳 5、B 回傳 0、C 回傳 401
#[tokio::test]
async fn test_end_to_end_mixed_outcomes() {
    let server = MockServer::start();

    let a_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/a")
            .header("authorization", "Bearer registry-token-123")
            .header("content-type", "application/json")
            .json_body(json!({"searchKey": "", "registrationDate": [], "isApprove": true}));
        then.status(200)
            .json_body(json!({"result": {"totalElements": 5, "content": []}}));
    });
    let b_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/b");
        then.status(200).json_body(json!({"result": {"totalElements": 0}}));
    });
    let c_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/c");
        then.status(401).json_body(json!({"error": "token expired"}));
    });

    let credential = Arc::new(CredentialStore::new("registry-token-123", None));
    let catalog = vec![
        descriptor(&server, "A", "/v1/a"),
        descriptor(&server, "B", "/v1/b"),
        descriptor(&server, "C", "/v1/c"),
    ];

    let report = aggregator(credential, Duration::from_secs(5)).run(&catalog).await;

    a_mock.assert();
    b_mock.assert();
    c_mock.assert();
    assert_eq!(
        pairs(&report),
        vec![("A".into(), 5), ("B".into(), 0), ("C".into(), 0)]
    );
    assert!(report.any_auth_failed());
}

#[tokio::test]
async fn test_transient_failures_are_zero_without_auth_flag() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/ok");
        then.status(200).json_body(json!({"result": {"totalElements": 12}}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/server-error");
        then.status(503).body("maintenance");
    });
    server.mock(|when, then| {
        when.method(POST).path("/malformed");
        then.status(200)
            .header("content-type", "application/json")
            .body("{not json");
    });
    server.mock(|when, then| {
        when.method(POST).path("/missing-field");
        then.status(200).json_body(json!({"result": {}}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/slow");
        then.status(200)
            .delay(Duration::from_secs(5))
            .json_body(json!({"result": {"totalElements": 99}}));
    });

    let catalog = vec![
        descriptor(&server, "ok", "/ok"),
        descriptor(&server, "server-error", "/server-error"),
        descriptor(&server, "malformed", "/malformed"),
        descriptor(&server, "missing-field", "/missing-field"),
        descriptor(&server, "slow", "/slow"),
        // 沒有人在聽的 port
        RequestDescriptor::new("unreachable", "http://127.0.0.1:9/v1", json!({})),
    ];

    let credential = Arc::new(CredentialStore::new("registry-token-123", None));
    let started = std::time::Instant::now();
    let report = aggregator(credential, Duration::from_millis(500)).run(&catalog).await;

    assert_eq!(
        pairs(&report),
        vec![
            ("ok".into(), 12),
            ("server-error".into(), 0),
            ("malformed".into(), 0),
            ("missing-field".into(), 0),
            ("slow".into(), 0),
            ("unreachable".into(), 0),
        ]
    );
    assert!(!report.any_auth_failed());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_empty_credential_omits_authorization_header() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/a").header_missing("authorization");
        then.status(200).json_body(json!({"result": {"totalElements": 3}}));
    });

    let credential = Arc::new(CredentialStore::new("", None));
    let report = aggregator(credential, Duration::from_secs(5))
        .run(&[descriptor(&server, "A", "/v1/a")])
        .await;

    mock.assert();
    assert_eq!(report.entries()[0].count, 3);
}

#[tokio::test]
async fn test_rotated_credential_is_used_by_next_run() {
    let server = MockServer::start();
    let old_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/a")
            .header("authorization", "Bearer expired-token-0001");
        then.status(401);
    });
    let new_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/a")
            .header("authorization", "Bearer rotated-token-0002");
        then.status(200).json_body(json!({"result": {"totalElements": 8}}));
    });

    let credential = Arc::new(CredentialStore::new("expired-token-0001", Some(42)));
    let aggregator = aggregator(Arc::clone(&credential), Duration::from_secs(5));
    let catalog = vec![descriptor(&server, "A", "/v1/a")];

    let first = aggregator.run(&catalog).await;
    assert!(first.any_auth_failed());
    assert_eq!(first.entries()[0].count, 0);

    credential.set(" rotated-token-0002\n", 42).unwrap();

    let second = aggregator.run(&catalog).await;
    assert!(!second.any_auth_failed());
    assert_eq!(second.entries()[0].count, 8);

    old_mock.assert_hits(1);
    new_mock.assert_hits(1);
}
