#![allow(clippy::unwrap_used)]
// Integration tests for `RouterClient` using wiremock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use miwifi_api::transport::DEFAULT_TIMEOUT;
use miwifi_api::{Credentials, Endpoint, Error, Identity, RouterClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RouterClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RouterClient::with_client(
        reqwest::Client::new(),
        base_url,
        Credentials::admin("test-password"),
        DEFAULT_TIMEOUT,
    );
    (server, client)
}

const LOGIN: &str = "/cgi-bin/luci/api/xqsystem/login";

fn stok_path(token: &str, endpoint: Endpoint) -> String {
    format!("/cgi-bin/luci/;stok={token}/api/{}", endpoint.path())
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(server)
        .await;
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_sends_form_and_stores_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("logtype=2"))
        .and(body_string_contains("password=test-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "test_token" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(stok_path("test_token", Endpoint::WanStatistics)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "statistics": { "downspeed": "2048", "upspeed": "1024" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    assert!(client.is_authenticated());

    let stats = client.wan_statistics().await.unwrap();
    assert_eq!(stats["statistics"]["downspeed"], "2048");
}

#[tokio::test]
async fn test_login_missing_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 401, "msg": "not auth" })),
        )
        .mount(&server)
        .await;

    let result = client.login().await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("not auth"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.is_authenticated());
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_login_empty_token_is_rejected() {
    let (server, client) = setup().await;
    mount_login(&server, "").await;

    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_http_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let result = client.login().await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("500"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_failed_relogin_clears_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "first" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "msg": "locked" })))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    assert!(client.is_authenticated());

    assert!(client.login().await.is_err());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_transport_failure() {
    // Nothing listens on port 1.
    let client = RouterClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:1").unwrap(),
        Credentials::admin("pw"),
        DEFAULT_TIMEOUT,
    );

    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Transport(_))),
        "expected Transport error, got: {result:?}"
    );
    assert!(!client.is_authenticated());
}

// ── Identity tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_identity_derived_after_login() {
    let (server, client) = setup().await;
    mount_login(&server, "test_token").await;

    Mock::given(method("GET"))
        .and(path(stok_path("test_token", Endpoint::NewStatus)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hardware": { "mac": "00:11:22:33:44:55", "platform": "CB0401V2" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(stok_path("test_token", Endpoint::InitInfo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "romversion": "1.0.89"
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.identity(), Identity::default());
    client.login().await.unwrap();

    let identity = client.identity();
    assert_eq!(identity.mac_address.as_deref(), Some("00:11:22:33:44:55"));
    assert_eq!(identity.firmware_version.as_deref(), Some("1.0.89"));

    // A second login keeps the snapshot and does not re-derive it.
    client.login().await.unwrap();
    assert_eq!(client.identity(), identity);
}

#[tokio::test]
async fn test_identity_is_best_effort() {
    let (server, client) = setup().await;
    mount_login(&server, "test_token").await;

    Mock::given(method("GET"))
        .and(path(stok_path("test_token", Endpoint::NewStatus)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(stok_path("test_token", Endpoint::InitInfo)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    client.login().await.unwrap();

    assert!(client.is_authenticated());
    assert_eq!(client.identity(), Identity::default());
}

// ── Authenticated GET tests ─────────────────────────────────────────

#[tokio::test]
async fn test_get_without_login_fails_fast() {
    let (server, client) = setup().await;

    let result = client.fetch(Endpoint::CpeDetect).await;

    assert!(
        matches!(result, Err(Error::NotAuthenticated)),
        "expected NotAuthenticated, got: {result:?}"
    );
    assert!(client.cpe_detect().await.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_json_served_as_html_is_parsed() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path(stok_path("tok", Endpoint::CpeDetect)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"net":{"info":{"cell_band":"B3"}}}"#, "text/html"),
        )
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let detect = client.cpe_detect().await.unwrap();

    assert_eq!(detect["net"]["info"]["cell_band"], "B3");
}

#[tokio::test]
async fn test_non_json_body_is_a_failure() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path(stok_path("tok", Endpoint::SimInfo)))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>busy</html>", "text/html"))
        .mount(&server)
        .await;

    client.login().await.unwrap();

    let result = client.fetch(Endpoint::SimInfo).await;
    match result {
        Err(Error::Deserialization { ref body, .. }) => assert_eq!(body, "<html>busy</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
    assert!(client.sim_info().await.is_none());
}

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path(stok_path("tok", Endpoint::DeviceList)))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let result = client.fetch(Endpoint::DeviceList).await;

    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::Http { status: 502, .. }),
        "expected HTTP 502 error, got: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_session_expired_status() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path(stok_path("tok", Endpoint::WifiStatus)))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let result = client.fetch(Endpoint::WifiStatus).await;

    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_session_expired_body_code() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path(stok_path("tok", Endpoint::WifiDetail)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 401, "msg": "Invalid token" })),
        )
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let result = client.fetch(Endpoint::WifiDetail).await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::SessionExpired), "got: {err:?}");
    assert!(err.is_auth_expired());
}

// ── Timeout tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_timeout_bounds_requests_on_a_shared_client() {
    let server = MockServer::start().await;
    // The shared client carries no timeout of its own.
    let client = RouterClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Credentials::admin("pw"),
        Duration::from_secs(1),
    );
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path(stok_path("tok", Endpoint::WanStatistics)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 0, "statistics": {} }))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let started = Instant::now();
    let result = client.fetch(Endpoint::WanStatistics).await;

    assert!(
        matches!(result, Err(Error::Timeout { timeout_secs: 1 })),
        "expected Timeout after 1s, got: {result:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(result.unwrap_err().is_transient());
}

// ── Re-login coalescing tests ───────────────────────────────────────

#[tokio::test]
async fn test_concurrent_relogins_share_one_login() {
    let (server, client) = setup().await;
    let client = Arc::new(client);

    // The initial login plus exactly one renewal.
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok" })))
        .expect(2)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let generation = client.login_generation();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.relogin(generation).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(client.is_authenticated());
    assert_eq!(client.login_generation(), generation + 1);
}

#[tokio::test]
async fn test_shared_failed_relogin_is_not_retried() {
    let (server, client) = setup().await;
    let client = Arc::new(client);

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok" })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "msg": "locked" })))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let generation = client.login_generation();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.relogin(generation).await })
        })
        .collect();
    let mut rejected = 0;
    let mut shared = 0;
    for task in tasks {
        match task.await.unwrap() {
            Err(Error::Authentication { .. }) => rejected += 1,
            Err(Error::NotAuthenticated) => shared += 1,
            other => panic!("unexpected relogin result: {other:?}"),
        }
    }

    assert_eq!((rejected, shared), (1, 3));
    assert!(!client.is_authenticated());
}
