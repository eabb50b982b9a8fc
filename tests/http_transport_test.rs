use bytes::Bytes;
use rask_log_shipper::sender::http::{IP_TRACKING_HEADER, USER_AGENT_TRACKING_HEADER};
use rask_log_shipper::sender::{
    ClientConfig, HttpTransport, OutboundRequest, Transport, TransportError,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

fn transport(server: &MockServer, timeout: Duration) -> HttpTransport {
    HttpTransport::new(ClientConfig {
        root_url: format!("{}/v1/input", server.uri()),
        timeout,
        ..Default::default()
    })
    .unwrap()
}

fn request(api_key: &str, headers: BTreeMap<String, String>) -> OutboundRequest {
    let body = json!([
        {"timestamp": 1_700_000_000_000_i64, "message": "first"},
        {"timestamp": 1_700_000_000_001_i64, "message": "second", "level": "warn"}
    ]);
    OutboundRequest {
        api_key: api_key.to_string(),
        body: Bytes::from(serde_json::to_vec(&body).unwrap()),
        headers,
    }
}

#[tokio::test]
async fn test_batch_posted_to_api_key_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/input/my-api-key"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(body_json(json!([
            {"timestamp": 1_700_000_000_000_i64, "message": "first"},
            {"timestamp": 1_700_000_000_001_i64, "message": "second", "level": "warn"}
        ])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server, Duration::from_secs(5));
    let status = transport
        .send(request("my-api-key", BTreeMap::new()))
        .await
        .unwrap();

    assert_eq!(status, 200);
    let stats = transport.connection_stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.successful_requests, 1);
    assert_eq!(stats.failed_requests, 0);
}

#[tokio::test]
async fn test_tracking_headers_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/input/key"))
        .and(header("X-Logmatic-Add-IP", "client_ip"))
        .and(header("X-Logmatic-Add-UserAgent", "client_ua"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert(IP_TRACKING_HEADER.to_string(), "client_ip".to_string());
    headers.insert(USER_AGENT_TRACKING_HEADER.to_string(), "client_ua".to_string());

    let status = transport(&mock_server, Duration::from_secs(5))
        .send(request("key", headers))
        .await
        .unwrap();
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_server_error_status_returned_not_raised() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/input/key"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server, Duration::from_secs(5));
    let status = transport
        .send(request("key", BTreeMap::new()))
        .await
        .unwrap();

    assert_eq!(status, 503);
    let stats = transport.connection_stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.failed_requests, 1);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let result = transport(&mock_server, Duration::from_millis(200))
        .send(request("key", BTreeMap::new()))
        .await;

    assert!(matches!(result, Err(TransportError::Timeout)));
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    let transport = HttpTransport::new(ClientConfig {
        root_url: "http://127.0.0.1:1/v1/input".to_string(),
        timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap();

    let result = transport.send(request("key", BTreeMap::new())).await;

    assert!(matches!(result, Err(TransportError::RequestError(_))));
    assert_eq!(transport.connection_stats().failed_requests, 1);
}

#[tokio::test]
async fn test_invalid_header_fails_before_sending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("bad header".to_string(), "value".to_string());

    let result = transport(&mock_server, Duration::from_secs(5))
        .send(request("key", headers))
        .await;

    assert!(matches!(result, Err(TransportError::InvalidHeader(_))));
}
