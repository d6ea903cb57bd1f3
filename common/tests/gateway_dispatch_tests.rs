// HTTP tests for the messaging gateway and dispatcher

use common::config::GatewayConfig;
use common::dispatcher::Dispatcher;
use common::errors::SendError;
use common::gateway::{MessagingGateway, WhapiGateway};
use common::normalizer::normalize;
use proptest::prelude::*;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer) -> WhapiGateway {
    let config = GatewayConfig {
        url: format!("{}/messages/text", server.uri()),
        api_key: "test-token".to_string(),
        timeout_seconds: Some(5),
    };
    WhapiGateway::new(&config).unwrap()
}

#[tokio::test]
async fn test_send_posts_json_with_bearer_token() {
    let server = MockServer::start().await;
    let candidates = normalize("11987654321").unwrap();

    Mock::given(method("POST"))
        .and(path("/messages/text"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(serde_json::json!({
            "to": "5511987654321",
            "body": "Olá"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.send(&candidates[0], "Olá").await.unwrap();

    server.verify().await;
}

#[tokio::test]
async fn test_ok_status_is_success() {
    let server = MockServer::start().await;
    let candidates = normalize("11987654321").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"sent": true})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(gateway_for(&server).send(&candidates[0], "hi").await.is_ok());
}

#[tokio::test]
async fn test_other_success_statuses_are_failures() {
    let server = MockServer::start().await;
    let candidates = normalize("11987654321").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let result = gateway_for(&server).send(&candidates[0], "hi").await;
    assert!(matches!(
        result,
        Err(SendError::SendFailed { status: 202, .. })
    ));
}

#[tokio::test]
async fn test_failure_body_is_kept_for_diagnostics() {
    let server = MockServer::start().await;
    let candidates = normalize("11987654321").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid recipient"))
        .mount(&server)
        .await;

    match gateway_for(&server).send(&candidates[0], "hi").await {
        Err(SendError::SendFailed { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body.as_deref(), Some("invalid recipient"));
        }
        other => panic!("expected SendFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    let config = GatewayConfig {
        url: "http://127.0.0.1:1/messages/text".to_string(),
        api_key: "test-token".to_string(),
        timeout_seconds: Some(5),
    };
    let gateway = WhapiGateway::new(&config).unwrap();
    let candidates = normalize("11987654321").unwrap();

    let result = gateway.send(&candidates[0], "hi").await;
    assert!(matches!(result, Err(SendError::Transport(_))));
}

/// Read one HTTP request (headers plus a Content-Length body) off the socket
async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            return request;
        }
        request.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&request);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + content_length {
                return request;
            }
        }
    }
}

#[tokio::test]
async fn test_chunked_rejection_keeps_no_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  Transfer-Encoding: chunked\r\n\
                  Connection: close\r\n\r\n\
                  5\r\nerror\r\n0\r\n\r\n",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let config = GatewayConfig {
        url: format!("http://{}/messages/text", addr),
        api_key: "test-token".to_string(),
        timeout_seconds: Some(5),
    };
    let gateway = WhapiGateway::new(&config).unwrap();
    let candidates = normalize("11987654321").unwrap();

    let result = gateway.send(&candidates[0], "hi").await;
    assert!(matches!(
        result,
        Err(SendError::SendFailed {
            status: 500,
            body: None
        })
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn test_first_failure_prevents_second_request() {
    let server = MockServer::start().await;
    let candidates = normalize("11987654321").unwrap();

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"to": "5511987654321"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"to": "559587654321"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(Arc::new(gateway_for(&server)));
    let result = dispatcher.dispatch(&candidates, "hi").await;

    assert!(matches!(
        result,
        Err(SendError::SendFailed { status: 500, .. })
    ));
    server.verify().await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dispatch_reaches_both_candidates_in_order() {
    let server = MockServer::start().await;
    let candidates = normalize("1198765432").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(Arc::new(gateway_for(&server)));
    dispatcher.dispatch(&candidates, "hi").await.unwrap();

    let recipients: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["to"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(recipients, vec!["551198765432", "5595998765432"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any non-200/201 status stops dispatch after exactly one request
    #[test]
    fn property_rejecting_status_stops_dispatch(status in prop_oneof![300u16..=599, Just(202u16), Just(204u16)]) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let candidates = normalize("11987654321").unwrap();
            let dispatcher = Dispatcher::new(Arc::new(gateway_for(&server)));
            let result = dispatcher.dispatch(&candidates, "hi").await;

            match result {
                Err(SendError::SendFailed { status: got, .. }) => prop_assert_eq!(got, status),
                other => prop_assert!(false, "expected SendFailed, got {:?}", other),
            }
            prop_assert_eq!(server.received_requests().await.unwrap().len(), 1);
            Ok(())
        })?;
    }
}
