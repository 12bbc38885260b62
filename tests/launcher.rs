//! End-to-end tests for the three launch modes.

use std::time::Duration;

use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use service_bootstrap::launcher::{LaunchError, Launcher, Listening};
use service_bootstrap::transport::{ClientError, TcpClient};
use service_bootstrap::validation::{RpcException, Valid};
use service_bootstrap::{MessageRouter, ServiceDescriptor};

mod common;
use common::Level;

#[derive(Debug, Deserialize, Serialize, Validate)]
struct Echo {
    #[validate(length(min = 1, max = 32))]
    text: String,
}

async fn echo(Valid(payload): Valid<Echo>) -> Json<Echo> {
    Json(payload)
}

fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new()
        .routes(Router::new().route("/echo", post(echo)))
        .messages(MessageRouter::new().on("echo", |payload: Echo| async move {
            Ok::<_, RpcException>(payload.text)
        }))
}

#[tokio::test]
async fn test_application_serves_routes_and_document() {
    let logger = common::MemoryLogger::new();
    let config = common::app_config("EchoService");

    let instance = Launcher::run_application(descriptor(), &config, common::shared(&logger))
        .await
        .expect("application should start");
    assert!(instance.is_listening());
    assert_eq!(logger.lines(Level::Log), vec!["EchoService app started."]);
    assert!(logger.lines(Level::Error).is_empty());

    let addr = instance.http_addr().unwrap();
    let client = common::http_client();

    let doc: Value = client
        .get(format!("http://{}/api", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["info"]["title"], "EchoService");
    assert_eq!(doc["info"]["version"], "1.0");
    assert_eq!(doc["servers"][0]["url"], "/api");
    assert_eq!(doc["components"]["securitySchemes"]["header"]["scheme"], "bearer");

    let alias = client.get(format!("http://{}/api-json", addr)).send().await.unwrap();
    assert_eq!(alias.status(), 200);

    let res = client
        .post(format!("http://{}/api/echo", addr))
        .header("origin", "http://example.com")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "text": "hello" }));

    instance.shutdown().await;
}

#[tokio::test]
async fn test_application_rejects_undeclared_and_missing_fields() {
    let config = common::app_config("EchoService");
    let instance = Launcher::run_application(descriptor(), &config, None).await.unwrap();
    let url = format!("http://{}/api/echo", instance.http_addr().unwrap());
    let client = common::http_client();

    let res = client
        .post(&url)
        .json(&json!({ "text": "hi", "admin": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"][0]["property"], "admin");
    assert!(body["message"][0]["constraints"]["whitelistValidation"].is_string());

    let res = client
        .post(&url)
        .json(&json!({ "text": "a-secret-that-is-far-too-long-for-the-limit" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let text = res.text().await.unwrap();
    assert!(!text.contains("a-secret"), "rejected value leaked: {text}");

    let res = client.post(&url).json(&json!({})).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body["message"][0]["constraints"]["isDefined"].is_string());

    instance.shutdown().await;
}

#[tokio::test]
async fn test_application_invalid_config_reports_error() {
    let logger = common::MemoryLogger::new();
    let mut config = common::app_config("EchoService");
    config.prefix = "api".into();

    let instance = Launcher::run_application(descriptor(), &config, common::shared(&logger)).await;
    assert!(instance.is_none());
    assert!(logger.lines(Level::Log).is_empty());

    let errors = logger.lines(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("prefix"), "unexpected error: {}", errors[0]);
}

#[tokio::test]
async fn test_service_round_trip_over_tcp() {
    let logger = common::MemoryLogger::new();
    let config = common::service_config("EchoService");

    let instance = Launcher::run_service(descriptor(), &config, common::shared(&logger))
        .await
        .expect("service should start");
    assert_eq!(logger.lines(Level::Log), vec!["EchoService service started."]);
    assert_eq!(logger.lines(Level::Warn).len(), 1);
    assert!(logger.lines(Level::Warn)[0].contains(&config.nats.url));
    assert!(matches!(instance.listeners(), [Listening::Tcp(_)]));

    let mut client = TcpClient::connect(instance.transport_addr().unwrap()).await.unwrap();
    assert_eq!(client.send("echo", json!({ "text": "ping" })).await.unwrap(), json!("ping"));

    match client.send("echo", json!({ "text": "" , "extra": 1 })).await {
        Err(ClientError::Remote(err)) => {
            let properties: Vec<_> = err["message"]
                .as_array()
                .unwrap()
                .iter()
                .map(|e| e["property"].as_str().unwrap().to_string())
                .collect();
            assert_eq!(properties, vec!["extra", "text"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    instance.shutdown().await;
}

#[tokio::test]
async fn test_service_bind_failure_is_logged() {
    let blocker = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = common::service_config("EchoService");
    config.tcp.port = blocker.local_addr().unwrap().port();
    let logger = common::MemoryLogger::new();

    let instance = Launcher::run_service(descriptor(), &config, common::shared(&logger)).await;
    assert!(instance.is_none());
    assert!(logger.lines(Level::Log).is_empty());
    assert!(logger.lines(Level::Error)[0].starts_with("Failed to bind"));
}

#[tokio::test]
async fn test_hybrid_broker_failure_stops_http() {
    let logger = common::MemoryLogger::new();
    let mut config = common::app_config("EchoService");
    config.service.nats.url = common::unreachable_nats_url().await;

    let result = Launcher::hybrid(descriptor(), &config, common::shared(&logger)).await;
    assert!(matches!(result, Err(LaunchError::Broker(_))));
    assert_eq!(logger.lines(Level::Log), vec!["EchoService app started."]);

    let logger = common::MemoryLogger::new();
    let instance = Launcher::run_hybrid(descriptor(), &config, common::shared(&logger)).await;
    assert!(instance.is_none());
    assert_eq!(logger.lines(Level::Error).len(), 1);
    assert!(logger.lines(Level::Error)[0].contains(&config.nats.url));
}

#[tokio::test]
async fn test_shutdown_stops_listening() {
    let config = common::app_config("EchoService");
    let instance = Launcher::application(descriptor(), &config, None).await.unwrap();
    let addr = instance.http_addr().unwrap();

    instance.shutdown().await;
    let refused = tokio::time::timeout(Duration::from_secs(2), tokio::net::TcpStream::connect(addr))
        .await
        .unwrap();
    assert!(refused.is_err());
}

#[tokio::test]
async fn test_modes_run_side_by_side() {
    let app = Launcher::application(descriptor(), &common::app_config("A"), None)
        .await
        .unwrap();
    let service = Launcher::service(descriptor(), &common::service_config("B"), None)
        .await
        .unwrap();

    assert_ne!(app.http_addr(), None);
    assert_ne!(service.transport_addr(), None);
    assert_eq!(app.service_name(), "A");

    app.shutdown().await;
    service.shutdown().await;
}

#[tokio::test]
async fn test_hybrid_serves_http_and_broker() {
    let mut broker = common::StubBroker::start().await;
    let logger = common::MemoryLogger::new();
    let mut config = common::app_config("EchoService");
    config.service.nats.url = broker.url.clone();

    let instance = Launcher::run_hybrid(descriptor(), &config, common::shared(&logger))
        .await
        .expect("hybrid should start");
    assert_eq!(
        logger.lines(Level::Log),
        vec!["EchoService app started.", "EchoService service started."]
    );
    assert_eq!(instance.broker_subjects(), Some(&["echo".to_string()][..]));
    assert!(matches!(instance.listeners(), [Listening::Http(_), Listening::Broker { .. }]));

    let sid = broker.subscription("echo").await;
    let envelope = json!({ "pattern": "echo", "data": { "text": "over nats" }, "id": "1" });
    broker.deliver("echo", &sid, "_INBOX.reply", &envelope.to_string());

    let reply: Value = serde_json::from_str(&broker.published("_INBOX.reply").await).unwrap();
    assert_eq!(reply["id"], "1");
    assert_eq!(reply["response"], "over nats");
    assert_eq!(reply["isDisposed"], true);

    let doc = common::http_client()
        .get(format!("http://{}/api", instance.http_addr().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(doc.status(), 200);

    instance.shutdown().await;
}

#[tokio::test]
async fn test_hybrid_without_message_handlers_is_refused() {
    let logger = common::MemoryLogger::new();
    let config = common::app_config("EchoService");
    let routes_only = ServiceDescriptor::new().routes(Router::new().route("/echo", post(echo)));

    let result = Launcher::hybrid(routes_only, &config, common::shared(&logger)).await;
    assert!(matches!(result, Err(LaunchError::NoMessageHandlers)));
    assert!(logger.lines(Level::Log).is_empty());
}
