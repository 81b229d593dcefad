use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use artac_client::{ClientConfig, CommunicationSession, HttpRemote, RemoteError, RemoteService, SessionMode};
use artac_shared::protocol::{CeoChatRequest, CeoChatResponse, SendMessageRequest};
use artac_shared::types::{ChannelId, UserId};

#[derive(Clone, Default)]
struct Backend {
    posts: Arc<Mutex<Vec<SendMessageRequest>>>,
}

async fn agents() -> Json<Value> {
    Json(json!([
        { "id": "ceo-agent", "name": "CEO Agent", "role": "CEO", "claude_session": "abc" },
        { "id": "qa-agent", "name": "QA Agent", "role": "QA" }
    ]))
}

async fn channels() -> Json<Value> {
    Json(json!([
        { "id": "general", "name": "general", "type": "public", "created_at": "2024-03-01T12:00:00Z" },
        { "id": "ceo-direct", "name": "CEO", "type": "direct", "created_at": "2024-03-01T12:00:00Z" }
    ]))
}

async fn list_messages(Path(channel_id): Path<String>) -> Json<Value> {
    if channel_id == "ops/night shift?" {
        return Json(json!([{
            "id": "srv-night",
            "channel_id": channel_id,
            "user_id": "qa-agent",
            "content": "Night shift handover",
            "timestamp": "2024-03-01T23:00:00Z"
        }]));
    }
    if channel_id != "general" {
        return Json(json!([]));
    }
    Json(json!([{
        "id": "srv-1",
        "channel_id": "general",
        "user_id": "qa-agent",
        "content": "Smoke tests passed",
        "timestamp": "2024-03-01T12:05:00Z"
    }]))
}

async fn create_message(
    State(backend): State<Backend>,
    Path(_channel_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> StatusCode {
    backend.posts.lock().unwrap().push(body);
    StatusCode::CREATED
}

async fn ceo_chat(Json(request): Json<CeoChatRequest>) -> Json<CeoChatResponse> {
    Json(CeoChatResponse {
        message: format!("Acknowledged: {}", request.message),
    })
}

fn backend_router(backend: Backend) -> Router {
    let api = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/agents", get(agents))
        .route("/channels", get(channels))
        .route("/channels/:id/messages", get(list_messages).post(create_message))
        .route("/ceo/chat", post(ceo_chat))
        .with_state(backend);
    Router::new().nest("/api", api)
}

/// Serve `router` on an ephemeral port and return the API base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn remote(base_url: &str) -> HttpRemote {
    HttpRemote::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_endpoints_decode() {
    let backend = Backend::default();
    let base = serve(backend_router(backend.clone())).await;
    let remote = remote(&base);

    remote.health().await.unwrap();

    let agents = remote.fetch_agents().await.unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0].claude_session.as_deref(), Some("abc"));
    assert_eq!(agents[1].claude_session, None);

    let channels = remote.fetch_channels().await.unwrap();
    assert_eq!(channels[1].kind.as_deref(), Some("direct"));

    let messages = remote.fetch_messages(&ChannelId::from("general")).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].mentions.is_empty());

    let body = SendMessageRequest {
        channel_id: "general".into(),
        content: "hello".into(),
        mentions: vec!["qa-agent".into()],
        reply_to: None,
    };
    remote
        .post_message(&ChannelId::from("general"), &body)
        .await
        .unwrap();
    assert_eq!(backend.posts.lock().unwrap()[0].mentions, vec!["qa-agent".to_string()]);

    let reply = remote
        .ceo_chat(&CeoChatRequest {
            message: "status".into(),
            user_id: "user-admin".into(),
        })
        .await
        .unwrap();
    assert_eq!(reply.message, "Acknowledged: status");
}

#[tokio::test]
async fn test_channel_id_with_reserved_characters() {
    let base = serve(backend_router(Backend::default())).await;
    let remote = remote(&base);

    let messages = remote
        .fetch_messages(&ChannelId::from("ops/night shift?"))
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].channel_id, "ops/night shift?");
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let router = Router::new().route(
        "/api/health",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let remote = remote(&serve(router).await);

    match remote.health().await {
        Err(RemoteError::Status { endpoint, status }) => {
            assert_eq!(endpoint, "/health");
            assert_eq!(status, 503);
        }
        other => panic!("expected status error, got {other:?}"),
    }

    assert!(matches!(
        remote.fetch_channels().await,
        Err(RemoteError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_session_over_http() {
    let backend = Backend::default();
    let base = serve(backend_router(backend.clone())).await;

    let config = ClientConfig {
        api_url: base.clone(),
        ceo_response_delay: Duration::from_millis(10),
        offline_response_delay: Duration::from_millis(10),
        ..ClientConfig::default()
    };
    let session = CommunicationSession::new(config, remote(&base), None);

    assert_eq!(session.initialize().await, SessionMode::Online);
    let state = session.snapshot();
    assert_eq!(state.messages(&ChannelId::from("general"))[0].content, "Smoke tests passed");

    let ceo = ChannelId::from("ceo-direct");
    session
        .send(&ceo, "Ready to launch?", Vec::new(), None)
        .unwrap()
        .settled()
        .await;

    let messages = session.messages(&ceo);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].user_id, UserId::from("ceo-agent"));
    assert_eq!(messages[1].content, "Acknowledged: Ready to launch?");
    assert_eq!(backend.posts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_offline_when_backend_refuses_connections() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = format!("http://{addr}/api");
    let session = CommunicationSession::new(ClientConfig::default(), remote(&base), None);

    assert_eq!(session.initialize().await, SessionMode::Offline);
    assert!(session.is_offline());
    assert_eq!(session.check_health().await, SessionMode::Offline);
}
