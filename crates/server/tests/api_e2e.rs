//! REST API round trips through the router

use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use voice_console_config::{load_catalog, Settings};
use voice_console_core::agent::{default_agent, AgentRecord, UpdateAgentRequest};
use voice_console_core::resources::{AuthSession, Execution, Page};
use voice_console_core::{ApiResponse, CostBreakdown, ErrorKind};
use voice_console_editor::{AnalyticsPatch, SectionPatch};
use voice_console_server::{create_router, AppState};

fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/providers.yaml")
}

fn app_with(settings: Settings) -> Router {
    let catalog = load_catalog(catalog_path()).unwrap();
    create_router(AppState::new(settings, catalog))
}

fn app() -> Router {
    app_with(Settings::default())
}

async fn call<B: Serialize>(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<&B>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn data<T: DeserializeOwned>(value: Value) -> T {
    let envelope: ApiResponse<T> = serde_json::from_value(value).unwrap();
    assert!(envelope.success);
    envelope.data.unwrap()
}

fn error_code(value: &Value) -> ErrorKind {
    let envelope: ApiResponse<Value> = serde_json::from_value(value.clone()).unwrap();
    assert!(!envelope.success);
    envelope.error_body().unwrap().code
}

const NO_BODY: Option<&()> = None;

#[tokio::test]
async fn test_create_and_fetch_agent() {
    let app = app();
    let payload = default_agent("Front desk");

    let (status, body) = call(&app, Method::POST, "/agent", Some(&payload), None).await;
    assert_eq!(status, StatusCode::OK);
    let created: AgentRecord = data(body);
    assert_eq!(created.version, 1);

    let (status, body) = call(&app, Method::GET, &format!("/agent/{}", created.id), NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: AgentRecord = data(body);
    assert_eq!(fetched.name(), "Front desk");
    let conversation = fetched.agent_config.conversation_task().unwrap();
    assert_eq!(
        conversation.tools_config.transcriber.as_ref().map(|t| t.provider.as_str()),
        Some("deepgram")
    );
    assert_eq!(conversation.task_config.call_terminate, Some(300));

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/agent/{}/cost", created.id),
        NO_BODY,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cost: CostBreakdown = data(body);
    assert!((cost.platform - 0.02).abs() < 1e-9);
    assert!(cost.total > cost.platform);

    let (status, body) = call(&app, Method::GET, "/agent/all?search=front", NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let page: Page<AgentRecord> = data(body);
    assert_eq!(page.total, 1);

    let (status, body) = call(&app, Method::GET, &format!("/agent/{}", Uuid::new_v4()), NO_BODY, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_stale_update_is_rejected() {
    let app = app();
    let (_, body) = call(&app, Method::POST, "/agent", Some(&default_agent("Sales")), None).await;
    let created: AgentRecord = data(body);
    let uri = format!("/agent/{}", created.id);

    let mut first = created.payload();
    first.agent_config.agent_welcome_message = Some("Hi from sales".into());
    let request = UpdateAgentRequest {
        payload: first,
        version: Some(created.version),
    };
    let (status, body) = call(&app, Method::PUT, &uri, Some(&request), None).await;
    assert_eq!(status, StatusCode::OK);
    let updated: AgentRecord = data(body);
    assert_eq!(updated.version, created.version + 1);

    // A second editor still holding the original version.
    let request = UpdateAgentRequest {
        payload: created.payload(),
        version: Some(created.version),
    };
    let (status, body) = call(&app, Method::PUT, &uri, Some(&request), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), ErrorKind::Conflict);

    let (_, body) = call(&app, Method::GET, &uri, NO_BODY, None).await;
    let current: AgentRecord = data(body);
    assert_eq!(
        current.agent_config.agent_welcome_message.as_deref(),
        Some("Hi from sales")
    );
}

#[tokio::test]
async fn test_invalid_payload_is_a_validation_error() {
    let app = app();
    let mut payload = default_agent("x");
    payload.agent_config.agent_name = "  ".into();

    let (status, body) = call(&app, Method::POST, "/agent", Some(&payload), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), ErrorKind::Validation);
    let envelope: ApiResponse<Value> = serde_json::from_value(body).unwrap();
    assert!(envelope
        .error_body()
        .unwrap()
        .issues
        .iter()
        .any(|i| i.field == "agent_config.agent_name"));

    // Malformed JSON is reported the same way.
    let (status, body) = call(&app, Method::POST, "/agent", Some(&json!({"agent_config": 5})), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), ErrorKind::Validation);
}

#[tokio::test]
async fn test_draft_patch_and_save() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/drafts",
        Some(&json!({"agent_name": "Receptionist"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let draft_id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"]["cost"]["total"].as_f64().unwrap() > 0.0);

    let patch = SectionPatch::Analytics(AnalyticsPatch {
        summarization: Some("Summarize the call".into()),
        extraction: None,
        webhook_url: None,
    });
    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/drafts/{}", draft_id),
        Some(&patch),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dirty"], json!(["analytics"]));

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/drafts/{}/sections/analytics", draft_id),
        NO_BODY,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let section: SectionPatch = data(body);
    assert_eq!(section, patch);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/drafts/{}/save", draft_id),
        NO_BODY,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dirty"], json!([]));
    let agent_id = body["data"]["agent_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["base_version"], json!(1));

    let (_, body) = call(&app, Method::GET, &format!("/agent/{}", agent_id), NO_BODY, None).await;
    let agent: AgentRecord = data(body);
    assert_eq!(agent.agent_config.tasks.len(), 2);
    assert_eq!(agent.name(), "Receptionist");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/drafts/{}/sections/bogus", draft_id),
        NO_BODY,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), ErrorKind::NotFound);

    let (status, _) = call(&app, Method::DELETE, &format!("/drafts/{}", draft_id), NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, &format!("/drafts/{}", draft_id), NO_BODY, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stale_draft_save_conflicts() {
    let app = app();
    let (_, body) = call(&app, Method::POST, "/agent", Some(&default_agent("Billing")), None).await;
    let agent: AgentRecord = data(body);

    let open = json!({"agent_id": agent.id});
    let (_, first) = call(&app, Method::POST, "/drafts", Some(&open), None).await;
    let (_, second) = call(&app, Method::POST, "/drafts", Some(&open), None).await;
    let first = first["data"]["id"].as_str().unwrap().to_string();
    let second = second["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = call(&app, Method::POST, &format!("/drafts/{}/save", first), NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::POST, &format!("/drafts/{}/save", second), NO_BODY, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_auth_required_when_enabled() {
    let mut settings = Settings::default();
    settings.server.auth.enabled = true;
    let app = app_with(settings);

    let (status, body) = call(&app, Method::GET, "/agent/all", NO_BODY, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), ErrorKind::Auth);

    let (status, _) = call(&app, Method::GET, "/agent/all", NO_BODY, Some("made-up")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Health and signup are public.
    let (status, _) = call(&app, Method::GET, "/health", NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let signup = json!({"email": "Ops@Example.com", "password": "correct horse", "name": "Ops"});
    let (status, body) = call(&app, Method::POST, "/user/signup", Some(&signup), None).await;
    assert_eq!(status, StatusCode::OK);
    let session: AuthSession = data(body);
    assert_eq!(session.user.email, "ops@example.com");

    let token = session.access_token.as_str();
    let (status, body) = call(&app, Method::GET, "/user/me", NO_BODY, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!("ops@example.com"));

    // API keys authenticate but carry no user.
    let (_, body) = call(&app, Method::POST, "/api-keys", Some(&json!({"name": "ci"})), Some(token)).await;
    let secret = body["data"]["secret"].as_str().unwrap().to_string();
    let (status, _) = call(&app, Method::GET, "/agent/all", NO_BODY, Some(secret.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::GET, "/user/me", NO_BODY, Some(secret.as_str())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), ErrorKind::Auth);
    let (status, _) = call(&app, Method::POST, "/user/logout", NO_BODY, Some(secret.as_str())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging out ends the session.
    let (status, body) = call(&app, Method::POST, "/user/logout", NO_BODY, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(session.user.id));
    let (status, _) = call(&app, Method::GET, "/user/me", NO_BODY, Some(token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_providers_reflect_credentials() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/providers?category=synthesizer", NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let providers = body["data"].as_array().unwrap();
    assert!(!providers.is_empty());
    assert!(providers.iter().all(|p| p["category"] == json!("synthesizer")));

    let connect = json!({"provider_name": "elevenlabs", "provider_value": "sk-test-abcd1234"});
    let (status, body) = call(&app, Method::POST, "/providers/credentials", Some(&connect), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["masked_value"].as_str().unwrap().ends_with("1234"));

    let (_, body) = call(&app, Method::GET, "/providers?category=synthesizer", NO_BODY, None).await;
    let elevenlabs = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"].as_str().is_some_and(|n| n.eq_ignore_ascii_case("elevenlabs")))
        .cloned()
        .unwrap();
    assert_eq!(elevenlabs["connected"], json!(true));

    let (status, body) = call(&app, Method::GET, "/providers?category=nonsense", NO_BODY, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), ErrorKind::Validation);

    let (status, body) = call(&app, Method::GET, "/voices?provider=openai", NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|v| v["provider"] == json!("openai")));
}

#[tokio::test]
async fn test_phone_numbers_follow_agents() {
    let app = app();
    let (_, body) = call(&app, Method::POST, "/agent", Some(&default_agent("Inbound")), None).await;
    let agent: AgentRecord = data(body);

    let number = json!({"phone_number": "+14155550123", "telephony_provider": "twilio", "agent_id": agent.id});
    let (status, _) = call(&app, Method::POST, "/phone-numbers", Some(&number), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::POST, "/phone-numbers", Some(&number), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), ErrorKind::Conflict);

    let (status, _) = call(&app, Method::DELETE, &format!("/agent/{}", agent.id), NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, Method::GET, "/phone-numbers/all", NO_BODY, None).await;
    assert_eq!(body["data"][0]["phone_number"], json!("+14155550123"));
    assert!(body["data"][0].get("agent_id").is_none());
}

#[tokio::test]
async fn test_executions_are_recorded_and_listed() {
    let app = app();
    let (_, body) = call(&app, Method::POST, "/agent", Some(&default_agent("Collections")), None).await;
    let agent: AgentRecord = data(body);
    let (_, body) = call(&app, Method::POST, &format!("/agent/{}/cost", agent.id), NO_BODY, None).await;
    let per_minute: CostBreakdown = data(body);

    for (status, seconds) in [("completed", 120.0), ("failed", 5.0), ("completed", 30.0)] {
        let call_ended = json!({
            "agent_id": agent.id,
            "status": status,
            "conversation_time": seconds,
            "transcript": format!("caller asked about invoice ({})", status),
        });
        let (code, _) = call(&app, Method::POST, "/execution", Some(&call_ended), None).await;
        assert_eq!(code, StatusCode::OK);
    }

    let uri = format!("/execution/all?agent_id={}", agent.id);
    let (status, body) = call(&app, Method::GET, &uri, NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let page: Page<Execution> = data(body);
    assert_eq!(page.total, 3);

    let uri = format!("/execution/all?agent_id={}&status=completed", agent.id);
    let (_, body) = call(&app, Method::GET, &uri, NO_BODY, None).await;
    let completed: Page<Execution> = data(body);
    assert_eq!(completed.total, 2);
    assert!(completed.items.iter().all(|e| e.status == "completed"));

    let uri = format!("/execution/all?agent_id={}&page=2&page_size=2", agent.id);
    let (_, body) = call(&app, Method::GET, &uri, NO_BODY, None).await;
    let second: Page<Execution> = data(body);
    assert_eq!(second.total, 3);
    assert_eq!(second.items.len(), 1);

    let uri = format!("/execution/all?agent_id={}", Uuid::new_v4());
    let (_, body) = call(&app, Method::GET, &uri, NO_BODY, None).await;
    let none: Page<Execution> = data(body);
    assert_eq!(none.total, 0);

    let two_minutes = completed
        .items
        .iter()
        .find(|e| e.conversation_time == 120.0)
        .unwrap()
        .clone();
    let (status, body) = call(&app, Method::GET, &format!("/execution/{}", two_minutes.id), NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Execution = data(body);
    assert_eq!(fetched.agent_id, agent.id);
    assert!((fetched.total_cost - per_minute.total * 2.0).abs() < 1e-9);

    // Unknown agent, bad duration
    let orphan = json!({"agent_id": Uuid::new_v4(), "status": "completed"});
    let (status, _) = call(&app, Method::POST, "/execution", Some(&orphan), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let negative = json!({"agent_id": agent.id, "status": "completed", "conversation_time": -1.0});
    let (status, body) = call(&app, Method::POST, "/execution", Some(&negative), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), ErrorKind::Validation);
}

#[tokio::test]
async fn test_draft_body_is_optional_but_must_parse() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/drafts", NO_BODY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["agent_id"].is_null());
    assert!(body["data"]["payload"]["agent_config"]["agent_name"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/drafts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"agent_name\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error_code(&body), ErrorKind::Validation);

    let missing = json!({"agent_id": Uuid::new_v4()});
    let (status, _) = call(&app, Method::POST, "/drafts", Some(&missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
