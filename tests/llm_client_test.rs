//! Wire-level tests for the chat-completions client against a local stub provider

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use clinical_panel::agent::llm::{ChatBackend, ChatMessage, CompletionRequest, LlmClient, ProviderConfig};
use clinical_panel::config::{LlmSettings, Provider};
use clinical_panel::orchestrator::prompts::DEFAULT_SCENARIO;
use clinical_panel::orchestrator::{run_consultation, ConsultationRequest};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// One request as seen by the stub provider
#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone)]
struct StubProvider {
    status: StatusCode,
    reply: Value,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

async fn chat_completions(
    State(stub): State<StubProvider>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.requests.lock().unwrap().push(Recorded {
        path: uri.path().to_string(),
        headers,
        body,
    });
    (stub.status, Json(stub.reply.clone()))
}

/// Serve the stub on an ephemeral port; returns its `/v1` base URL
async fn spawn_provider(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let stub = StubProvider {
        status,
        reply,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), requests)
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

fn custom_settings(base_url: &str) -> LlmSettings {
    LlmSettings {
        provider: Provider::Custom,
        base_url: Some(base_url.to_string()),
        ..LlmSettings::default()
    }
}

#[tokio::test]
async fn test_complete_posts_to_chat_completions_with_bearer() {
    let (base_url, requests) = spawn_provider(StatusCode::OK, completion("Consider Lyme arthritis.")).await;
    let settings = custom_settings(&base_url);
    let provider = ProviderConfig::from_settings(&settings, "sk-local".to_string()).unwrap();
    let client = LlmClient::with_http_client(reqwest::Client::new(), provider);

    let request = CompletionRequest::new(
        &settings,
        vec![ChatMessage::system("You are Dr. James."), ChatMessage::user("case")],
    );
    let reply = client.complete(request).await.unwrap();
    assert_eq!(reply, "Consider Lyme arthritis.");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let seen = &requests[0];
    assert_eq!(seen.path, "/v1/chat/completions");
    assert_eq!(seen.headers["authorization"], "Bearer sk-local");
    assert_eq!(seen.body["model"], "gemini-1.5-flash-latest");
    assert_eq!(seen.body["messages"][0]["role"], "system");
    assert_eq!(seen.body["messages"][1]["content"], "case");
    assert!(seen.body.get("max_tokens").is_none());
}

#[tokio::test]
async fn test_openrouter_headers_sent() {
    let (base_url, requests) = spawn_provider(StatusCode::OK, completion("ok")).await;
    let settings = LlmSettings {
        provider: Provider::OpenRouter,
        base_url: Some(base_url),
        ..LlmSettings::default()
    };
    let provider = ProviderConfig::from_settings(&settings, "or-key".to_string()).unwrap();
    let client = LlmClient::with_http_client(reqwest::Client::new(), provider);

    client
        .complete(CompletionRequest::new(&settings, vec![ChatMessage::user("hi")]))
        .await
        .unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].headers["x-title"], "Clinical Panel");
    assert!(requests[0].headers.contains_key("http-referer"));
    assert_eq!(requests[0].headers["authorization"], "Bearer or-key");
}

#[tokio::test]
async fn test_error_status_mapped_to_api_error() {
    let (base_url, _) = spawn_provider(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"code": 401, "message": "API key not valid"}}),
    )
    .await;
    let settings = custom_settings(&base_url);
    let provider = ProviderConfig::from_settings(&settings, "bad".to_string()).unwrap();
    let client = LlmClient::with_http_client(reqwest::Client::new(), provider);

    let err = client
        .complete(CompletionRequest::new(&settings, vec![ChatMessage::user("hi")]))
        .await
        .unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.starts_with("LLM API error (401 Unauthorized): "));
    assert!(rendered.contains("API key not valid"));
}

#[tokio::test]
async fn test_unauthorized_provider_surfaces_in_diagnostic() {
    let (base_url, requests) = spawn_provider(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"code": 401, "message": "API key not valid"}}),
    )
    .await;
    let settings = custom_settings(&base_url);
    let request = ConsultationRequest::with_defaults("bad-key", 5, DEFAULT_SCENARIO);

    let outcome = run_consultation(&settings, &reqwest::Client::new(), &request).await;

    assert!(outcome.transcript.is_empty());
    assert!(outcome.final_plan.starts_with("An error occurred: "));
    assert!(outcome.final_plan.contains("401 Unauthorized"));
    assert!(outcome.final_plan.contains("API key not valid"));
    assert!(outcome.final_plan.contains("Invalid or expired provider API key."));
    // No retry: the first failed call ends the run
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_consultation_over_http_extracts_plan() {
    // Every completion names the moderator and carries the marker, so the
    // moderator is selected and its reply holds the plan
    let (base_url, requests) = spawn_provider(
        StatusCode::OK,
        completion("Masoud\n--- FINAL PLAN ---\n## Diagnosis\n- Lyme arthritis"),
    )
    .await;
    let settings = custom_settings(&base_url);
    let request = ConsultationRequest::with_defaults("sk-local", 2, DEFAULT_SCENARIO);

    let outcome = run_consultation(&settings, &reqwest::Client::new(), &request).await;

    assert_eq!(outcome.transcript.len(), 2);
    assert_eq!(outcome.transcript[1].label, "Masoud");
    assert_eq!(outcome.final_plan, "Masoud\n\n## Diagnosis\n- Lyme arthritis");
    assert!(outcome.final_plan_html.contains("<h2>Diagnosis</h2>"));

    // One selection and one reply, both authenticated with the request's key
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.headers["authorization"] == "Bearer sk-local"));
}
