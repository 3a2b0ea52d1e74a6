use std::time::Duration;

use lore::error::GatewayError;
use lore::ollama::OllamaClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OllamaClient {
    OllamaClient::with_timeout(&server.uri(), Duration::from_secs(5))
}

#[tokio::test]
async fn generate_sends_model_prompt_and_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama",
            "prompt": "say hi",
            "stream": false,
            "options": { "temperature": 0.5 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  hi there \n" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let reply = tokio::task::spawn_blocking(move || client.generate("llama", "say hi", 0.5))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reply, "hi there");
}

#[tokio::test]
async fn embed_returns_the_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(json!({ "model": "embedder", "prompt": "text" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [0.25, -0.5, 1.0] })))
        .mount(&server)
        .await;

    let client = client(&server);
    let vector = tokio::task::spawn_blocking(move || client.embed("embedder", "text"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(vector, vec![0.25, -0.5, 1.0]);
}

#[tokio::test]
async fn empty_embedding_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [] })))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = tokio::task::spawn_blocking(move || client.embed("embedder", "text"))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, GatewayError::Decode { .. }));
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = tokio::task::spawn_blocking(move || client.generate("llama", "p", 0.1))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, GatewayError::Status { status: 500, .. }));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = tokio::task::spawn_blocking(move || client.generate("llama", "p", 0.1))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, GatewayError::Decode { .. }));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::with_timeout(&server.uri(), Duration::from_millis(200));
    let err = tokio::task::spawn_blocking(move || client.generate("llama", "p", 0.1))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, GatewayError::Timeout { .. }));
}

#[tokio::test]
async fn list_models_reads_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "granite-embedding:30m", "size": 62000000 },
                { "name": "llama3:8b" }
            ]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let models = tokio::task::spawn_blocking(move || client.list_models())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "granite-embedding:30m");
    assert_eq!(models[0].size, Some(62000000));
    assert_eq!(models[1].size, None);
}
