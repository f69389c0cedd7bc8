//! Integration tests for the Ollama engine using wiremock.
#![cfg(feature = "ollama")]

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huginn::{
    ChatSession, ERROR_TEMPLATE, GenerateOptions, Huginn, HuginnError, InferenceEngine,
    LanguageModel, OllamaEngine, PatternTable, ReplySource,
};

async fn mount_show(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"details": {}})))
        .mount(server)
        .await;
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3",
        "message": {"role": "assistant", "content": content},
        "done": true
    })
}

#[tokio::test]
async fn load_checks_the_model_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .and(body_partial_json(json!({"model": "llama3"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"details": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let engine = OllamaEngine::with_base_url(server.uri());
    let model = engine.load("llama3").await.unwrap();
    assert_eq!(model.id(), "llama3");
}

#[tokio::test]
async fn unknown_model_is_reported() {
    let server = MockServer::start().await;
    mount_show(&server, 404).await;

    let engine = OllamaEngine::with_base_url(server.uri());
    let err = engine.load("nope").await.err().unwrap();
    assert!(matches!(err, HuginnError::ModelNotFound(ref m) if m == "nope"));
}

#[tokio::test]
async fn unreachable_server_is_a_transient_http_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let engine = OllamaEngine::with_base_url("http://127.0.0.1:9");
    let err = engine.load("llama3").await.err().unwrap();
    assert!(matches!(err, HuginnError::Http(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn one_shot_generate_sends_options() {
    let server = MockServer::start().await;
    mount_show(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3",
            "prompt": "test",
            "stream": false,
            "options": {"num_predict": 1, "top_k": 1, "repeat_penalty": 1.0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "response": "ok",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = OllamaEngine::with_base_url(server.uri());
    let model = engine.load("llama3").await.unwrap();
    let text = model
        .generate("test", &GenerateOptions::deterministic(1))
        .await
        .unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn session_sends_its_history() {
    let server = MockServer::start().await;
    mount_show(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "one"},
                {"role": "assistant", "content": "first"},
                {"role": "user", "content": "two"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("second")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "one"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("first")))
        .mount(&server)
        .await;

    let engine = OllamaEngine::with_base_url(server.uri());
    let model = engine.load("llama3").await.unwrap();
    let mut session = model.session();
    let options = GenerateOptions::default();

    assert_eq!(session.generate("one", &options).await.unwrap(), "first");
    assert_eq!(session.generate("two", &options).await.unwrap(), "second");
}

#[tokio::test]
async fn rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    mount_show(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let engine = OllamaEngine::with_base_url(server.uri());
    let model = engine.load("llama3").await.unwrap();
    let err = model
        .session()
        .generate("hi", &GenerateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HuginnError::RateLimited {
            retry_after: Some(d)
        } if d.as_secs() == 7
    ));
}

#[tokio::test]
async fn pipeline_end_to_end() {
    let server = MockServer::start().await;
    mount_show(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3",
            "messages": [{"role": "user", "content": "What is recursion?"}],
            "options": {"num_predict": 20, "top_k": 1}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply("  A function that calls itself.  ")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = Huginn::builder()
        .ollama(server.uri())
        .patterns(PatternTable::empty())
        .build()
        .unwrap();

    assert!(pipeline.ensure_ready().await);

    let first = pipeline.respond("What is recursion?").await;
    assert_eq!(first.text, "A function that calls itself.");
    assert_eq!(first.source, ReplySource::Model);

    let second = pipeline.respond("what is recursion?").await;
    assert_eq!(second.source, ReplySource::Cache);
}

#[tokio::test]
async fn pipeline_masks_server_errors() {
    let server = MockServer::start().await;
    mount_show(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let pipeline = Huginn::builder()
        .ollama(server.uri())
        .patterns(PatternTable::empty())
        .build()
        .unwrap();

    assert_eq!(pipeline.handle("asdkfjasdlkfj").await, ERROR_TEMPLATE);
}
