use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::json::{bool_field, extract_object, string_field, string_list};
use super::*;
use crate::test_support::spawn_fake_provider;

type Seen = Arc<Mutex<Vec<Value>>>;

/// Fails any request for `broken_model`, answers everything else.
fn provider_failing_model(broken_model: &'static str, seen: Seen) -> Router {
    Router::new()
        .route(
            "/chat/completions",
            post(
                move |State(seen): State<Seen>, Json(body): Json<Value>| async move {
                    seen.lock().push(body.clone());
                    if body["model"] == broken_model {
                        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
                        })),
                    )
                },
            ),
        )
        .with_state(seen)
}

#[test]
fn test_extract_object_variants() {
    assert!(extract_object(r#"{"matches": []}"#).is_some());
    assert!(extract_object("```json\n{\"matches\": []}\n```").is_some());
    assert!(extract_object("Here you go: {\"matches\": []} Hope this helps").is_some());
    assert!(extract_object("not json at all").is_none());
    assert!(extract_object("[1, 2, 3]").is_none());
    assert!(extract_object("} {").is_none());
}

#[test]
fn test_field_helpers() {
    let obj = extract_object(
        r#"{"a": "  text ", "b": "", "flag": "yes", "flags": ["x", "", " y "], "one": "z"}"#,
    )
    .unwrap();
    assert_eq!(string_field(&obj, &["b", "a"]).as_deref(), Some("text"));
    assert_eq!(string_field(&obj, &["missing"]), None);
    assert_eq!(bool_field(&obj, &["flag"]), Some(true));
    assert_eq!(string_list(obj.get("flags")), vec!["x", "y"]);
    assert_eq!(string_list(obj.get("one")), vec!["z"]);
    assert!(string_list(obj.get("missing")).is_empty());
}

#[test]
fn test_models_for_skips_duplicate_fallback() {
    let config = ChatConfig::default().with_models("gpt-4o-mini", Some("gpt-4o-mini".to_string()));
    assert_eq!(config.models_for(ModelPurpose::Text), vec!["gpt-4o-mini"]);

    let config = ChatConfig::default();
    assert_eq!(
        config.models_for(ModelPurpose::Vision),
        vec!["gpt-4o", "gpt-4o-mini"]
    );
}

#[test]
fn test_vision_message_serializes_as_parts() {
    let message = ChatMessage::user_with_image("Is this original?", "https://cdn.example/p.jpg");
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["role"], "user");
    assert_eq!(value["content"][0]["type"], "text");
    assert_eq!(value["content"][1]["type"], "image_url");
    assert_eq!(value["content"][1]["image_url"]["url"], "https://cdn.example/p.jpg");
    assert_eq!(message.content.image_urls(), vec!["https://cdn.example/p.jpg"]);
}

#[tokio::test]
async fn test_disabled_client_short_circuits() {
    let client = OpenAiChatClient::new(ChatConfig::default()).unwrap();
    assert!(!client.is_enabled());
    let err = client
        .complete(ChatRequest::json(vec![ChatMessage::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::ProviderUnavailable));
}

#[tokio::test]
async fn test_falls_back_once_and_sends_json_mode() {
    let seen: Seen = Arc::default();
    let base = spawn_fake_provider(provider_failing_model("primary", seen.clone())).await;
    let client = OpenAiChatClient::new(
        ChatConfig::default()
            .with_api_key("sk-test")
            .with_base_url(base)
            .with_models("primary", Some("backup".to_string())),
    )
    .unwrap();

    let reply = client
        .complete(ChatRequest::json(vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("hi"),
        ]))
        .await
        .expect("fallback model answers");

    assert_eq!(reply, "{\"ok\": true}");
    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["model"], "primary");
    assert_eq!(seen[1]["model"], "backup");
    assert_eq!(seen[1]["response_format"]["type"], "json_object");
    assert_eq!(seen[1]["messages"][0]["role"], "system");
}

#[tokio::test]
async fn test_gives_up_after_fallback() {
    let seen: Seen = Arc::default();
    let base = spawn_fake_provider(provider_failing_model("primary", seen.clone())).await;
    let client = OpenAiChatClient::new(
        ChatConfig::default()
            .with_api_key("sk-test")
            .with_base_url(base)
            .with_models("primary", None),
    )
    .unwrap();

    let err = client
        .complete(ChatRequest::json(vec![ChatMessage::user("hi")]))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Http { status: 500, .. }));
    assert_eq!(seen.lock().len(), 1);
}
