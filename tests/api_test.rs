//! HTTP-level tests exercising the full route table with a debug-mode
//! token and zero stream pacing.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use tutor_gateway::config::Settings;
use tutor_gateway::server::routes;
use tutor_gateway::state::AppState;

fn test_settings() -> Settings {
    Settings {
        debug: true,
        stream_delay_ms: 0,
        ..Settings::default()
    }
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(
                    AppState::new(test_settings()).unwrap(),
                ))
                .configure(routes),
        )
        .await
    };
}

fn authed(req: test::TestRequest) -> test::TestRequest {
    req.insert_header(("Authorization", "Bearer dev-token"))
}

#[actix_web::test]
async fn banner_and_health_need_no_auth() {
    let app = test_app!();

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "running");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["external_apis"]["deepseek_configured"], false);
}

#[actix_web::test]
async fn models_require_auth() {
    let app = test_app!();

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/v1/models").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "authentication_error");

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri("/v1/models")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["gpt-4-tutor", "local-tutor"]);
}

#[actix_web::test]
async fn grammar_completion_with_usage() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/v1/chat/completions").set_json(json!({
            "model": "local-tutor",
            "messages": [{"role": "user", "content": "Can you help with grammar mistakes?"}],
            "stream": false,
        })))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["object"], "chat.completion");
    assert!(body["id"].as_str().unwrap().starts_with("chatcmpl-"));
    let choice = &body["choices"][0];
    assert_eq!(choice["finish_reason"], "stop");
    assert_eq!(choice["message"]["role"], "assistant");
    assert!(choice["message"]["content"]
        .as_str()
        .unwrap()
        .contains("Grammar practice"));

    let usage = &body["usage"];
    assert_eq!(
        usage["total_tokens"].as_u64().unwrap(),
        usage["prompt_tokens"].as_u64().unwrap() + usage["completion_tokens"].as_u64().unwrap()
    );
    assert!(usage["prompt_tokens"].as_u64().unwrap() > 0);
}

#[actix_web::test]
async fn streaming_matches_non_streaming() {
    let app = test_app!();
    let messages = json!([{"role": "user", "content": "Can you help with grammar mistakes?"}]);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/v1/chat/completions").set_json(json!({
            "model": "local-tutor",
            "messages": messages,
            "temperature": 0.2,
        })))
        .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let full_text = body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/v1/chat/completions").set_json(json!({
            "model": "local-tutor",
            "messages": messages,
            "temperature": 0.2,
            "stream": true,
        })))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let raw = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    let frames: Vec<&str> = raw
        .split("\n\n")
        .filter(|f| !f.is_empty())
        .map(|f| f.strip_prefix("data: ").unwrap())
        .collect();

    assert_eq!(*frames.last().unwrap(), "[DONE]");
    let chunks: Vec<Value> = frames[..frames.len() - 1]
        .iter()
        .map(|f| serde_json::from_str(f).unwrap())
        .collect();

    let mut assembled = String::new();
    let mut stop_indices = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk["object"], "chat.completion.chunk");
        assert_eq!(chunk["id"], chunks[0]["id"]);
        if let Some(content) = chunk["choices"][0]["delta"]["content"].as_str() {
            assembled.push_str(content);
        }
        if !chunk["choices"][0]["finish_reason"].is_null() {
            stop_indices.push(i);
        }
    }

    // Word chunks each carry a trailing space.
    let expected: String = full_text
        .split_whitespace()
        .map(|w| format!("{w} "))
        .collect();
    assert_eq!(assembled, expected);
    assert_eq!(stop_indices, vec![chunks.len() - 1]);
}

#[actix_web::test]
async fn empty_messages_are_a_bad_request() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        authed(
            test::TestRequest::post()
                .uri("/v1/chat/completions")
                .set_json(json!({"model": "local-tutor", "messages": []})),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[actix_web::test]
async fn unconfigured_provider_model_degrades_to_local() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/v1/chat/completions").set_json(json!({
            "model": "deepseek-chat",
            "messages": [{"role": "user", "content": "let's talk about my vacation"}],
            "temperature": 0.0,
        })))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["model"], "deepseek-chat");
    // No credential means no outbound call; the local travel template answers.
    assert!(body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap()
        .contains("Travel stories"));
}

#[actix_web::test]
async fn session_lifecycle_over_http() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        authed(
            test::TestRequest::post()
                .uri("/v1/language/sessions")
                .set_json(json!({"level": "advanced", "topic": "travel"})),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session: Value = test::read_body_json(resp).await;
    let session_id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["level"], "advanced");
    assert_eq!(session["message_count"], 0);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri("/v1/language/sessions")).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["sessions"][0]["id"], session_id.as_str());

    let resp = test::call_service(
        &app,
        authed(
            test::TestRequest::post()
                .uri(&format!("/v1/language/sessions/{session_id}/messages"))
                .set_json(json!({"content": "I visited Portugal last spring"})),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message_count"], 1);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri(&format!(
            "/v1/language/sessions/{session_id}/history"
        )))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(
        body["messages"][0]["content"],
        "I visited Portugal last spring"
    );
}

#[actix_web::test]
async fn unknown_session_is_not_found() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri("/v1/language/sessions/nope/history")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[actix_web::test]
async fn conversation_starter_honors_query() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri("/v1/conversation/starter?context=grammar&level=beginner"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["starter"].as_str().unwrap().contains("grammar"));
    assert_eq!(body["level"], "beginner");
}
