//! HTTP surface: actix handlers, route table, server startup.

use actix_web::{error::JsonPayloadError, get, post, web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::config::Settings;
use crate::error::ApiError;
use crate::generator::local;
use crate::protocols::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ModelList, Role, Usage,
};
use crate::router::route;
use crate::session::{SessionMessage, SessionOptions};
use crate::state::AppState;
use crate::streaming::sse_response;

#[get("/")]
async fn service_banner() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "name": "AI English Tutor Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "features": [
            "openai_compatible_api",
            "streaming_responses",
            "model_routing",
            "learning_sessions",
        ],
    }))
}

#[get("/health")]
async fn health(state: web::Data<AppState>) -> HttpResponse {
    let settings = &state.settings;
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "services": {
            "api": "running",
            "local_generator": "available",
            "session_store": "available",
        },
        "config": {
            "default_model": settings.default_model,
            "temperature": settings.temperature,
            "max_tokens": settings.max_tokens,
        },
        "external_apis": {
            "doubao_configured": settings.has_doubao(),
            "deepseek_configured": settings.has_deepseek(),
            "gemini_configured": settings.has_gemini(),
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[get("/v1/models")]
async fn list_models(state: web::Data<AppState>, _user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(ModelList {
        object: "list".to_string(),
        data: state.available_models(),
    })
}

fn validate_request(request: &ChatCompletionRequest) -> Result<(), ApiError> {
    if request.messages.is_empty() {
        return Err(ApiError::Validation(
            "messages must not be empty".to_string(),
        ));
    }
    if let Some(t) = request.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(ApiError::Validation(format!(
                "temperature must be between 0 and 2, got {t}"
            )));
        }
    }
    if request.max_tokens == Some(0) {
        return Err(ApiError::Validation(
            "max_tokens must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[post("/v1/chat/completions")]
async fn chat_completions(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    request: web::Json<ChatCompletionRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    validate_request(&request)?;

    let temperature = request.temperature.unwrap_or(state.settings.temperature);
    let backend = route(&request.model, &state.settings);
    info!(
        "completion request from {} model={} backend={:?} stream={}",
        user.user_id, request.model, backend, request.stream
    );

    if request.stream {
        return Ok(sse_response(
            state.get_ref().clone(),
            backend,
            request,
            temperature,
        ));
    }

    let content = state
        .generate_text(
            backend,
            &request.model,
            &request.messages,
            temperature,
            request.max_tokens,
        )
        .await?;

    let prompt_tokens = word_count(&local::format_transcript(&request.messages));
    let completion_tokens = word_count(&content);
    let response = ChatCompletionResponse {
        id: format!("chatcmpl-{}", Uuid::new_v4()),
        object: "chat.completion".to_string(),
        created: Utc::now().timestamp(),
        model: request.model,
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage::assistant(content),
            finish_reason: Some("stop".to_string()),
        }],
        usage: Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    language: Option<String>,
    level: Option<String>,
    topic: Option<String>,
    #[serde(default)]
    goals: Vec<String>,
}

#[post("/v1/language/sessions")]
async fn create_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateSessionRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let session = state
        .sessions
        .create_session(
            &user.user_id,
            SessionOptions {
                language: body.language,
                level: body.level,
                topic: body.topic,
                goals: body.goals,
            },
        )
        .await;
    info!("created session {} for {}", session.id, user.user_id);
    HttpResponse::Created().json(session)
}

#[get("/v1/language/sessions")]
async fn list_sessions(state: web::Data<AppState>, user: AuthenticatedUser) -> HttpResponse {
    let sessions = state.sessions.sessions_for_user(&user.user_id).await;
    let total = sessions.len();
    HttpResponse::Ok().json(json!({
        "sessions": sessions,
        "total": total,
    }))
}

#[get("/v1/language/sessions/{id}/history")]
async fn session_history(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let history = state.sessions.history(&session_id, &user.user_id).await?;
    let total = history.len();
    Ok(HttpResponse::Ok().json(json!({
        "session_id": session_id,
        "messages": history,
        "total": total,
    })))
}

#[derive(Debug, Deserialize)]
struct AppendMessageRequest {
    role: Option<Role>,
    content: String,
}

#[post("/v1/language/sessions/{id}/messages")]
async fn append_session_message(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<AppendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let body = body.into_inner();
    if body.content.trim().is_empty() {
        return Err(ApiError::Validation(
            "message content must not be empty".to_string(),
        ));
    }
    let message = SessionMessage::new(body.role.unwrap_or(Role::User), body.content);
    let session = state
        .sessions
        .append_message(&session_id, &user.user_id, message)
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

#[derive(Debug, Deserialize)]
struct StarterQuery {
    #[serde(default = "default_context")]
    context: String,
    #[serde(default = "default_level")]
    level: String,
    topic: Option<String>,
}

fn default_context() -> String {
    "general".to_string()
}

fn default_level() -> String {
    "intermediate".to_string()
}

#[get("/v1/conversation/starter")]
async fn conversation_starter(
    _user: AuthenticatedUser,
    query: web::Query<StarterQuery>,
) -> HttpResponse {
    let starter = local::conversation_starter(&query.context, &query.level, query.topic.as_deref());
    HttpResponse::Ok().json(json!({
        "starter": starter,
        "context": query.context,
        "level": query.level,
    }))
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(err.to_string()).into()
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(service_banner)
        .service(health)
        .service(list_models)
        .service(chat_completions)
        .service(create_session)
        .service(list_sessions)
        .service(session_history)
        .service(append_session_message)
        .service(conversation_starter);
}

pub async fn startup(settings: Settings) -> anyhow::Result<()> {
    let host = settings.host.clone();
    let port = settings.port;
    let state = AppState::new(settings)?;

    info!("starting tutor gateway on {host}:{port}");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes)
    })
    .bind((host, port))?
    .run()
    .await?;
    Ok(())
}
