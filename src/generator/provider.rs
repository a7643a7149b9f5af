//! External LLM provider clients.
//!
//! All three providers speak an OpenAI-style chat-completions wire format
//! (Gemini through its OpenAI-compatibility surface), so one request codec
//! covers them.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::ApiError;
use crate::protocols::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Doubao,
    DeepSeek,
    Gemini,
}

impl ProviderKind {
    /// The model id each provider is published under in `/v1/models`.
    pub fn model_id(&self) -> &'static str {
        match self {
            ProviderKind::Doubao => "doubao-seed-1-6-250615",
            ProviderKind::DeepSeek => "deepseek-chat",
            ProviderKind::Gemini => "gemini-2.5-flash",
        }
    }

    pub fn owned_by(&self) -> &'static str {
        match self {
            ProviderKind::Doubao => "doubao",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Gemini => "google",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            ProviderKind::Doubao => "https://ark.cn-beijing.volces.com/api/v3",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    pub fn from_model(model: &str) -> Option<Self> {
        match model {
            "doubao-seed-1-6-250615" => Some(ProviderKind::Doubao),
            "deepseek-chat" => Some(ProviderKind::DeepSeek),
            "gemini-2.5-flash" => Some(ProviderKind::Gemini),
            _ => None,
        }
    }

    pub fn is_configured(&self, settings: &Settings) -> bool {
        match self {
            ProviderKind::Doubao => settings.has_doubao(),
            ProviderKind::DeepSeek => settings.has_deepseek(),
            ProviderKind::Gemini => settings.has_gemini(),
        }
    }

    fn api_key<'a>(&self, settings: &'a Settings) -> Option<&'a str> {
        match self {
            ProviderKind::Doubao => settings.doubao_api_key.as_deref(),
            ProviderKind::DeepSeek => settings.deepseek_api_key.as_deref(),
            ProviderKind::Gemini => settings.gemini_api_key.as_deref(),
        }
    }
}

pub(crate) fn build_payload(
    model: &str,
    messages: &[ChatMessage],
    temperature: f32,
    max_tokens: Option<u32>,
) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
    });
    if let Some(max_tokens) = max_tokens {
        payload["max_tokens"] = json!(max_tokens);
    }
    payload
}

/// Call the provider's chat-completions endpoint and extract the first
/// choice's text. Timeouts come from the shared client; any transport
/// failure, non-2xx status, or malformed payload surfaces as a provider
/// error.
pub async fn generate(
    client: &Client,
    kind: ProviderKind,
    settings: &Settings,
    model: &str,
    messages: &[ChatMessage],
    temperature: f32,
    max_tokens: Option<u32>,
) -> Result<String, ApiError> {
    let api_key = kind
        .api_key(settings)
        .ok_or_else(|| ApiError::Provider(format!("{kind:?} credential not configured")))?;

    let url = format!("{}/chat/completions", kind.base_url());
    let payload = build_payload(model, messages, temperature, max_tokens);

    info!("calling {kind:?} chat completions with model {model}");
    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&payload)
        .send()
        .await
        .map_err(|e| ApiError::Provider(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("{kind:?} returned {status}: {body}");
        return Err(ApiError::Provider(format!(
            "{kind:?} returned status {status}"
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| ApiError::Provider(format!("invalid response body: {e}")))?;

    extract_content(&body)
        .ok_or_else(|| ApiError::Provider(format!("{kind:?} response missing choices")))
}

fn extract_content(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}
